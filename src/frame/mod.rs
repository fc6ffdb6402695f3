//! The two-dimensional labeled table collaborator.
//!
//! A [`Frame`] is the per-slice representation of a cube and the target of
//! the cube↔table conversion. It carries a row index, a column index, a
//! declared dtype and a rank-2 [`Grid`]. Only the surface the cube engine
//! consumes is implemented: alignment, shifting, percent change, missing
//! fills, missing-aware logical combination and NaN-aware equality.

mod series;

pub use series::Series;

use ndarray::Array2;

use crate::axis::Axis;
use crate::block::Grid;
use crate::error::CubeError;
use crate::index::AxisIndex;
use crate::value::{DType, Scalar};

/// Direction for observation-carrying fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMethod {
    /// Propagate the last valid observation forward.
    Ffill,
    /// Use the next valid observation to fill backward.
    Bfill,
}

/// Two-dimensional labeled table.
#[derive(Debug, Clone)]
pub struct Frame {
    index: AxisIndex,
    columns: AxisIndex,
    dtype: DType,
    grid: Grid,
}

impl Frame {
    /// Build a frame from storage and axes.
    pub fn new(
        grid: Grid,
        index: AxisIndex,
        columns: AxisIndex,
        dtype: DType,
    ) -> Result<Self, CubeError> {
        let expected = (index.len(), columns.len());
        let got = grid.dim();
        if expected != got {
            return Err(CubeError::ValueShape { expected, got });
        }
        Ok(Self {
            index,
            columns,
            dtype,
            grid,
        })
    }

    /// Float frame from a dense array.
    pub fn from_array(
        values: Array2<f64>,
        index: AxisIndex,
        columns: AxisIndex,
    ) -> Result<Self, CubeError> {
        Self::new(Grid::Numeric(values), index, columns, DType::Float64)
    }

    /// Frame from scalars, inferring the minimal dtype unless one is forced.
    pub fn from_scalars(
        values: Array2<Scalar>,
        index: AxisIndex,
        columns: AxisIndex,
        dtype: Option<DType>,
    ) -> Result<Self, CubeError> {
        let dtype = dtype.unwrap_or_else(|| DType::infer(values.iter()));
        let dim = values.dim();
        let grid = Grid::build(dim, values.into_iter().collect(), dtype)?;
        Self::new(grid, index, columns, dtype)
    }

    /// All-missing frame of a missing-capable dtype.
    pub fn missing(index: AxisIndex, columns: AxisIndex, dtype: DType) -> Self {
        debug_assert!(dtype.supports_missing());
        let grid = Grid::missing((index.len(), columns.len()), dtype);
        Self {
            index,
            columns,
            dtype,
            grid,
        }
    }

    #[inline]
    pub fn index(&self) -> &AxisIndex {
        &self.index
    }

    #[inline]
    pub fn columns(&self) -> &AxisIndex {
        &self.columns
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        self.grid.dim()
    }

    /// Typed cell read by position.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Scalar {
        self.grid.get([row, col], self.dtype)
    }

    #[inline]
    pub fn is_missing(&self, row: usize, col: usize) -> bool {
        self.grid.is_missing([row, col])
    }

    /// Cell write by position; the value is cast to the frame dtype.
    pub fn set(&mut self, row: usize, col: usize, value: &Scalar) -> Result<(), CubeError> {
        self.grid.set([row, col], value, self.dtype)
    }

    /// The column carrying `label` as a series.
    ///
    /// Duplicated column labels are refused rather than silently resolved
    /// to one of the matches.
    pub fn column(&self, label: &crate::value::Label) -> Result<Series, CubeError> {
        let hits = self.columns.positions_of(label);
        match hits.len() {
            0 => Err(CubeError::LabelNotFound {
                label: label.to_string(),
                axis: Axis::Minor,
            }),
            1 => Ok(self.column_at(hits[0])),
            _ => Err(CubeError::DuplicateLabels { axis: Axis::Minor }),
        }
    }

    /// The column at `pos` as a series.
    pub fn column_at(&self, pos: usize) -> Series {
        let values: Vec<Scalar> = (0..self.index.len())
            .map(|row| self.get(row, pos))
            .collect();
        Series::new(self.index.clone(), values, self.dtype)
    }

    /// The row at `pos` as a series indexed by the columns.
    pub fn row_at(&self, pos: usize) -> Series {
        let values: Vec<Scalar> = (0..self.columns.len())
            .map(|col| self.get(pos, col))
            .collect();
        Series::new(self.columns.clone(), values, self.dtype)
    }

    fn admit_missing(grid: Grid, dtype: DType) -> (Grid, DType) {
        if dtype.supports_missing() || !grid.has_missing() {
            return (grid, dtype);
        }
        let promoted = dtype.promote_missing();
        if promoted.is_numeric() {
            (grid, promoted)
        } else {
            (grid.to_object(dtype), promoted)
        }
    }

    /// Align onto new axes; labels absent from the current axes become
    /// missing cells, promoting the dtype when it cannot hold them.
    pub fn reindex(
        &self,
        index: Option<&AxisIndex>,
        columns: Option<&AxisIndex>,
    ) -> Result<Frame, CubeError> {
        let mut grid = self.grid.clone();
        let mut dtype = self.dtype;
        let mut introduced = false;

        if let Some(target) = index {
            if target != &self.index {
                let indexer = self.index.indexer_for(target, Axis::Major)?;
                introduced |= indexer.iter().any(Option::is_none);
                grid = grid.take(ndarray::Axis(0), &indexer);
            }
        }
        if let Some(target) = columns {
            if target != &self.columns {
                let indexer = self.columns.indexer_for(target, Axis::Minor)?;
                introduced |= indexer.iter().any(Option::is_none);
                grid = grid.take(ndarray::Axis(1), &indexer);
            }
        }

        if introduced {
            let (g, d) = Self::admit_missing(grid, dtype);
            grid = g;
            dtype = d;
        }
        Frame::new(
            grid,
            index.cloned().unwrap_or_else(|| self.index.clone()),
            columns.cloned().unwrap_or_else(|| self.columns.clone()),
            dtype,
        )
    }

    /// Rows become columns and vice versa.
    pub fn transpose(&self) -> Frame {
        Frame {
            index: self.columns.clone(),
            columns: self.index.clone(),
            dtype: self.dtype,
            grid: self.grid.transpose(),
        }
    }

    /// Shift values along an axis (0 = down the rows, 1 = across the
    /// columns), vacated cells becoming missing.
    pub fn shift(&self, periods: isize, axis: usize) -> Frame {
        let grid = self.grid.shift(ndarray::Axis(axis), periods);
        let (grid, dtype) = Self::admit_missing(grid, self.dtype);
        Frame {
            index: self.index.clone(),
            columns: self.columns.clone(),
            dtype,
            grid,
        }
    }

    /// Fractional change between each cell and the one `periods` steps
    /// earlier along `axis`.
    pub fn pct_change(&self, periods: isize, axis: usize) -> Result<Frame, CubeError> {
        let shifted = self.shift(periods, axis);
        let grid = self
            .grid
            .combine_numeric(&shifted.grid, |cur, prev| (cur - prev) / prev)?;
        Frame::new(
            grid,
            self.index.clone(),
            self.columns.clone(),
            DType::Float64,
        )
    }

    /// Replace missing cells with `value`.
    pub fn fillna(&self, value: &Scalar) -> Result<Frame, CubeError> {
        let dtype = match value.natural_dtype() {
            Some(d) => self.dtype.promote(d),
            None => self.dtype,
        };
        let mut grid = if dtype.is_numeric() == self.dtype.is_numeric() {
            self.grid.clone()
        } else {
            self.grid.to_object(self.dtype)
        };
        grid.fill_missing(&value.cast(dtype)?);
        Frame::new(grid, self.index.clone(), self.columns.clone(), dtype)
    }

    /// Fill missing cells from neighboring observations down the rows.
    pub fn fillna_method(&self, method: FillMethod) -> Frame {
        let mut grid = self.grid.clone();
        grid.fill_forward(ndarray::Axis(0), method == FillMethod::Bfill);
        Frame {
            index: self.index.clone(),
            columns: self.columns.clone(),
            dtype: self.dtype,
            grid,
        }
    }

    fn kleene(
        &self,
        other: &Frame,
        combine: impl Fn(Option<bool>, Option<bool>) -> Option<bool>,
    ) -> Result<Frame, CubeError> {
        let index = self.index.union(other.index());
        let columns = self.columns.union(other.columns());
        let left = self.reindex(Some(&index), Some(&columns))?;
        let right = other.reindex(Some(&index), Some(&columns))?;

        let (rows, cols) = left.dim();
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let out = combine(left.get(row, col).truthy(), right.get(row, col).truthy());
                cells.push(match out {
                    Some(b) => Scalar::Bool(b),
                    None => Scalar::Null,
                });
            }
        }
        let grid = Grid::build((rows, cols), cells, DType::Object)?;
        Frame::new(grid, index, columns, DType::Object)
    }

    /// Missing-aware elementwise OR.
    ///
    /// A missing operand only resolves when the other side is truthy;
    /// otherwise the result stays missing.
    pub fn or_missing(&self, other: &Frame) -> Result<Frame, CubeError> {
        self.kleene(other, |a, b| match (a, b) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        })
    }

    /// Missing-aware elementwise AND.
    pub fn and_missing(&self, other: &Frame) -> Result<Frame, CubeError> {
        self.kleene(other, |a, b| match (a, b) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        })
    }

    /// Sum of non-missing cells along an axis (0 = per column, 1 = per
    /// row). A fully missing lane stays missing.
    pub fn sum(&self, axis: usize) -> Result<Series, CubeError> {
        if !self.dtype.is_numeric() {
            return Err(CubeError::Unsupported(
                "sum is only supported for numeric dtypes",
            ));
        }
        let (rows, cols) = self.dim();
        let (out_index, lane_len, outer) = if axis == 0 {
            (self.columns.clone(), rows, cols)
        } else {
            (self.index.clone(), cols, rows)
        };
        let mut values = Vec::with_capacity(outer);
        for o in 0..outer {
            let mut acc = 0.0;
            let mut seen = false;
            for l in 0..lane_len {
                let (r, c) = if axis == 0 { (l, o) } else { (o, l) };
                let cell = self.get(r, c);
                if !cell.is_missing() {
                    acc += cell.storage_f64();
                    seen = true;
                }
            }
            values.push(if seen {
                Scalar::Float(acc)
            } else {
                Scalar::Null
            });
        }
        Ok(Series::new(out_index, values, DType::Float64))
    }

    /// Cast every cell to a new dtype.
    pub fn astype(&self, dtype: DType) -> Result<Frame, CubeError> {
        let grid = self.grid.cast(self.dtype, dtype)?;
        Frame::new(grid, self.index.clone(), self.columns.clone(), dtype)
    }

    /// NaN-aware value equality: axes must match, missing cells compare
    /// equal, and numerically equal cells match across numeric dtypes.
    pub fn equals(&self, other: &Frame) -> bool {
        self.index == other.index
            && self.columns == other.columns
            && self.grid.eq_missing(self.dtype, &other.grid, other.dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Frame {
        Frame::from_array(
            array![[1.0, 2.0], [3.0, 4.0]],
            AxisIndex::from_labels(["r0", "r1"]),
            AxisIndex::from_labels(["c0", "c1"]),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_shape_mismatch() {
        let err = Frame::from_array(
            array![[1.0, 2.0]],
            AxisIndex::from_labels(["r0", "r1"]),
            AxisIndex::from_labels(["c0", "c1"]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CubeError::ValueShape {
                expected: (2, 2),
                got: (1, 2)
            }
        );
    }

    #[test]
    fn reindex_fills_new_labels_with_missing() {
        let f = sample();
        let target = AxisIndex::from_labels(["r1", "r2"]);
        let out = f.reindex(Some(&target), None).unwrap();
        assert_eq!(out.get(0, 0), Scalar::Float(3.0));
        assert!(out.is_missing(1, 0));
        assert!(out.is_missing(1, 1));
    }

    #[test]
    fn pct_change_down_rows() {
        let f = Frame::from_array(
            array![[1.0], [2.0], [5.0]],
            AxisIndex::range(3),
            AxisIndex::range(1),
        )
        .unwrap();
        let out = f.pct_change(1, 0).unwrap();
        assert!(out.is_missing(0, 0));
        assert_eq!(out.get(1, 0), Scalar::Float(1.0));
        assert_eq!(out.get(2, 0), Scalar::Float(1.5));
    }

    #[test]
    fn or_missing_only_resolves_against_truthy() {
        let a = Frame::from_scalars(
            array![[Scalar::Null], [Scalar::Bool(false)]],
            AxisIndex::range(2),
            AxisIndex::from_labels(["a"]),
            None,
        )
        .unwrap();
        let b = Frame::from_scalars(
            array![[Scalar::Bool(true)], [Scalar::Bool(true)]],
            AxisIndex::range(2),
            AxisIndex::from_labels(["a"]),
            None,
        )
        .unwrap();
        let out = a.or_missing(&b).unwrap();
        assert_eq!(out.get(0, 0), Scalar::Bool(true));
        assert_eq!(out.get(1, 0), Scalar::Bool(true));

        let c = Frame::from_scalars(
            array![[Scalar::Bool(false)], [Scalar::Bool(false)]],
            AxisIndex::range(2),
            AxisIndex::from_labels(["a"]),
            None,
        )
        .unwrap();
        let out = a.or_missing(&c).unwrap();
        assert!(out.get(0, 0).is_missing());
        assert_eq!(out.get(1, 0), Scalar::Bool(false));
    }

    #[test]
    fn fillna_then_or_downcasts_to_bool_values() {
        let a = Frame::from_scalars(
            array![[Scalar::Null], [Scalar::Bool(false)]],
            AxisIndex::range(2),
            AxisIndex::from_labels(["a"]),
            None,
        )
        .unwrap();
        let filled = a.fillna(&Scalar::Bool(false)).unwrap();
        assert_eq!(filled.get(0, 0), Scalar::Bool(false));
    }

    #[test]
    fn sum_skips_missing_lanes() {
        let f = Frame::from_array(
            array![[1.0, f64::NAN], [3.0, f64::NAN]],
            AxisIndex::range(2),
            AxisIndex::from_labels(["a", "b"]),
        )
        .unwrap();
        let s = f.sum(0).unwrap();
        assert_eq!(s.get(0), &Scalar::Float(4.0));
        assert!(s.get(1).is_missing());
    }

    #[test]
    fn shift_on_int_dtype_promotes_to_float() {
        let f = Frame::from_scalars(
            array![[Scalar::Int(1)], [Scalar::Int(2)]],
            AxisIndex::range(2),
            AxisIndex::range(1),
            None,
        )
        .unwrap();
        assert_eq!(f.dtype(), DType::Int64);
        let out = f.shift(1, 0);
        assert_eq!(out.dtype(), DType::Float64);
        assert!(out.is_missing(0, 0));
        assert_eq!(out.get(1, 0), Scalar::Float(1.0));
    }

    #[test]
    fn equals_is_nan_aware() {
        let a = Frame::from_array(
            array![[1.0, f64::NAN]],
            AxisIndex::range(1),
            AxisIndex::range(2),
        )
        .unwrap();
        let b = a.clone();
        assert!(a.equals(&b));
    }
}
