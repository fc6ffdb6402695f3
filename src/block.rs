//! Dense storage for cubes and frames.
//!
//! A [`Block`] is the cube's rank-3 backing store, a [`Grid`] its rank-2
//! counterpart used by frames and cross-sections. Each comes in two
//! physical representations: `Numeric` (contiguous `f64`, `NaN` as the
//! missing sentinel) for every numeric dtype including bool, and `Object`
//! (owned [`Scalar`]s, `Null` as the sentinel) for `str`/`object` dtypes.
//! The logical dtype lives on the owning container; storage only knows how
//! to hold and move cells.

use ndarray::{Array, Array2, Array3, Dimension, RemoveAxis};

use crate::error::CubeError;
use crate::value::{DType, Scalar};

// =============================================================================
// Dimension-generic kernels
// =============================================================================

/// Gather along `axis`: output position `p` takes input position
/// `indexer[p]`, or `fill` where the indexer is `None`.
fn take_along<A: Clone, D: Dimension + RemoveAxis>(
    arr: &Array<A, D>,
    axis: ndarray::Axis,
    indexer: &[Option<usize>],
    fill: &A,
) -> Array<A, D> {
    let mut shape = arr.raw_dim();
    shape[axis.index()] = indexer.len();
    let mut out = Array::from_elem(shape, fill.clone());
    for (new_pos, src) in indexer.iter().enumerate() {
        if let Some(old_pos) = src {
            out.index_axis_mut(axis, new_pos)
                .assign(&arr.index_axis(axis, *old_pos));
        }
    }
    out
}

/// Positional selection along `axis`, duplicates and order preserved.
fn select_along<A: Clone, D: Dimension + RemoveAxis>(
    arr: &Array<A, D>,
    axis: ndarray::Axis,
    positions: &[usize],
    fill: &A,
) -> Array<A, D> {
    let indexer: Vec<Option<usize>> = positions.iter().map(|&p| Some(p)).collect();
    take_along(arr, axis, &indexer, fill)
}

/// Shift along `axis` by `periods`, vacated cells filled with `fill`.
fn shift_along<A: Clone, D: Dimension + RemoveAxis>(
    arr: &Array<A, D>,
    axis: ndarray::Axis,
    periods: isize,
    fill: &A,
) -> Array<A, D> {
    let len = arr.shape()[axis.index()] as isize;
    let indexer: Vec<Option<usize>> = (0..len)
        .map(|p| {
            let src = p - periods;
            if (0..len).contains(&src) {
                Some(src as usize)
            } else {
                None
            }
        })
        .collect();
    take_along(arr, axis, &indexer, fill)
}

/// Carry the last valid value forward (or backward) along each lane of
/// `axis`.
fn fill_directional<A: Clone, D: Dimension>(
    arr: &mut Array<A, D>,
    axis: ndarray::Axis,
    backward: bool,
    is_missing: impl Fn(&A) -> bool,
) {
    for mut lane in arr.lanes_mut(axis) {
        let len = lane.len();
        let mut last: Option<A> = None;
        for step in 0..len {
            let pos = if backward { len - 1 - step } else { step };
            if is_missing(&lane[pos]) {
                if let Some(v) = &last {
                    lane[pos] = v.clone();
                }
            } else {
                last = Some(lane[pos].clone());
            }
        }
    }
}

// =============================================================================
// Block (rank 3)
// =============================================================================

/// Rank-3 dense storage: (items, major, minor).
#[derive(Debug, Clone)]
pub enum Block {
    Numeric(Array3<f64>),
    Object(Array3<Scalar>),
}

impl Block {
    /// All-missing block of the given shape for a dtype.
    pub fn missing(dim: (usize, usize, usize), dtype: DType) -> Block {
        if dtype.is_numeric() {
            Block::Numeric(Array3::from_elem(dim, f64::NAN))
        } else {
            Block::Object(Array3::from_elem(dim, Scalar::Null))
        }
    }

    /// Build storage from scalars in row-major order, casting each to
    /// `dtype`. The first unconvertible value aborts the build.
    pub fn build(
        dim: (usize, usize, usize),
        scalars: Vec<Scalar>,
        dtype: DType,
    ) -> Result<Block, CubeError> {
        debug_assert_eq!(dim.0 * dim.1 * dim.2, scalars.len());
        if dtype.is_numeric() {
            let mut data = Vec::with_capacity(scalars.len());
            for s in &scalars {
                data.push(s.cast(dtype)?.storage_f64());
            }
            Ok(Block::Numeric(
                Array3::from_shape_vec(dim, data).expect("shape matches scalar count"),
            ))
        } else {
            let mut data = Vec::with_capacity(scalars.len());
            for s in &scalars {
                data.push(s.cast(dtype)?);
            }
            Ok(Block::Object(
                Array3::from_shape_vec(dim, data).expect("shape matches scalar count"),
            ))
        }
    }

    #[inline]
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            Block::Numeric(a) => a.dim(),
            Block::Object(a) => a.dim(),
        }
    }

    /// Typed cell read.
    #[inline]
    pub fn get(&self, idx: [usize; 3], dtype: DType) -> Scalar {
        match self {
            Block::Numeric(a) => Scalar::from_storage(a[idx], dtype),
            Block::Object(a) => a[idx].clone(),
        }
    }

    /// Cell write; the value must already conform to the storage dtype.
    #[inline]
    pub(crate) fn set_cast(&mut self, idx: [usize; 3], value: Scalar) {
        match self {
            Block::Numeric(a) => a[idx] = value.storage_f64(),
            Block::Object(a) => a[idx] = value,
        }
    }

    /// Cast `value` to `dtype` and write it.
    pub fn set(&mut self, idx: [usize; 3], value: &Scalar, dtype: DType) -> Result<(), CubeError> {
        let cast = value.cast(dtype)?;
        self.set_cast(idx, cast);
        Ok(())
    }

    #[inline]
    pub fn is_missing(&self, idx: [usize; 3]) -> bool {
        match self {
            Block::Numeric(a) => a[idx].is_nan(),
            Block::Object(a) => a[idx].is_missing(),
        }
    }

    /// Whether any cell is missing.
    pub fn has_missing(&self) -> bool {
        match self {
            Block::Numeric(a) => a.iter().any(|v| v.is_nan()),
            Block::Object(a) => a.iter().any(|s| s.is_missing()),
        }
    }

    pub fn select(&self, axis: ndarray::Axis, positions: &[usize]) -> Block {
        match self {
            Block::Numeric(a) => Block::Numeric(select_along(a, axis, positions, &f64::NAN)),
            Block::Object(a) => Block::Object(select_along(a, axis, positions, &Scalar::Null)),
        }
    }

    /// Reindex along one axis; `None` entries become missing cells.
    pub fn take(&self, axis: ndarray::Axis, indexer: &[Option<usize>]) -> Block {
        match self {
            Block::Numeric(a) => Block::Numeric(take_along(a, axis, indexer, &f64::NAN)),
            Block::Object(a) => Block::Object(take_along(a, axis, indexer, &Scalar::Null)),
        }
    }

    pub fn shift(&self, axis: ndarray::Axis, periods: isize) -> Block {
        match self {
            Block::Numeric(a) => Block::Numeric(shift_along(a, axis, periods, &f64::NAN)),
            Block::Object(a) => Block::Object(shift_along(a, axis, periods, &Scalar::Null)),
        }
    }

    pub fn transpose(&self, perm: [usize; 3]) -> Block {
        match self {
            Block::Numeric(a) => Block::Numeric(a.view().permuted_axes(perm).to_owned()),
            Block::Object(a) => Block::Object(a.view().permuted_axes(perm).to_owned()),
        }
    }

    /// The 2-D slab at `pos` along `axis`, in storage orientation.
    pub fn grid_at(&self, axis: ndarray::Axis, pos: usize) -> Grid {
        match self {
            Block::Numeric(a) => Grid::Numeric(a.index_axis(axis, pos).to_owned()),
            Block::Object(a) => Grid::Object(a.index_axis(axis, pos).to_owned()),
        }
    }

    /// Write a 2-D slab at `pos` along `axis`; storages must agree.
    pub(crate) fn set_grid(&mut self, axis: ndarray::Axis, pos: usize, grid: &Grid) {
        match (self, grid) {
            (Block::Numeric(a), Grid::Numeric(g)) => a.index_axis_mut(axis, pos).assign(g),
            (Block::Object(a), Grid::Object(g)) => a.index_axis_mut(axis, pos).assign(g),
            _ => unreachable!("storage kinds reconciled before slab writes"),
        }
    }

    /// Append one slab at the end of `axis`; storages must agree.
    pub(crate) fn append(&self, axis: ndarray::Axis, grid: &Grid) -> Block {
        match (self, grid) {
            (Block::Numeric(a), Grid::Numeric(g)) => Block::Numeric(
                ndarray::concatenate(axis, &[a.view(), g.view().insert_axis(axis)])
                    .expect("slab shape matches the block"),
            ),
            (Block::Object(a), Grid::Object(g)) => Block::Object(
                ndarray::concatenate(axis, &[a.view(), g.view().insert_axis(axis)])
                    .expect("slab shape matches the block"),
            ),
            _ => unreachable!("storage kinds reconciled before slab appends"),
        }
    }

    /// Convert numeric storage to object storage, typing cells by `dtype`.
    pub fn to_object(&self, dtype: DType) -> Block {
        match self {
            Block::Numeric(a) => Block::Object(a.mapv(|v| Scalar::from_storage(v, dtype))),
            Block::Object(a) => Block::Object(a.clone()),
        }
    }

    /// Elementwise cast from `from` to `to`.
    pub fn cast(&self, from: DType, to: DType) -> Result<Block, CubeError> {
        let dim = self.dim();
        let scalars: Vec<Scalar> = self.iter_scalars(from).collect();
        Block::build(dim, scalars, to)
    }

    pub fn iter_scalars(&self, dtype: DType) -> Box<dyn Iterator<Item = Scalar> + '_> {
        match self {
            Block::Numeric(a) => Box::new(a.iter().map(move |&v| Scalar::from_storage(v, dtype))),
            Block::Object(a) => Box::new(a.iter().cloned()),
        }
    }

    /// Missing/total cell counts in the slab at `pos` along `axis`.
    pub fn slab_missing(&self, axis: ndarray::Axis, pos: usize) -> (usize, usize) {
        match self {
            Block::Numeric(a) => {
                let slab = a.index_axis(axis, pos);
                (slab.iter().filter(|v| v.is_nan()).count(), slab.len())
            }
            Block::Object(a) => {
                let slab = a.index_axis(axis, pos);
                (slab.iter().filter(|s| s.is_missing()).count(), slab.len())
            }
        }
    }

    /// Replace every missing cell with `fill` (already cast to the dtype).
    pub fn fill_missing(&mut self, fill: &Scalar) {
        match self {
            Block::Numeric(a) => {
                let v = fill.storage_f64();
                a.mapv_inplace(|x| if x.is_nan() { v } else { x });
            }
            Block::Object(a) => {
                for cell in a.iter_mut() {
                    if cell.is_missing() {
                        *cell = fill.clone();
                    }
                }
            }
        }
    }

    /// Propagate the last valid observation along `axis`.
    pub fn fill_forward(&mut self, axis: ndarray::Axis, backward: bool) {
        match self {
            Block::Numeric(a) => fill_directional(a, axis, backward, |v| v.is_nan()),
            Block::Object(a) => fill_directional(a, axis, backward, Scalar::is_missing),
        }
    }

    /// Round numeric cells to `decimals` places.
    pub fn round(&self, decimals: u32) -> Result<Block, CubeError> {
        match self {
            Block::Numeric(a) => {
                let factor = 10f64.powi(decimals as i32);
                Ok(Block::Numeric(a.mapv(|v| (v * factor).round() / factor)))
            }
            Block::Object(_) => Err(CubeError::Unsupported(
                "round is only supported for numeric dtypes",
            )),
        }
    }

    /// Elementwise combination of two numeric blocks of equal shape.
    pub fn combine_numeric(
        &self,
        other: &Block,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Block, CubeError> {
        match (self, other) {
            (Block::Numeric(a), Block::Numeric(b)) => {
                let mut out = a.clone();
                ndarray::Zip::from(&mut out).and(b).for_each(|x, &y| {
                    *x = f(*x, y);
                });
                Ok(Block::Numeric(out))
            }
            _ => Err(CubeError::Unsupported(
                "elementwise arithmetic is only supported for numeric dtypes",
            )),
        }
    }

    /// NaN-aware equality between typed views of two blocks.
    pub fn eq_missing(&self, dtype: DType, other: &Block, other_dtype: DType) -> bool {
        if self.dim() != other.dim() {
            return false;
        }
        self.iter_scalars(dtype)
            .zip(other.iter_scalars(other_dtype))
            .all(|(a, b)| a.eq_missing(&b))
    }
}

// =============================================================================
// Grid (rank 2)
// =============================================================================

/// Rank-2 dense storage: (rows, cols).
#[derive(Debug, Clone)]
pub enum Grid {
    Numeric(Array2<f64>),
    Object(Array2<Scalar>),
}

impl Grid {
    pub fn missing(dim: (usize, usize), dtype: DType) -> Grid {
        if dtype.is_numeric() {
            Grid::Numeric(Array2::from_elem(dim, f64::NAN))
        } else {
            Grid::Object(Array2::from_elem(dim, Scalar::Null))
        }
    }

    pub fn build(
        dim: (usize, usize),
        scalars: Vec<Scalar>,
        dtype: DType,
    ) -> Result<Grid, CubeError> {
        debug_assert_eq!(dim.0 * dim.1, scalars.len());
        if dtype.is_numeric() {
            let mut data = Vec::with_capacity(scalars.len());
            for s in &scalars {
                data.push(s.cast(dtype)?.storage_f64());
            }
            Ok(Grid::Numeric(
                Array2::from_shape_vec(dim, data).expect("shape matches scalar count"),
            ))
        } else {
            let mut data = Vec::with_capacity(scalars.len());
            for s in &scalars {
                data.push(s.cast(dtype)?);
            }
            Ok(Grid::Object(
                Array2::from_shape_vec(dim, data).expect("shape matches scalar count"),
            ))
        }
    }

    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Grid::Numeric(a) => a.dim(),
            Grid::Object(a) => a.dim(),
        }
    }

    #[inline]
    pub fn get(&self, idx: [usize; 2], dtype: DType) -> Scalar {
        match self {
            Grid::Numeric(a) => Scalar::from_storage(a[idx], dtype),
            Grid::Object(a) => a[idx].clone(),
        }
    }

    #[inline]
    pub(crate) fn set_cast(&mut self, idx: [usize; 2], value: Scalar) {
        match self {
            Grid::Numeric(a) => a[idx] = value.storage_f64(),
            Grid::Object(a) => a[idx] = value,
        }
    }

    pub fn set(&mut self, idx: [usize; 2], value: &Scalar, dtype: DType) -> Result<(), CubeError> {
        let cast = value.cast(dtype)?;
        self.set_cast(idx, cast);
        Ok(())
    }

    #[inline]
    pub fn is_missing(&self, idx: [usize; 2]) -> bool {
        match self {
            Grid::Numeric(a) => a[idx].is_nan(),
            Grid::Object(a) => a[idx].is_missing(),
        }
    }

    pub fn has_missing(&self) -> bool {
        match self {
            Grid::Numeric(a) => a.iter().any(|v| v.is_nan()),
            Grid::Object(a) => a.iter().any(|s| s.is_missing()),
        }
    }

    pub fn take(&self, axis: ndarray::Axis, indexer: &[Option<usize>]) -> Grid {
        match self {
            Grid::Numeric(a) => Grid::Numeric(take_along(a, axis, indexer, &f64::NAN)),
            Grid::Object(a) => Grid::Object(take_along(a, axis, indexer, &Scalar::Null)),
        }
    }

    pub fn select(&self, axis: ndarray::Axis, positions: &[usize]) -> Grid {
        match self {
            Grid::Numeric(a) => Grid::Numeric(select_along(a, axis, positions, &f64::NAN)),
            Grid::Object(a) => Grid::Object(select_along(a, axis, positions, &Scalar::Null)),
        }
    }

    pub fn shift(&self, axis: ndarray::Axis, periods: isize) -> Grid {
        match self {
            Grid::Numeric(a) => Grid::Numeric(shift_along(a, axis, periods, &f64::NAN)),
            Grid::Object(a) => Grid::Object(shift_along(a, axis, periods, &Scalar::Null)),
        }
    }

    pub fn transpose(&self) -> Grid {
        match self {
            Grid::Numeric(a) => Grid::Numeric(a.t().to_owned()),
            Grid::Object(a) => Grid::Object(a.t().to_owned()),
        }
    }

    pub fn to_object(&self, dtype: DType) -> Grid {
        match self {
            Grid::Numeric(a) => Grid::Object(a.mapv(|v| Scalar::from_storage(v, dtype))),
            Grid::Object(a) => Grid::Object(a.clone()),
        }
    }

    pub fn cast(&self, from: DType, to: DType) -> Result<Grid, CubeError> {
        let dim = self.dim();
        let scalars: Vec<Scalar> = self.iter_scalars(from).collect();
        Grid::build(dim, scalars, to)
    }

    pub fn iter_scalars(&self, dtype: DType) -> Box<dyn Iterator<Item = Scalar> + '_> {
        match self {
            Grid::Numeric(a) => Box::new(a.iter().map(move |&v| Scalar::from_storage(v, dtype))),
            Grid::Object(a) => Box::new(a.iter().cloned()),
        }
    }

    pub fn fill_missing(&mut self, fill: &Scalar) {
        match self {
            Grid::Numeric(a) => {
                let v = fill.storage_f64();
                a.mapv_inplace(|x| if x.is_nan() { v } else { x });
            }
            Grid::Object(a) => {
                for cell in a.iter_mut() {
                    if cell.is_missing() {
                        *cell = fill.clone();
                    }
                }
            }
        }
    }

    pub fn fill_forward(&mut self, axis: ndarray::Axis, backward: bool) {
        match self {
            Grid::Numeric(a) => fill_directional(a, axis, backward, |v| v.is_nan()),
            Grid::Object(a) => fill_directional(a, axis, backward, Scalar::is_missing),
        }
    }

    pub fn combine_numeric(
        &self,
        other: &Grid,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Grid, CubeError> {
        match (self, other) {
            (Grid::Numeric(a), Grid::Numeric(b)) => {
                let mut out = a.clone();
                ndarray::Zip::from(&mut out).and(b).for_each(|x, &y| {
                    *x = f(*x, y);
                });
                Ok(Grid::Numeric(out))
            }
            _ => Err(CubeError::Unsupported(
                "elementwise arithmetic is only supported for numeric dtypes",
            )),
        }
    }

    pub fn eq_missing(&self, dtype: DType, other: &Grid, other_dtype: DType) -> bool {
        if self.dim() != other.dim() {
            return false;
        }
        self.iter_scalars(dtype)
            .zip(other.iter_scalars(other_dtype))
            .all(|(a, b)| a.eq_missing(&b))
    }
}
