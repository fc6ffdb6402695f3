//! Reshaping between the cube and its stacked 2-D form, and the apply
//! family of slice-wise reductions.

use rayon::prelude::*;

use crate::axis::Axis;
use crate::block::{Block, Grid};
use crate::error::CubeError;
use crate::frame::{Frame, Series};
use crate::index::AxisIndex;
use crate::value::{DType, Label, Scalar};

use super::Cube;

/// A flat unnamed axis contributes its canonical level name to the
/// stacked row index; named or hierarchical axes keep their own names.
fn canonical_names(index: &AxisIndex, default: &str) -> AxisIndex {
    if index.nlevels() == 1 && index.names()[0].is_none() {
        index.clone().with_names(vec![Some(default.to_string())])
    } else {
        index.clone()
    }
}

impl Cube {
    /// Stack the cube into a frame.
    ///
    /// The row index is the cartesian product of (major, minor) in
    /// major-outer/minor-inner order, one level per retained sub-level of
    /// each axis; columns are the items. Row order follows the existing
    /// label sequences — duplicates and unsorted labels are preserved
    /// faithfully. With `filter_observations`, rows that are missing
    /// across every item are dropped.
    pub fn to_frame(&self, filter_observations: bool) -> Frame {
        let (n_items, n_major, n_minor) = self.shape();
        let major = canonical_names(&self.major, "major");
        let minor = canonical_names(&self.minor, "minor");
        let full = major.product(&minor);

        let keep: Vec<usize> = (0..n_major * n_minor)
            .filter(|&row| {
                if !filter_observations {
                    return true;
                }
                let (j, k) = (row / n_minor, row % n_minor);
                (0..n_items).any(|i| !self.block.is_missing([i, j, k]))
            })
            .collect();

        let mut scalars = Vec::with_capacity(keep.len() * n_items);
        for &row in &keep {
            let (j, k) = (row / n_minor, row % n_minor);
            for i in 0..n_items {
                scalars.push(self.value_at([i, j, k]));
            }
        }
        let grid = Grid::build((keep.len(), n_items), scalars, self.dtype)
            .expect("cells already conform to the cube dtype");
        Frame::new(grid, full.select(&keep), self.items.clone(), self.dtype)
            .expect("grid shape matches the stacked axes")
    }

    /// Rebuild a cube from a stacked frame with a two-level row index.
    ///
    /// Level 0 first-seen-uniques become the major axis, level 1 the
    /// minor axis, the columns the items. Combinations absent from the
    /// frame become missing cells; rows that were dropped as fully
    /// missing stay lost, the documented lossy edge of the round-trip.
    pub fn from_stacked(frame: &Frame) -> Result<Cube, CubeError> {
        if frame.index().nlevels() != 2 {
            return Err(CubeError::Unsupported(
                "lifting a stacked frame requires exactly two row-index levels",
            ));
        }
        let strip = |name: &Option<String>, default: &str| -> Option<String> {
            match name {
                Some(n) if n.as_str() == default => None,
                other => other.clone(),
            }
        };
        let names = frame.index().names();
        let major = AxisIndex::from_tuples(
            frame
                .index()
                .level_uniques(0)
                .into_iter()
                .map(|l| vec![l])
                .collect(),
            vec![strip(&names[0], "major")],
        );
        let minor = AxisIndex::from_tuples(
            frame
                .index()
                .level_uniques(1)
                .into_iter()
                .map(|l| vec![l])
                .collect(),
            vec![strip(&names[1], "minor")],
        );
        let items = frame.columns().clone();
        let dim = (items.len(), major.len(), minor.len());

        let major_pos: std::collections::HashMap<&Label, usize> = major
            .labels()
            .iter()
            .enumerate()
            .map(|(pos, t)| (&t[0], pos))
            .collect();
        let minor_pos: std::collections::HashMap<&Label, usize> = minor
            .labels()
            .iter()
            .enumerate()
            .map(|(pos, t)| (&t[0], pos))
            .collect();

        let dtype = frame.dtype();
        let mut block = Block::missing(dim, dtype);
        for (row, tuple) in frame.index().labels().iter().enumerate() {
            let j = major_pos[&tuple[0]];
            let k = minor_pos[&tuple[1]];
            for i in 0..dim.0 {
                block.set([i, j, k], &frame.get(row, i), dtype)?;
            }
        }
        let mut cube = Cube::from_parts(items, major, minor, dtype, block)?;
        cube.admit_missing();
        Ok(cube)
    }

    /// Reduce the 1-D vectors running along `axis`.
    ///
    /// The result is a frame over the remaining two axes (in storage
    /// order); its dtype is inferred from the function's outputs.
    pub fn apply_along(
        &self,
        axis: Axis,
        f: impl Fn(&Series) -> Scalar,
    ) -> Result<Frame, CubeError> {
        let (rows, cols) = match axis {
            Axis::Items => (self.major.clone(), self.minor.clone()),
            Axis::Major => (self.items.clone(), self.minor.clone()),
            Axis::Minor => (self.items.clone(), self.major.clone()),
        };
        let lane_index = self.axis_index(axis).clone();
        let lane_len = lane_index.len();

        let locate = |p: usize, r: usize, c: usize| -> [usize; 3] {
            match axis {
                Axis::Items => [p, r, c],
                Axis::Major => [r, p, c],
                Axis::Minor => [r, c, p],
            }
        };

        let mut out = Vec::with_capacity(rows.len() * cols.len());
        for r in 0..rows.len() {
            for c in 0..cols.len() {
                let values: Vec<Scalar> = (0..lane_len)
                    .map(|p| self.value_at(locate(p, r, c)))
                    .collect();
                out.push(f(&Series::new(lane_index.clone(), values, self.dtype)));
            }
        }
        let dtype = DType::infer(out.iter());
        let grid = Grid::build((rows.len(), cols.len()), out, dtype)?;
        Frame::new(grid, rows, cols, dtype)
    }

    /// Reduce the 2-D slices spanning `axes` to one scalar each.
    ///
    /// The result is a series over the remaining axis, its dtype following
    /// the scalars' native type. Slices are evaluated in parallel.
    ///
    /// # Panics
    ///
    /// Panics if the two axes coincide.
    pub fn apply_frames(
        &self,
        axes: (Axis, Axis),
        f: impl Fn(&Frame) -> Scalar + Sync,
    ) -> Series {
        assert_ne!(axes.0, axes.1, "apply_frames needs two distinct axes");
        let remaining = Axis::ALL
            .into_iter()
            .find(|a| *a != axes.0 && *a != axes.1)
            .expect("two distinct axes leave one remaining");
        let values: Vec<Scalar> = (0..self.len(remaining))
            .into_par_iter()
            .map(|pos| f(&self.frame_at(remaining, pos)))
            .collect();
        Series::from_values(self.axis_index(remaining).clone(), values)
    }

    /// Elementwise transform; the result dtype is inferred from the
    /// outputs.
    pub fn map_values(&self, f: impl Fn(Scalar) -> Scalar) -> Result<Cube, CubeError> {
        let scalars: Vec<Scalar> = self.block.iter_scalars(self.dtype).map(f).collect();
        let dtype = DType::infer(scalars.iter());
        let block = Block::build(self.shape(), scalars, dtype)?;
        Cube::from_parts(
            self.items.clone(),
            self.major.clone(),
            self.minor.clone(),
            dtype,
            block,
        )
    }

    /// Sum of non-missing cells along `axis`; a fully missing lane stays
    /// missing.
    pub fn sum(&self, axis: Axis) -> Result<Frame, CubeError> {
        if !self.dtype.is_numeric() {
            return Err(CubeError::Unsupported(
                "sum is only supported for numeric dtypes",
            ));
        }
        self.apply_along(axis, |lane| {
            let mut acc = 0.0;
            let mut seen = false;
            for v in lane.values() {
                if !v.is_missing() {
                    acc += v.storage_f64();
                    seen = true;
                }
            }
            if seen {
                Scalar::Float(acc)
            } else {
                Scalar::Null
            }
        })
    }
}
