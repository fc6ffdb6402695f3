//! Cube construction and element-type resolution.
//!
//! A cube is created from (a) a rank-3 block plus three label sequences,
//! (b) an ordered mapping of item label → frame with an orientation, or
//! (c) nothing at all (the empty cube). Validation happens before any
//! storage is built: rank first, then shape against the implied axis
//! lengths in items/major/minor order.

use std::collections::BTreeMap;

use ndarray::{Array3, ArrayD};

use crate::block::Block;
use crate::error::CubeError;
use crate::frame::Frame;
use crate::index::AxisIndex;
use crate::value::{DType, Label, Scalar};

use super::Cube;

/// Which axis the mapping keys of [`Cube::from_frames`] become.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orient {
    /// Keys → items; frame rows → major, frame columns → minor.
    Items,
    /// Keys → minor; frame columns → items, frame rows → major.
    Minor,
}

impl Cube {
    /// The empty cube: all axes length 0, float storage.
    pub fn empty() -> Cube {
        Cube {
            items: AxisIndex::empty(),
            major: AxisIndex::empty(),
            minor: AxisIndex::empty(),
            dtype: DType::Float64,
            block: Block::Numeric(Array3::zeros((0, 0, 0))),
        }
    }

    /// Float cube from a dense rank-3 array.
    pub fn from_array(
        values: Array3<f64>,
        items: AxisIndex,
        major: AxisIndex,
        minor: AxisIndex,
    ) -> Result<Cube, CubeError> {
        Cube::from_parts(items, major, minor, DType::Float64, Block::Numeric(values))
    }

    /// Dense rank-3 array forced to a dtype.
    ///
    /// Fails with [`CubeError::Cast`] when a value cannot represent the
    /// dtype (for instance `NaN` into an integer type); no element-by-
    /// element recovery is attempted.
    pub fn from_array_dtype(
        values: Array3<f64>,
        items: AxisIndex,
        major: AxisIndex,
        minor: AxisIndex,
        dtype: DType,
    ) -> Result<Cube, CubeError> {
        let block = Block::Numeric(values).cast(DType::Float64, dtype)?;
        Cube::from_parts(items, major, minor, dtype, block)
    }

    /// Dynamic-rank input: anything but rank 3 fails with
    /// [`CubeError::Rank`].
    pub fn from_dyn(
        values: ArrayD<f64>,
        items: AxisIndex,
        major: AxisIndex,
        minor: AxisIndex,
    ) -> Result<Cube, CubeError> {
        if values.ndim() != 3 {
            return Err(CubeError::Rank { got: values.ndim() });
        }
        let fixed = values
            .into_dimensionality::<ndarray::Ix3>()
            .expect("rank was just checked");
        Cube::from_array(fixed, items, major, minor)
    }

    /// Scalar cells with dtype inference.
    ///
    /// Without an explicit `dtype`, the minimal common type able to hold
    /// every value without loss is inferred: integer/float mixtures
    /// promote to float, non-numeric mixed with numeric promotes to
    /// object, missing data forces a missing-capable type.
    pub fn from_scalars(
        values: Array3<Scalar>,
        items: AxisIndex,
        major: AxisIndex,
        minor: AxisIndex,
        dtype: Option<DType>,
    ) -> Result<Cube, CubeError> {
        let dtype = dtype.unwrap_or_else(|| DType::infer(values.iter()));
        let dim = values.dim();
        let block = Block::build(dim, values.into_iter().collect(), dtype)?;
        Cube::from_parts(items, major, minor, dtype, block)
    }

    /// All-missing cube over the given axes.
    pub fn with_axes(
        items: AxisIndex,
        major: AxisIndex,
        minor: AxisIndex,
        dtype: Option<DType>,
    ) -> Result<Cube, CubeError> {
        let dtype = dtype.unwrap_or(DType::Float64);
        if !dtype.supports_missing() {
            return Err(CubeError::Cast {
                value: Scalar::Null.to_string(),
                dtype,
            });
        }
        let dim = (items.len(), major.len(), minor.len());
        Cube::from_parts(items, major, minor, dtype, Block::missing(dim, dtype))
    }

    /// Cube from an ordered mapping of label → frame.
    ///
    /// Each resulting axis is the first-seen union of the label values
    /// encountered for it; every frame is aligned to the union before
    /// stacking, so labels a frame lacks become missing cells.
    pub fn from_frames(
        entries: Vec<(Label, Frame)>,
        orient: Orient,
    ) -> Result<Cube, CubeError> {
        Cube::from_frames_dtype(entries, orient, None)
    }

    /// [`Cube::from_frames`] with a forced dtype.
    pub fn from_frames_dtype(
        entries: Vec<(Label, Frame)>,
        orient: Orient,
        dtype: Option<DType>,
    ) -> Result<Cube, CubeError> {
        if entries.is_empty() {
            return Ok(Cube::empty());
        }

        let keys = AxisIndex::from_labels(entries.iter().map(|(k, _)| k.clone()));
        let row_union = entries
            .iter()
            .skip(1)
            .fold(entries[0].1.index().clone(), |acc, (_, f)| {
                acc.union(f.index())
            });
        let col_union = entries
            .iter()
            .skip(1)
            .fold(entries[0].1.columns().clone(), |acc, (_, f)| {
                acc.union(f.columns())
            });

        let mut inferred = entries
            .iter()
            .skip(1)
            .fold(entries[0].1.dtype(), |acc, (_, f)| acc.promote(f.dtype()));
        let misaligned = entries
            .iter()
            .any(|(_, f)| f.index() != &row_union || f.columns() != &col_union);
        if misaligned && !inferred.supports_missing() {
            inferred = inferred.promote_missing();
        }
        let dtype = dtype.unwrap_or(inferred);

        let mut aligned = Vec::with_capacity(entries.len());
        for (_, frame) in &entries {
            aligned.push(frame.reindex(Some(&row_union), Some(&col_union))?);
        }

        let (items, major, minor) = match orient {
            Orient::Items => (keys, row_union, col_union),
            Orient::Minor => (col_union, row_union, keys),
        };
        let dim = (items.len(), major.len(), minor.len());

        let mut scalars = Vec::with_capacity(dim.0 * dim.1 * dim.2);
        match orient {
            Orient::Items => {
                for frame in &aligned {
                    for j in 0..dim.1 {
                        for k in 0..dim.2 {
                            scalars.push(frame.get(j, k));
                        }
                    }
                }
            }
            Orient::Minor => {
                for i in 0..dim.0 {
                    for j in 0..dim.1 {
                        for frame in &aligned {
                            scalars.push(frame.get(j, i));
                        }
                    }
                }
            }
        }

        let block = Block::build(dim, scalars, dtype)?;
        Cube::from_parts(items, major, minor, dtype, block)
    }

    /// Cast every cell to a new dtype.
    ///
    /// The cast is applied to the whole block; it succeeds or fails as a
    /// unit, per slice and per cell alike.
    pub fn astype(&self, dtype: DType) -> Result<Cube, CubeError> {
        let block = self.block.cast(self.dtype, dtype)?;
        Cube::from_parts(
            self.items.clone(),
            self.major.clone(),
            self.minor.clone(),
            dtype,
            block,
        )
    }

    /// Per-item heterogeneous casting is unsupported by design: a cube
    /// declares exactly one element type.
    pub fn astype_items(&self, _targets: &BTreeMap<Label, DType>) -> Result<Cube, CubeError> {
        Err(CubeError::Unsupported(
            "casting items to heterogeneous dtypes is not supported",
        ))
    }
}
