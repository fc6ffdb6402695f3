//! The labeled three-dimensional array container.
//!
//! A [`Cube`] owns three axis label sets (items, major, minor) and one
//! rank-3 [`Block`] whose shape always equals the axis lengths. All
//! read/write access resolves through the indexing layer; alignment
//! operations produce new cubes with reconciled axes; the converter maps
//! a cube onto a hierarchically-indexed frame and back.
//!
//! Operations that exist both as a pure function and as an in-place
//! mutation are two explicit methods (`dropna` / `dropna_inplace`), never
//! one method with a mode flag.

mod construct;
mod indexing;
mod ops;
mod reshape;
mod update;

pub use construct::Orient;
pub use indexing::{Selection, Selector};
pub use ops::BinOp;
pub use update::{Join, OverlapPolicy, UpdateOptions};

use std::fmt;

use crate::axis::{Axis, AxisLike};
use crate::block::Block;
use crate::error::CubeError;
use crate::frame::{FillMethod, Frame};
use crate::index::AxisIndex;
use crate::value::{DType, Label, Scalar};

/// Which lanes `dropna` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum How {
    /// Drop a label if any cell in its slab is missing.
    Any,
    /// Drop a label only if its entire slab is missing.
    All,
}

/// Whether `drop` tolerates unknown labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPolicy {
    /// Unknown labels fail with [`CubeError::LabelNotFound`].
    Raise,
    /// Unknown labels are silently skipped.
    Ignore,
}

/// Labeled 3-D array: items × major × minor.
#[derive(Debug, Clone)]
pub struct Cube {
    pub(crate) items: AxisIndex,
    pub(crate) major: AxisIndex,
    pub(crate) minor: AxisIndex,
    pub(crate) dtype: DType,
    pub(crate) block: Block,
}

impl Cube {
    /// Assemble a cube, enforcing the shape invariant.
    pub(crate) fn from_parts(
        items: AxisIndex,
        major: AxisIndex,
        minor: AxisIndex,
        dtype: DType,
        block: Block,
    ) -> Result<Self, CubeError> {
        let implied = [items.len(), major.len(), minor.len()];
        let (i, j, k) = block.dim();
        if [i, j, k] != implied {
            return Err(CubeError::ShapeMismatch {
                passed: [i, j, k],
                implied,
            });
        }
        Ok(Self {
            items,
            major,
            minor,
            dtype,
            block,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn items(&self) -> &AxisIndex {
        &self.items
    }

    #[inline]
    pub fn major_axis(&self) -> &AxisIndex {
        &self.major
    }

    #[inline]
    pub fn minor_axis(&self) -> &AxisIndex {
        &self.minor
    }

    /// The label set of any axis.
    pub fn axis_index(&self, axis: Axis) -> &AxisIndex {
        match axis {
            Axis::Items => &self.items,
            Axis::Major => &self.major,
            Axis::Minor => &self.minor,
        }
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline]
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Shape in (items, major, minor) order.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.block.dim()
    }

    /// Length of one axis.
    pub fn len(&self, axis: Axis) -> usize {
        self.axis_index(axis).len()
    }

    /// Whether the cube holds no cells.
    pub fn is_empty(&self) -> bool {
        let (i, j, k) = self.shape();
        i == 0 || j == 0 || k == 0
    }

    /// Whether any cell is missing.
    pub fn has_missing(&self) -> bool {
        self.block.has_missing()
    }

    /// NaN-aware value equality: all three axes must match and every cell
    /// pair must be equal (missing cells compare equal, numerically equal
    /// cells match across numeric dtypes).
    pub fn equals(&self, other: &Cube) -> bool {
        self.items == other.items
            && self.major == other.major
            && self.minor == other.minor
            && self.block.eq_missing(self.dtype, &other.block, other.dtype)
    }

    /// Truthiness reduction: every non-missing cell is truthy.
    pub fn all(&self) -> bool {
        self.block
            .iter_scalars(self.dtype)
            .all(|s| s.truthy().unwrap_or(true))
    }

    /// Promote the dtype (and storage where needed) once missing cells
    /// exist that the current dtype cannot represent.
    pub(crate) fn admit_missing(&mut self) {
        if self.dtype.supports_missing() || !self.block.has_missing() {
            return;
        }
        let promoted = self.dtype.promote_missing();
        if !promoted.is_numeric() {
            self.block = self.block.to_object(self.dtype);
        }
        self.dtype = promoted;
    }

    // =========================================================================
    // Axis mutation
    // =========================================================================

    /// Remove every slice carrying `label` from the items axis.
    ///
    /// Remaining slices keep their relative order and values.
    pub fn del_item(&mut self, label: &Label) -> Result<(), CubeError> {
        let hits = self.items.positions_of(label);
        if hits.is_empty() {
            return Err(CubeError::LabelNotFound {
                label: label.to_string(),
                axis: Axis::Items,
            });
        }
        let keep: Vec<usize> = (0..self.items.len()).filter(|p| !hits.contains(p)).collect();
        self.block = self.block.select(Axis::Items.nd(), &keep);
        self.items = self.items.select(&keep);
        Ok(())
    }

    /// Remove `label`'s slice and return it.
    ///
    /// Refused on a duplicated label: one frame cannot faithfully carry
    /// several removed slices.
    pub fn pop(&mut self, label: &Label) -> Result<Frame, CubeError> {
        let hits = self.items.positions_of(label);
        match hits.len() {
            0 => Err(CubeError::LabelNotFound {
                label: label.to_string(),
                axis: Axis::Items,
            }),
            1 => {
                let frame = self.item_at(hits[0]);
                self.del_item(label)?;
                Ok(frame)
            }
            _ => Err(CubeError::DuplicateLabels { axis: Axis::Items }),
        }
    }

    /// Drop labels along an axis, returning a new cube.
    ///
    /// The axis may be addressed by position or alias name. Unknown labels
    /// fail unless [`DropPolicy::Ignore`] is requested.
    pub fn drop<A: AxisLike>(
        &self,
        labels: &[Label],
        axis: A,
        policy: DropPolicy,
    ) -> Result<Cube, CubeError> {
        let axis = Axis::resolve(axis)?;
        let kept = self.axis_index(axis).drop_positions(
            labels,
            axis,
            policy == DropPolicy::Ignore,
        )?;
        Ok(self.select_positions(axis, &kept))
    }

    /// Sub-cube at the given positions along one axis.
    pub(crate) fn select_positions(&self, axis: Axis, positions: &[usize]) -> Cube {
        let block = self.block.select(axis.nd(), positions);
        let mut out = self.clone();
        out.block = block;
        match axis {
            Axis::Items => out.items = self.items.select(positions),
            Axis::Major => out.major = self.major.select(positions),
            Axis::Minor => out.minor = self.minor.select(positions),
        }
        out
    }

    /// Align onto new label sequences, any subset of the three axes.
    ///
    /// New labels become missing cells (promoting the dtype when needed).
    /// With `copy = false` and no axis actually changing, the receiver's
    /// current storage is reused unchanged; this is an optimization hint,
    /// never a correctness requirement.
    pub fn reindex(
        &self,
        items: Option<&AxisIndex>,
        major: Option<&AxisIndex>,
        minor: Option<&AxisIndex>,
        copy: bool,
    ) -> Result<Cube, CubeError> {
        // copy=false is an aliasing hint only: ownership means every
        // result is an independent cube either way
        let _ = copy;
        let mut out = self.clone();
        let targets = [
            (Axis::Items, items),
            (Axis::Major, major),
            (Axis::Minor, minor),
        ];
        for (axis, target) in targets {
            let Some(target) = target else { continue };
            if target == out.axis_index(axis) {
                continue;
            }
            let indexer = out.axis_index(axis).indexer_for(target, axis)?;
            out.block = out.block.take(axis.nd(), &indexer);
            match axis {
                Axis::Items => out.items = target.clone(),
                Axis::Major => out.major = target.clone(),
                Axis::Minor => out.minor = target.clone(),
            }
        }
        out.admit_missing();
        Ok(out)
    }

    /// Reindex a single axis.
    pub fn reindex_axis<A: AxisLike>(
        &self,
        axis: A,
        target: &AxisIndex,
        copy: bool,
    ) -> Result<Cube, CubeError> {
        match Axis::resolve(axis)? {
            Axis::Items => self.reindex(Some(target), None, None, copy),
            Axis::Major => self.reindex(None, Some(target), None, copy),
            Axis::Minor => self.reindex(None, None, Some(target), copy),
        }
    }

    /// Drop labels whose slab holds missing data, per `how`.
    pub fn dropna(&self, axis: Axis, how: How) -> Cube {
        let len = self.len(axis);
        let keep: Vec<usize> = (0..len)
            .filter(|&pos| {
                let (missing, total) = self.block.slab_missing(axis.nd(), pos);
                match how {
                    How::Any => missing == 0,
                    How::All => missing < total || total == 0,
                }
            })
            .collect();
        self.select_positions(axis, &keep)
    }

    /// In-place twin of [`Cube::dropna`].
    pub fn dropna_inplace(&mut self, axis: Axis, how: How) {
        *self = self.dropna(axis, how);
    }

    /// Replace missing cells with `value`.
    ///
    /// A fill `limit` is only meaningful for method-based filling and is
    /// refused here by design.
    pub fn fillna(&self, value: &Scalar, limit: Option<usize>) -> Result<Cube, CubeError> {
        if limit.is_some() {
            return Err(CubeError::Unsupported(
                "fillna with a limit requires a fill method, not a value",
            ));
        }
        let mut out = self.clone();
        let dtype = match value.natural_dtype() {
            Some(d) => out.dtype.promote(d),
            None => out.dtype,
        };
        if dtype.is_numeric() != out.dtype.is_numeric() {
            out.block = out.block.to_object(out.dtype);
        }
        out.dtype = dtype;
        out.block.fill_missing(&value.cast(dtype)?);
        Ok(out)
    }

    /// In-place twin of [`Cube::fillna`].
    pub fn fillna_inplace(&mut self, value: &Scalar, limit: Option<usize>) -> Result<(), CubeError> {
        *self = self.fillna(value, limit)?;
        Ok(())
    }

    /// Fill missing cells from neighboring observations along the major
    /// axis.
    pub fn fillna_method(&self, method: FillMethod) -> Cube {
        let mut out = self.clone();
        out.block
            .fill_forward(Axis::Major.nd(), method == FillMethod::Bfill);
        out
    }

    /// In-place twin of [`Cube::fillna_method`].
    pub fn fillna_method_inplace(&mut self, method: FillMethod) {
        *self = self.fillna_method(method);
    }

    /// Shift values along an axis; vacated cells become missing.
    pub fn shift(&self, periods: isize, axis: Axis) -> Cube {
        let mut out = self.clone();
        if periods == 0 || self.len(axis) == 0 {
            return out;
        }
        out.block = out.block.shift(axis.nd(), periods);
        out.admit_missing();
        out
    }

    /// Fractional change between each cell and the one `periods` steps
    /// earlier along `axis`.
    pub fn pct_change(&self, periods: isize, axis: Axis) -> Result<Cube, CubeError> {
        let shifted = self.shift(periods, axis);
        let block = self
            .block
            .combine_numeric(&shifted.block, |cur, prev| (cur - prev) / prev)?;
        Cube::from_parts(
            self.items.clone(),
            self.major.clone(),
            self.minor.clone(),
            DType::Float64,
            block,
        )
    }

    /// Round numeric cells to `decimals` places.
    pub fn round(&self, decimals: u32) -> Result<Cube, CubeError> {
        let block = self.block.round(decimals)?;
        let mut out = self.clone();
        out.block = block;
        Ok(out)
    }

    /// Reorder the axes: position `d` of the result takes the axis
    /// `perm[d]` of the receiver.
    ///
    /// # Panics
    ///
    /// Panics if `perm` is not a permutation of the three axes.
    pub fn transpose(&self, perm: [Axis; 3]) -> Cube {
        let positions = [perm[0].index(), perm[1].index(), perm[2].index()];
        let mut seen = [false; 3];
        for &p in &positions {
            assert!(!seen[p], "transpose permutation repeats an axis");
            seen[p] = true;
        }
        let pick = |axis: Axis| self.axis_index(axis).clone();
        Cube {
            items: pick(perm[0]),
            major: pick(perm[1]),
            minor: pick(perm[2]),
            dtype: self.dtype,
            block: self.block.transpose(positions),
        }
    }

    /// Exchange two axes.
    pub fn swap_axes(&self, a: Axis, b: Axis) -> Cube {
        let mut perm = Axis::ALL;
        perm.swap(a.index(), b.index());
        self.transpose(perm)
    }
}

fn fmt_axis(f: &mut fmt::Formatter<'_>, name: &str, index: &AxisIndex) -> fmt::Result {
    write!(f, "\n{name}: ")?;
    if index.is_empty() {
        return write!(f, "(empty)");
    }
    for (i, tuple) in index.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        if tuple.len() == 1 {
            write!(f, "{}", tuple[0])?;
        } else {
            write!(f, "(")?;
            for (l, label) in tuple.iter().enumerate() {
                if l > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{label}")?;
            }
            write!(f, ")")?;
        }
    }
    Ok(())
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (i, j, k) = self.shape();
        write!(
            f,
            "Cube(dimensions: {i} items x {j} major x {k} minor, dtype: {})",
            self.dtype
        )?;
        fmt_axis(f, "items", &self.items)?;
        fmt_axis(f, "major_axis", &self.major)?;
        fmt_axis(f, "minor_axis", &self.minor)
    }
}
