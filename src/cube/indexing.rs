//! Key resolution and label/positional access.
//!
//! The indexer mediates every read and write. Positional access addresses
//! axes by integer regardless of labels; label access on an axis carrying
//! the requested label more than once returns *all* matching positions as
//! a sub-cube, never an arbitrary single match. Assignment aligns the
//! incoming frame onto the cube's axes before writing into the single
//! backing block.

use ndarray::Array2;

use crate::axis::Axis;
use crate::block::{Block, Grid};
use crate::error::CubeError;
use crate::frame::Frame;
use crate::index::AxisIndex;
use crate::value::{DType, Label, Scalar};

use super::Cube;

/// A per-axis key: everything the indexer resolves against an axis.
#[derive(Debug, Clone)]
pub enum Selector {
    /// The whole axis.
    All,
    /// A single position.
    At(usize),
    /// Explicit positions, order and duplicates preserved.
    Positions(Vec<usize>),
    /// A single label; expands to every position carrying it.
    Label(Label),
    /// Several labels; each expands to every position carrying it.
    Labels(Vec<Label>),
    /// Boolean mask, one entry per axis position.
    Mask(Vec<bool>),
}

impl Selector {
    /// Concrete positions on `index`.
    ///
    /// # Panics
    ///
    /// Panics on out-of-range positions or a mask of the wrong length;
    /// unknown labels fail with [`CubeError::LabelNotFound`].
    pub(crate) fn resolve(&self, index: &AxisIndex, axis: Axis) -> Result<Vec<usize>, CubeError> {
        match self {
            Selector::All => Ok((0..index.len()).collect()),
            Selector::At(pos) => {
                assert!(*pos < index.len(), "position {pos} out of bounds");
                Ok(vec![*pos])
            }
            Selector::Positions(positions) => {
                for &pos in positions {
                    assert!(pos < index.len(), "position {pos} out of bounds");
                }
                Ok(positions.clone())
            }
            Selector::Label(label) => {
                let hits = index.positions_of(label);
                if hits.is_empty() {
                    return Err(CubeError::LabelNotFound {
                        label: label.to_string(),
                        axis,
                    });
                }
                Ok(hits)
            }
            Selector::Labels(labels) => {
                let mut out = Vec::with_capacity(labels.len());
                for label in labels {
                    let hits = index.positions_of(label);
                    if hits.is_empty() {
                        return Err(CubeError::LabelNotFound {
                            label: label.to_string(),
                            axis,
                        });
                    }
                    out.extend(hits);
                }
                Ok(out)
            }
            Selector::Mask(mask) => {
                assert_eq!(
                    mask.len(),
                    index.len(),
                    "mask length {} does not match axis length {}",
                    mask.len(),
                    index.len()
                );
                Ok(mask
                    .iter()
                    .enumerate()
                    .filter_map(|(pos, &keep)| keep.then_some(pos))
                    .collect())
            }
        }
    }
}

/// Result of a label lookup: a single slice, or a sub-cube when the label
/// is duplicated (or hierarchical and partially matched).
#[derive(Debug, Clone)]
pub enum Selection {
    Frame(Frame),
    Cube(Cube),
}

impl Selection {
    pub fn unwrap_frame(self) -> Frame {
        match self {
            Selection::Frame(frame) => frame,
            Selection::Cube(_) => panic!("selection is a sub-cube, not a frame"),
        }
    }

    pub fn unwrap_cube(self) -> Cube {
        match self {
            Selection::Cube(cube) => cube,
            Selection::Frame(_) => panic!("selection is a frame, not a sub-cube"),
        }
    }
}

impl Cube {
    /// Row/column axes of a slab along `axis` (spec-fixed orientations:
    /// item slabs are major × minor, major slabs items × minor, minor
    /// slabs items × major).
    fn slab_axes(&self, axis: Axis) -> (&AxisIndex, &AxisIndex) {
        match axis {
            Axis::Items => (&self.major, &self.minor),
            Axis::Major => (&self.items, &self.minor),
            Axis::Minor => (&self.items, &self.major),
        }
    }

    /// The slab at `pos` along `axis`, copied into a frame.
    pub fn frame_at(&self, axis: Axis, pos: usize) -> Frame {
        let (rows, cols) = self.slab_axes(axis);
        Frame::new(
            self.block.grid_at(axis.nd(), pos),
            rows.clone(),
            cols.clone(),
            self.dtype,
        )
        .expect("slab shape matches the cube axes")
    }

    /// Item slice by position: rows = major, columns = minor.
    pub fn item_at(&self, pos: usize) -> Frame {
        self.frame_at(Axis::Items, pos)
    }

    /// Major cross-section by position: rows = items, columns = minor.
    pub fn major_at(&self, pos: usize) -> Frame {
        self.frame_at(Axis::Major, pos)
    }

    /// Minor cross-section by position: rows = items, columns = major.
    pub fn minor_at(&self, pos: usize) -> Frame {
        self.frame_at(Axis::Minor, pos)
    }

    /// Typed cell read by position triple.
    pub fn value_at(&self, idx: [usize; 3]) -> Scalar {
        self.block.get(idx, self.dtype)
    }

    /// Cell write by position triple.
    ///
    /// A value the current dtype cannot hold promotes the cube (missing
    /// into an int cube → float64, a string into a numeric cube → object)
    /// rather than failing.
    pub fn set_value_at(&mut self, idx: [usize; 3], value: &Scalar) -> Result<(), CubeError> {
        match value.cast(self.dtype) {
            Ok(cast) => {
                self.block.set_cast(idx, cast);
                Ok(())
            }
            Err(_) => {
                let target = match value.natural_dtype() {
                    Some(d) => self.dtype.promote(d),
                    None => self.dtype.promote_missing(),
                };
                if target.is_numeric() != self.dtype.is_numeric() {
                    self.block = self.block.to_object(self.dtype);
                }
                self.dtype = target;
                self.block.set(idx, value, target)
            }
        }
    }

    /// Label lookup along any axis.
    ///
    /// A unique label yields the oriented slab as a frame. A duplicated
    /// label yields a sub-cube holding every matching position with the
    /// duplicate labels preserved. On a hierarchical axis a first-level
    /// key yields a sub-cube with that level stripped.
    pub fn xs(&self, axis: Axis, label: &Label) -> Result<Selection, CubeError> {
        let index = self.axis_index(axis);
        let hits = index.positions_of(label);
        if hits.is_empty() {
            return Err(CubeError::LabelNotFound {
                label: label.to_string(),
                axis,
            });
        }
        if index.nlevels() > 1 {
            let mut out = self.select_positions(axis, &hits);
            let stripped = index.strip_first_level(&hits);
            match axis {
                Axis::Items => out.items = stripped,
                Axis::Major => out.major = stripped,
                Axis::Minor => out.minor = stripped,
            }
            return Ok(Selection::Cube(out));
        }
        if hits.len() == 1 {
            Ok(Selection::Frame(self.frame_at(axis, hits[0])))
        } else {
            Ok(Selection::Cube(self.select_positions(axis, &hits)))
        }
    }

    /// Item lookup: `xs` along the items axis.
    pub fn get(&self, label: &Label) -> Result<Selection, CubeError> {
        self.xs(Axis::Items, label)
    }

    /// Sub-cube selection along one axis.
    pub fn select(&self, axis: Axis, selector: &Selector) -> Result<Cube, CubeError> {
        let positions = selector.resolve(self.axis_index(axis), axis)?;
        Ok(self.select_positions(axis, &positions))
    }

    /// Promote the cube dtype to cover `incoming`, converting storage when
    /// the promotion leaves the numeric domain.
    pub(crate) fn reconcile_dtype(&mut self, incoming: DType) {
        let target = self.dtype.promote(incoming);
        if target == self.dtype {
            return;
        }
        if target.is_numeric() != self.dtype.is_numeric() {
            self.block = self.block.to_object(self.dtype);
        }
        self.dtype = target;
    }

    /// A grid in the cube's storage kind carrying `frame`'s values.
    fn conform_grid(&self, frame: &Frame) -> Grid {
        match &self.block {
            Block::Numeric(_) => frame.grid().clone(),
            Block::Object(_) => frame.grid().to_object(frame.dtype()),
        }
    }

    /// Assign a frame as the cross-section `label` along `axis`.
    ///
    /// The frame is first aligned (reindexed) onto the slab axes, so a
    /// value with reordered or partial labels lands correctly. An existing
    /// label is written through every position carrying it; a new label
    /// appends one slab at the end of the axis.
    pub fn set_xs(&mut self, axis: Axis, label: &Label, value: &Frame) -> Result<(), CubeError> {
        let (rows, cols) = self.slab_axes(axis);
        let aligned = if value.index() == rows && value.columns() == cols {
            value.clone()
        } else {
            let (rows, cols) = (rows.clone(), cols.clone());
            value.reindex(Some(&rows), Some(&cols))?
        };
        self.reconcile_dtype(aligned.dtype());
        let grid = self.conform_grid(&aligned);

        let hits = self.axis_index(axis).positions_of(label);
        if hits.is_empty() {
            self.block = self.block.append(axis.nd(), &grid);
            let appended = self.axis_index(axis).appended(vec![label.clone()]);
            match axis {
                Axis::Items => self.items = appended,
                Axis::Major => self.major = appended,
                Axis::Minor => self.minor = appended,
            }
        } else {
            for pos in hits {
                self.block.set_grid(axis.nd(), pos, &grid);
            }
        }
        Ok(())
    }

    /// Assign an item slice, aligning the frame onto (major, minor).
    pub fn set_item(&mut self, label: &Label, value: &Frame) -> Result<(), CubeError> {
        self.set_xs(Axis::Items, label, value)
    }

    /// Assign a major cross-section, aligning the frame onto (items, minor).
    pub fn set_major(&mut self, label: &Label, value: &Frame) -> Result<(), CubeError> {
        self.set_xs(Axis::Major, label, value)
    }

    /// Assign a minor cross-section, aligning the frame onto (items, major).
    pub fn set_minor(&mut self, label: &Label, value: &Frame) -> Result<(), CubeError> {
        self.set_xs(Axis::Minor, label, value)
    }

    /// Assign raw values as the item slice `label`, without alignment.
    ///
    /// The array must match the (major, minor) cross-section shape
    /// exactly; a mismatch reports both shapes.
    pub fn set_item_values(
        &mut self,
        label: &Label,
        values: Array2<f64>,
    ) -> Result<(), CubeError> {
        let expected = (self.major.len(), self.minor.len());
        if values.dim() != expected {
            return Err(CubeError::ValueShape {
                expected,
                got: values.dim(),
            });
        }
        let frame = Frame::from_array(values, self.major.clone(), self.minor.clone())?;
        self.set_xs(Axis::Items, label, &frame)
    }

    /// Write one cell per (item, major, minor) label combination.
    ///
    /// Each key must be present on its axis; duplicated labels write all
    /// matching coordinates.
    pub fn set_at(
        &mut self,
        item: &Label,
        major: &Label,
        minor: &Label,
        value: &Scalar,
    ) -> Result<(), CubeError> {
        let keys = [(Axis::Items, item), (Axis::Major, major), (Axis::Minor, minor)];
        let mut resolved: Vec<Vec<usize>> = Vec::with_capacity(3);
        for (axis, label) in keys {
            let hits = self.axis_index(axis).positions_of(label);
            if hits.is_empty() {
                return Err(CubeError::LabelNotFound {
                    label: label.to_string(),
                    axis,
                });
            }
            resolved.push(hits);
        }
        for &i in &resolved[0] {
            for &j in &resolved[1] {
                for &k in &resolved[2] {
                    self.set_value_at([i, j, k], value)?;
                }
            }
        }
        Ok(())
    }
}
