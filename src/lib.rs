//! datacube: a labeled three-dimensional array container for Rust.
//!
//! A [`Cube`] generalizes a two-dimensional labeled table to a third axis:
//! it owns three ordered label sets (items, major, minor) and one dense
//! rank-3 block whose shape always matches the axis lengths. On top of
//! that invariant it provides label-based and positional indexing with
//! duplicate-label support, cross-axis alignment, reshaping into a
//! hierarchically-indexed 2-D [`Frame`] and back, and value-merging
//! across overlapping cubes.
//!
//! # Key Types
//!
//! - [`Cube`] - the 3-D container with construction, indexing, alignment,
//!   reshaping and merge semantics
//! - [`Frame`] / [`Series`] - the 2-D and 1-D labeled collaborators
//! - [`AxisIndex`] - ordered, possibly-duplicated, possibly-hierarchical
//!   axis labels
//! - [`DType`] / [`Scalar`] / [`Label`] - the element-type lattice and
//!   value domain
//! - [`CubeError`] - the error taxonomy; every failure is raised before
//!   any mutation
//!
//! # Missing Data
//!
//! Missing cells are `NaN` in numeric storage and `Null` in object
//! storage. Operations that introduce missing cells promote the dtype to
//! the minimal type able to hold them (int → float64, bool → object).

// Re-export approx traits for users who want tolerance comparisons
pub use approx;

pub mod axis;
pub mod block;
pub mod cube;
pub mod error;
pub mod frame;
pub mod index;
pub mod testing;
pub mod value;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// The container and its operation vocabulary
pub use cube::{
    BinOp, Cube, DropPolicy, How, Join, Orient, OverlapPolicy, Selection, Selector,
    UpdateOptions,
};

// Collaborator types
pub use frame::{FillMethod, Frame, Series};

// Axes and labels
pub use axis::{Axis, AxisLike};
pub use index::{panel_index, AxisIndex};

// Value domain
pub use value::{DType, Label, Scalar};

// Errors
pub use error::CubeError;
