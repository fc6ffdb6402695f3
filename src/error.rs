//! Error taxonomy for cube operations.
//!
//! All validation errors are raised before any mutation takes place; a
//! failed operation leaves the receiver untouched.

use crate::axis::Axis;
use crate::value::DType;

/// Errors produced by cube construction, indexing, alignment and merging.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CubeError {
    /// Raw block input was not rank 3.
    #[error("the number of dimensions required is 3, got {got}")]
    Rank { got: usize },

    /// Block shape disagrees with the axis label lengths.
    ///
    /// Both shapes are reported in (items, major, minor) order.
    #[error("shape of passed values is ({}, {}, {}), indices imply ({}, {}, {})",
        passed[0], passed[1], passed[2], implied[0], implied[1], implied[2])]
    ShapeMismatch {
        passed: [usize; 3],
        implied: [usize; 3],
    },

    /// A cross-section assignment carried a value of the wrong shape.
    #[error("shape of value must be ({}, {}), shape of given object was ({}, {})",
        expected.0, expected.1, got.0, got.1)]
    ValueShape {
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// A label was looked up on an axis that does not carry it.
    #[error("label '{label}' not found in {axis} axis")]
    LabelNotFound { label: String, axis: Axis },

    /// The operation requires unique labels but the axis carries duplicates.
    #[error("cannot reindex on the {axis} axis with duplicate labels")]
    DuplicateLabels { axis: Axis },

    /// An axis selector was neither a valid position nor a known alias.
    #[error("no axis named '{name}'")]
    UnknownAxis { name: String },

    /// A value could not be converted to the requested element type.
    #[error("cannot cast '{value}' to {dtype}")]
    Cast { value: String, dtype: DType },

    /// `update` with [`OverlapPolicy::Raise`] found conflicting values.
    ///
    /// [`OverlapPolicy::Raise`]: crate::cube::OverlapPolicy::Raise
    #[error("data overlaps")]
    DataOverlap,

    /// The operation combination is unsupported by design.
    #[error("{0}")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_reports_both_shapes_in_axis_order() {
        let err = CubeError::ShapeMismatch {
            passed: [3, 4, 5],
            implied: [4, 5, 5],
        };
        assert_eq!(
            err.to_string(),
            "shape of passed values is (3, 4, 5), indices imply (4, 5, 5)"
        );
    }

    #[test]
    fn value_shape_reports_expected_then_got() {
        let err = CubeError::ValueShape {
            expected: (3, 2),
            got: (4, 2),
        };
        assert_eq!(
            err.to_string(),
            "shape of value must be (3, 2), shape of given object was (4, 2)"
        );
    }

    #[test]
    fn rank_error_names_required_rank() {
        let err = CubeError::Rank { got: 2 };
        assert!(err.to_string().contains("required is 3"));
    }
}
