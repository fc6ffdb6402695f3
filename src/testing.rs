//! Testing utilities for datacube.
//!
//! Assertion helpers and small data builders shared by unit and
//! integration tests. NaN-aware: two missing cells compare equal, which is
//! what value-level cube comparisons want.

use ndarray::{Array2, Array3};

use crate::cube::Cube;
use crate::frame::{Frame, Series};
use crate::index::AxisIndex;

/// Default tolerance for floating point comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Assertions
// =============================================================================

/// Assert that two cubes are equal by axes and NaN-aware cell values.
///
/// # Panics
///
/// Panics with both cube summaries when they differ.
#[track_caller]
pub fn assert_cube_eq(left: &Cube, right: &Cube) {
    if !left.equals(right) {
        panic!("assertion failed: cubes differ\n  left: {left}\n right: {right}");
    }
}

/// Assert that two frames are equal by axes and NaN-aware cell values.
#[track_caller]
pub fn assert_frame_eq(left: &Frame, right: &Frame) {
    if !left.equals(right) {
        panic!(
            "assertion failed: frames differ\n  left: {:?} {:?}\n right: {:?} {:?}",
            left.dim(),
            left.grid(),
            right.dim(),
            right.grid()
        );
    }
}

/// Assert that two series are equal by index and NaN-aware values.
#[track_caller]
pub fn assert_series_eq(left: &Series, right: &Series) {
    if !left.equals(right) {
        panic!(
            "assertion failed: series differ\n  left: {:?}\n right: {:?}",
            left.values(),
            right.values()
        );
    }
}

/// Assert that two floats differ by at most `tolerance`, NaN equal to NaN.
#[track_caller]
pub fn assert_close(left: f64, right: f64, tolerance: f64) {
    if left.is_nan() && right.is_nan() {
        return;
    }
    let diff = (left - right).abs();
    if !(diff <= tolerance) {
        panic!(
            "assertion failed: `(left ≈ right)`\n  left: `{left:?}`\n right: `{right:?}`\n  diff: `{diff:?}` > tolerance `{tolerance:?}`"
        );
    }
}

// =============================================================================
// Data builders
// =============================================================================

/// Cube over default integer axes holding `0..n` in row-major order.
pub fn sequential_cube(shape: (usize, usize, usize)) -> Cube {
    let n = shape.0 * shape.1 * shape.2;
    let values = Array3::from_shape_vec(shape, (0..n).map(|v| v as f64).collect())
        .expect("shape matches value count");
    Cube::from_array(
        values,
        AxisIndex::range(shape.0),
        AxisIndex::range(shape.1),
        AxisIndex::range(shape.2),
    )
    .expect("axes match the shape")
}

/// Frame over default integer axes holding `0..n` in row-major order.
pub fn sequential_frame(rows: usize, cols: usize) -> Frame {
    let values = Array2::from_shape_vec(
        (rows, cols),
        (0..rows * cols).map(|v| v as f64).collect(),
    )
    .expect("shape matches value count");
    Frame::from_array(values, AxisIndex::range(rows), AxisIndex::range(cols))
        .expect("axes match the shape")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_builders_agree() {
        let cube = sequential_cube((2, 3, 4));
        assert_eq!(cube.shape(), (2, 3, 4));
        let frame = sequential_frame(3, 4);
        assert!(cube.item_at(0).equals(&frame));
    }

    #[test]
    #[should_panic(expected = "cubes differ")]
    fn cube_assertion_panics_on_difference() {
        let a = sequential_cube((1, 1, 1));
        let b = sequential_cube((1, 1, 2));
        assert_cube_eq(&a, &b);
    }

    #[test]
    fn close_assertion_treats_nan_as_equal() {
        assert_close(f64::NAN, f64::NAN, DEFAULT_TOLERANCE);
        assert_close(1.0, 1.0 + 1e-12, DEFAULT_TOLERANCE);
    }
}
