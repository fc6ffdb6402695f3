//! Shared helpers for integration tests.
//!
//! For assertion helpers, use `datacube::testing`.

#![allow(dead_code)]

use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Re-export testing utilities for convenience
#[allow(unused_imports)]
pub use datacube::testing::{
    assert_close, assert_cube_eq, assert_frame_eq, assert_series_eq, sequential_cube,
    sequential_frame, DEFAULT_TOLERANCE,
};

use datacube::{AxisIndex, Cube, Frame};

/// Deterministic RNG so failures reproduce.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random values in a (items, major, minor) block over default axes.
pub fn random_cube(shape: (usize, usize, usize), seed: u64) -> Cube {
    let mut rng = rng(seed);
    let n = shape.0 * shape.1 * shape.2;
    let values: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() - 0.5).collect();
    Cube::from_array(
        Array3::from_shape_vec(shape, values).unwrap(),
        AxisIndex::range(shape.0),
        AxisIndex::range(shape.1),
        AxisIndex::range(shape.2),
    )
    .unwrap()
}

/// Random frame over default axes.
pub fn random_frame(rows: usize, cols: usize, seed: u64) -> Frame {
    let mut rng = rng(seed);
    let values: Vec<f64> = (0..rows * cols).map(|_| rng.gen::<f64>() - 0.5).collect();
    Frame::from_array(
        Array2::from_shape_vec((rows, cols), values).unwrap(),
        AxisIndex::range(rows),
        AxisIndex::range(cols),
    )
    .unwrap()
}
