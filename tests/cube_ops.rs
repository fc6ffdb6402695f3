//! Elementwise operations: percent change, rounding, arithmetic, shifts.

mod common;

use common::*;
use datacube::{Axis, AxisIndex, BinOp, Cube, CubeError, Frame, Orient, Scalar};
use ndarray::{arr2, Array3};

fn three_item_cube() -> Cube {
    // i1, i2 = i1 + 1, i3 distinct
    let df1 = Frame::from_array(
        arr2(&[[1.0, 3.0], [2.0, 4.0], [5.0, 6.0]]),
        AxisIndex::range(3),
        AxisIndex::from_labels(["c1", "c2"]),
    )
    .unwrap();
    let df2 = Frame::from_array(
        arr2(&[[2.0, 4.0], [3.0, 5.0], [6.0, 7.0]]),
        AxisIndex::range(3),
        AxisIndex::from_labels(["c1", "c2"]),
    )
    .unwrap();
    let df3 = Frame::from_array(
        arr2(&[[3.0, 5.0], [4.0, 6.0], [7.0, 8.0]]),
        AxisIndex::range(3),
        AxisIndex::from_labels(["c1", "c2"]),
    )
    .unwrap();
    Cube::from_frames(
        vec![("i1".into(), df1), ("i2".into(), df2), ("i3".into(), df3)],
        Orient::Items,
    )
    .unwrap()
}

#[test]
fn pct_change_along_major_matches_per_item_frames() {
    let cube = three_item_cube();
    for periods in [1isize, 2] {
        let changed = cube.pct_change(periods, Axis::Major).unwrap();
        for pos in 0..3 {
            let expected = cube.item_at(pos).pct_change(periods, 0).unwrap();
            assert_frame_eq(&changed.item_at(pos), &expected);
        }
    }
}

#[test]
fn pct_change_along_minor_matches_per_item_frames() {
    let cube = three_item_cube();
    for periods in [1isize, 2] {
        let changed = cube.pct_change(periods, Axis::Minor).unwrap();
        for pos in 0..3 {
            let expected = cube.item_at(pos).pct_change(periods, 1).unwrap();
            assert_frame_eq(&changed.item_at(pos), &expected);
        }
    }
}

#[test]
fn pct_change_along_items_matches_cross_sections() {
    let cube = three_item_cube();
    for periods in [1isize, 2] {
        let changed = cube.pct_change(periods, Axis::Items).unwrap();
        for pos in 0..3 {
            // major cross-sections have items down the rows
            let expected = cube.major_at(pos).pct_change(periods, 0).unwrap();
            assert_frame_eq(&changed.major_at(pos), &expected);
        }
    }
}

#[test]
fn pct_change_along_items_exact_values() {
    let cube = three_item_cube();
    let changed = cube.pct_change(1, Axis::Items).unwrap();

    // i1 has nothing before it
    let i1 = changed.item_at(0);
    for r in 0..3 {
        for c in 0..2 {
            assert!(i1.get(r, c).is_missing());
        }
    }
    // i2 against i1: (df1 + 1 - df1) / df1
    let i2 = changed.item_at(1);
    assert_eq!(i2.get(0, 0), Scalar::Float(1.0));
    assert_eq!(i2.get(1, 0), Scalar::Float(0.5));
    assert_eq!(i2.get(2, 0), Scalar::Float(0.2));
    assert_eq!(i2.get(0, 1), Scalar::Float(1.0 / 3.0));
    assert_eq!(i2.get(1, 1), Scalar::Float(0.25));
    assert_eq!(i2.get(2, 1), Scalar::Float(1.0 / 6.0));
}

#[test]
fn shift_matches_per_item_frame_shift() {
    let cube = random_cube((3, 5, 4), 67);
    for periods in [1isize, -2] {
        let shifted = cube.shift(periods, Axis::Major);
        for pos in 0..3 {
            assert_frame_eq(&shifted.item_at(pos), &cube.item_at(pos).shift(periods, 0));
        }
        let shifted = cube.shift(periods, Axis::Minor);
        for pos in 0..3 {
            assert_frame_eq(&shifted.item_at(pos), &cube.item_at(pos).shift(periods, 1));
        }
    }
}

#[test]
fn round_halves_away_from_zero() {
    let values: Vec<f64> = vec![
        -3.2, 2.2, 0.0, -4.8213, 3.123, 123.12, -1566.213, 88.88, -12.0, 94.5,
        -5.82, 3.5, 6.21, -73.272, -9.087, 23.12, 272.212, -99.99, 23.0, -76.5,
    ];
    let expected: Vec<f64> = values.iter().map(|v| v.round()).collect();
    let cube = Cube::from_array(
        Array3::from_shape_vec((2, 5, 2), values).unwrap(),
        AxisIndex::from_labels(["Item1", "Item2"]),
        AxisIndex::range(5),
        AxisIndex::from_labels(["A", "B"]),
    )
    .unwrap();
    let expected = Cube::from_array(
        Array3::from_shape_vec((2, 5, 2), expected).unwrap(),
        AxisIndex::from_labels(["Item1", "Item2"]),
        AxisIndex::range(5),
        AxisIndex::from_labels(["A", "B"]),
    )
    .unwrap();
    assert_cube_eq(&cube.round(0).unwrap(), &expected);

    let decimals = cube.round(2).unwrap();
    assert_eq!(decimals.value_at([0, 1, 1]), Scalar::Float(-4.82));
    assert_eq!(decimals.value_at([1, 1, 1]), Scalar::Float(-73.27));
}

#[test]
fn arithmetic_against_a_frame_is_refused_for_every_op_and_axis() {
    let cube = three_item_cube();
    let operand = cube.sum(Axis::Major).unwrap();
    for op in [BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div] {
        for axis in Axis::ALL {
            let err = cube.combine_frame(&operand, axis, op).unwrap_err();
            assert!(matches!(err, CubeError::Unsupported(_)));
        }
    }
}

#[test]
fn cube_arithmetic_aligns_on_the_union() {
    let a = random_cube((2, 3, 3), 71);
    let sum = a.add(&a).unwrap();
    let doubled = a.combine_scalar(2.0, BinOp::Mul).unwrap();
    assert_cube_eq(&sum, &doubled);

    let b = a.drop(&[0i64.into()], Axis::Items, datacube::DropPolicy::Raise).unwrap();
    let partial = a.add(&b).unwrap();
    assert_eq!(partial.shape(), a.shape());
    // the dropped item exists on one side only: missing everywhere
    assert!(partial.item_at(0).grid().has_missing());
    assert!(partial.item_at(0).is_missing(0, 0));
    assert_frame_eq(&partial.item_at(1), &doubled.item_at(1));
}

#[test]
fn truthiness_reduction_over_non_missing_cells() {
    let frame = Frame::from_scalars(
        arr2(&[[Scalar::Int(1)], [Scalar::Int(2)]]),
        AxisIndex::range(2),
        AxisIndex::from_labels(["b"]),
        None,
    )
    .unwrap();
    let cube = Cube::from_frames(vec![("A".into(), frame)], Orient::Items).unwrap();
    assert!(cube.all());

    let mut with_zero = cube.clone();
    with_zero.set_value_at([0, 0, 0], &Scalar::Int(0)).unwrap();
    assert!(!with_zero.all());
}

#[test]
fn display_renders_the_empty_cube() {
    let repr = Cube::empty().to_string();
    assert!(repr.contains("0 items x 0 major x 0 minor"));
    assert!(repr.contains("(empty)"));

    let repr = three_item_cube().to_string();
    assert!(repr.contains("3 items x 3 major x 2 minor"));
    assert!(repr.contains("i1, i2, i3"));
}
