//! Merging one cube's values into another.
//!
//! `update` aligns the incoming cube onto the receiver's axes (left join:
//! incoming-only labels are discarded, receiver-only labels see no data)
//! and then resolves each overlapping cell by the overwrite rule, an
//! optional filter over the receiver's existing values, and the overlap
//! policy. All validation happens before the first write.

use bon::Builder;

use crate::error::CubeError;
use crate::frame::Frame;
use crate::value::{Label, Scalar};

use super::{Cube, Orient};

/// How two label sets combine during a merge.
///
/// Only [`Join::Left`] is supported; the other strategies exist to make
/// the refusal explicit rather than a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    Left,
    Right,
    Inner,
    Outer,
}

/// What to do when both sides hold a non-missing value for the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Resolve by the overwrite rule.
    Ignore,
    /// Fail with [`CubeError::DataOverlap`] if the values differ, before
    /// any cell is written.
    Raise,
}

/// Options for [`Cube::update`].
#[derive(Debug, Clone, Copy, Builder)]
pub struct UpdateOptions {
    #[builder(default = Join::Left)]
    pub join: Join,
    /// With `true`, the receiver's cell is replaced wherever the incoming
    /// cell is not missing; with `false`, only receiver-missing cells are
    /// filled.
    #[builder(default = true)]
    pub overwrite: bool,
    #[builder(default = OverlapPolicy::Ignore)]
    pub errors: OverlapPolicy,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Cube {
    /// Merge `other`'s values into the receiver.
    pub fn update(&mut self, other: &Cube, options: &UpdateOptions) -> Result<(), CubeError> {
        self.update_impl(other, options, None)
    }

    /// [`Cube::update`] with a predicate over the receiver's existing
    /// values: positions where it returns `false` are left untouched, in
    /// addition to the overwrite rule.
    pub fn update_filtered(
        &mut self,
        other: &Cube,
        options: &UpdateOptions,
        filter: impl Fn(&Scalar) -> bool,
    ) -> Result<(), CubeError> {
        self.update_impl(other, options, Some(&filter))
    }

    /// Merge from a mapping of item label → frame, lifted into a cube by
    /// the usual axis-union rule first.
    pub fn update_frames(
        &mut self,
        entries: Vec<(Label, Frame)>,
        options: &UpdateOptions,
    ) -> Result<(), CubeError> {
        let other = Cube::from_frames(entries, Orient::Items)?;
        self.update(&other, options)
    }

    fn update_impl(
        &mut self,
        other: &Cube,
        options: &UpdateOptions,
        filter: Option<&dyn Fn(&Scalar) -> bool>,
    ) -> Result<(), CubeError> {
        if options.join != Join::Left {
            return Err(CubeError::Unsupported("only left join is supported"));
        }

        let aligned = other.reindex(
            Some(&self.items),
            Some(&self.major),
            Some(&self.minor),
            true,
        )?;
        let (n_items, n_major, n_minor) = self.shape();

        if options.errors == OverlapPolicy::Raise {
            for i in 0..n_items {
                for j in 0..n_major {
                    for k in 0..n_minor {
                        let existing = self.value_at([i, j, k]);
                        let incoming = aligned.value_at([i, j, k]);
                        if !existing.is_missing()
                            && !incoming.is_missing()
                            && !existing.eq_missing(&incoming)
                        {
                            return Err(CubeError::DataOverlap);
                        }
                    }
                }
            }
        }

        for i in 0..n_items {
            for j in 0..n_major {
                for k in 0..n_minor {
                    let incoming = aligned.value_at([i, j, k]);
                    if incoming.is_missing() {
                        continue;
                    }
                    let existing = self.value_at([i, j, k]);
                    if !options.overwrite && !existing.is_missing() {
                        continue;
                    }
                    if let Some(f) = filter {
                        if !f(&existing) {
                            continue;
                        }
                    }
                    self.set_value_at([i, j, k], &incoming)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::AxisIndex;
    use ndarray::Array3;

    const N: f64 = f64::NAN;

    /// Two items, four major rows, every row [1.5, NaN, 3.0].
    fn receiver() -> Cube {
        let row = [1.5, N, 3.0];
        let data: Vec<f64> = row.iter().cycle().take(24).copied().collect();
        Cube::from_array(
            Array3::from_shape_vec((2, 4, 3), data).unwrap(),
            AxisIndex::range(2),
            AxisIndex::range(4),
            AxisIndex::range(3),
        )
        .unwrap()
    }

    /// One item labeled 1, two major rows.
    fn incoming() -> Cube {
        Cube::from_array(
            Array3::from_shape_vec((1, 2, 3), vec![3.6, 2.0, N, N, N, 7.0]).unwrap(),
            AxisIndex::from_labels([1i64]),
            AxisIndex::range(2),
            AxisIndex::range(3),
        )
        .unwrap()
    }

    fn expect(rows: [[f64; 3]; 8]) -> Cube {
        let data: Vec<f64> = rows.iter().flatten().copied().collect();
        Cube::from_array(
            Array3::from_shape_vec((2, 4, 3), data).unwrap(),
            AxisIndex::range(2),
            AxisIndex::range(4),
            AxisIndex::range(3),
        )
        .unwrap()
    }

    #[test]
    fn overwrite_replaces_only_non_missing_incoming_cells() {
        let mut pan = receiver();
        pan.update(&incoming(), &UpdateOptions::default()).unwrap();
        let expected = expect([
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [3.6, 2.0, 3.0],
            [1.5, N, 7.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
        ]);
        assert!(pan.equals(&expected));
    }

    #[test]
    fn no_overwrite_fills_only_receiver_missing_cells() {
        let mut pan = receiver();
        let options = UpdateOptions::builder().overwrite(false).build();
        pan.update(&incoming(), &options).unwrap();
        let expected = expect([
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, 2.0, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
        ]);
        assert!(pan.equals(&expected));
    }

    #[test]
    fn filter_masks_positions_by_existing_value() {
        let mut pan = receiver();
        pan.update_filtered(&incoming(), &UpdateOptions::default(), |v| {
            v.truthy().is_some() && v.storage_f64() > 2.0
        })
        .unwrap();
        let expected = expect([
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
            [1.5, N, 7.0],
            [1.5, N, 3.0],
            [1.5, N, 3.0],
        ]);
        assert!(pan.equals(&expected));
    }

    #[test]
    fn update_from_frames_lifts_the_mapping_first() {
        let one = Frame::from_array(
            ndarray::Array2::from_shape_vec(
                (4, 3),
                [1.5, N, 3.0].iter().cycle().take(12).copied().collect(),
            )
            .unwrap(),
            AxisIndex::range(4),
            AxisIndex::range(3),
        )
        .unwrap();
        let mut pan = Cube::from_frames(
            vec![("one".into(), one.clone()), ("two".into(), one)],
            Orient::Items,
        )
        .unwrap();

        let patch = Frame::from_array(
            ndarray::Array2::from_shape_vec((2, 3), vec![3.6, 2.0, N, N, N, 7.0]).unwrap(),
            AxisIndex::range(2),
            AxisIndex::range(3),
        )
        .unwrap();
        pan.update_frames(vec![("two".into(), patch)], &UpdateOptions::default())
            .unwrap();

        let two = pan.get(&"two".into()).unwrap().unwrap_frame();
        assert_eq!(two.get(0, 0), Scalar::Float(3.6));
        assert_eq!(two.get(0, 1), Scalar::Float(2.0));
        assert_eq!(two.get(0, 2), Scalar::Float(3.0));
        assert_eq!(two.get(1, 2), Scalar::Float(7.0));
        assert_eq!(two.get(1, 0), Scalar::Float(1.5));
        let one = pan.get(&"one".into()).unwrap().unwrap_frame();
        assert_eq!(one.get(0, 0), Scalar::Float(1.5));
        assert!(one.get(0, 1).is_missing());
    }

    #[test]
    fn non_left_joins_are_refused() {
        let mut pan = receiver();
        for join in [Join::Right, Join::Inner, Join::Outer] {
            let options = UpdateOptions::builder().join(join).build();
            let err = pan.update(&incoming(), &options).unwrap_err();
            assert_eq!(
                err,
                CubeError::Unsupported("only left join is supported")
            );
        }
    }

    #[test]
    fn raise_on_conflict_is_atomic() {
        let mut pan = receiver();
        let original = pan.clone();
        let mut conflicting = receiver();
        conflicting.set_value_at([0, 0, 0], &Scalar::Float(99.0)).unwrap();

        let options = UpdateOptions::builder().errors(OverlapPolicy::Raise).build();
        let err = pan.update(&conflicting, &options).unwrap_err();
        assert_eq!(err, CubeError::DataOverlap);
        assert!(pan.equals(&original));
    }

    #[test]
    fn raise_tolerates_equal_overlap() {
        let mut pan = receiver();
        let options = UpdateOptions::builder().errors(OverlapPolicy::Raise).build();
        pan.update(&receiver(), &options).unwrap();
        assert!(pan.equals(&receiver()));
    }
}
