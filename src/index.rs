//! Ordered axis label sets.
//!
//! An [`AxisIndex`] is an ordered sequence of labels for one cube
//! dimension. Labels may repeat, and every label-based lookup returns the
//! full list of matching positions rather than an arbitrary first match.
//! Hierarchical axes store fixed-width label tuples with per-level names;
//! flat axes are the one-level special case.

use std::collections::HashMap;

use crate::axis::Axis;
use crate::error::CubeError;
use crate::value::Label;

/// One label entry: a fixed-width tuple of per-level values.
pub type LabelTuple = Vec<Label>;

/// Ordered label set for one axis.
#[derive(Debug, Clone)]
pub struct AxisIndex {
    labels: Vec<LabelTuple>,
    names: Vec<Option<String>>,
    lookup: HashMap<LabelTuple, Vec<usize>>,
}

impl AxisIndex {
    /// Build a flat index from labels.
    pub fn from_labels<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        let tuples: Vec<LabelTuple> = labels.into_iter().map(|l| vec![l.into()]).collect();
        Self::from_tuples(tuples, vec![None])
    }

    /// Build a (possibly hierarchical) index from label tuples.
    ///
    /// # Panics
    ///
    /// Panics if any tuple's width differs from `names.len()`.
    pub fn from_tuples(labels: Vec<LabelTuple>, names: Vec<Option<String>>) -> Self {
        let nlevels = names.len().max(1);
        for tuple in &labels {
            assert_eq!(
                tuple.len(),
                nlevels,
                "label tuple width {} does not match {} levels",
                tuple.len(),
                nlevels
            );
        }
        let names = if names.is_empty() { vec![None] } else { names };
        let mut lookup: HashMap<LabelTuple, Vec<usize>> = HashMap::with_capacity(labels.len());
        for (pos, tuple) in labels.iter().enumerate() {
            lookup.entry(tuple.clone()).or_default().push(pos);
        }
        Self {
            labels,
            names,
            lookup,
        }
    }

    /// Default flat index `0..n`.
    pub fn range(n: usize) -> Self {
        Self::from_labels(0..n as i64)
    }

    /// The empty flat index.
    pub fn empty() -> Self {
        Self::range(0)
    }

    /// Replace the per-level names.
    pub fn with_names(mut self, names: Vec<Option<String>>) -> Self {
        assert_eq!(names.len(), self.nlevels(), "name count must match levels");
        self.names = names;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of label levels (1 for flat axes).
    #[inline]
    pub fn nlevels(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[Option<String>] {
        &self.names
    }

    pub fn labels(&self) -> &[LabelTuple] {
        &self.labels
    }

    pub fn label(&self, pos: usize) -> &LabelTuple {
        &self.labels[pos]
    }

    /// The single label at `pos` for a flat axis.
    pub fn flat_label(&self, pos: usize) -> &Label {
        debug_assert_eq!(self.nlevels(), 1, "flat_label on hierarchical axis");
        &self.labels[pos][0]
    }

    /// Values of one label level, in axis order.
    pub fn level_values(&self, level: usize) -> Vec<Label> {
        self.labels.iter().map(|t| t[level].clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelTuple> {
        self.labels.iter()
    }

    /// Whether any label occurs more than once.
    pub fn has_duplicates(&self) -> bool {
        self.lookup.values().any(|v| v.len() > 1)
    }

    /// All positions carrying the full label tuple. Empty when absent.
    pub fn positions(&self, key: &LabelTuple) -> &[usize] {
        self.lookup.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All positions whose label (flat) or first level (hierarchical)
    /// equals `label`, in axis order.
    pub fn positions_of(&self, label: &Label) -> Vec<usize> {
        if self.nlevels() == 1 {
            let key = vec![label.clone()];
            self.positions(&key).to_vec()
        } else {
            self.labels
                .iter()
                .enumerate()
                .filter(|(_, t)| &t[0] == label)
                .map(|(pos, _)| pos)
                .collect()
        }
    }

    pub fn contains(&self, label: &Label) -> bool {
        !self.positions_of(label).is_empty()
    }

    /// Sub-index at the given positions, duplicates and order preserved.
    pub fn select(&self, positions: &[usize]) -> Self {
        let labels = positions.iter().map(|&p| self.labels[p].clone()).collect();
        Self::from_tuples(labels, self.names.clone())
    }

    /// Drop the first level, keeping only the given positions.
    ///
    /// Used when a partial first-level lookup on a hierarchical axis
    /// produces a sub-axis of the remaining levels.
    pub fn strip_first_level(&self, positions: &[usize]) -> Self {
        debug_assert!(self.nlevels() > 1);
        let labels = positions
            .iter()
            .map(|&p| self.labels[p][1..].to_vec())
            .collect();
        Self::from_tuples(labels, self.names[1..].to_vec())
    }

    /// A copy with one more label at the end.
    ///
    /// # Panics
    ///
    /// Panics if the tuple width does not match the level count.
    pub fn appended(&self, label: LabelTuple) -> Self {
        let mut labels = self.labels.clone();
        labels.push(label);
        Self::from_tuples(labels, self.names.clone())
    }

    /// Union with `other` in first-seen order, duplicates collapsed.
    pub fn union(&self, other: &AxisIndex) -> AxisIndex {
        assert_eq!(
            self.nlevels(),
            other.nlevels(),
            "cannot union indexes with different level counts"
        );
        let mut seen: HashMap<&LabelTuple, ()> = HashMap::new();
        let mut labels: Vec<LabelTuple> = Vec::with_capacity(self.len() + other.len());
        for tuple in self.labels.iter().chain(other.labels.iter()) {
            if seen.insert(tuple, ()).is_none() {
                labels.push(tuple.clone());
            }
        }
        AxisIndex::from_tuples(labels, self.names.clone())
    }

    /// Positions to keep after dropping `targets`.
    ///
    /// Unknown labels fail with [`CubeError::LabelNotFound`] unless
    /// `ignore_missing`; known ones remove every matching position.
    pub fn drop_positions(
        &self,
        targets: &[Label],
        axis: Axis,
        ignore_missing: bool,
    ) -> Result<Vec<usize>, CubeError> {
        let mut dropped = vec![false; self.len()];
        for label in targets {
            let hits = self.positions_of(label);
            if hits.is_empty() {
                if ignore_missing {
                    continue;
                }
                return Err(CubeError::LabelNotFound {
                    label: label.to_string(),
                    axis,
                });
            }
            for pos in hits {
                dropped[pos] = true;
            }
        }
        Ok((0..self.len()).filter(|&p| !dropped[p]).collect())
    }

    /// Reindex indexer: for each target label, the existing position in
    /// `self` or `None` for a new label.
    ///
    /// Reindexing from an axis carrying duplicates is refused; the result
    /// would silently pick one of several matches.
    pub fn indexer_for(
        &self,
        target: &AxisIndex,
        axis: Axis,
    ) -> Result<Vec<Option<usize>>, CubeError> {
        if self.has_duplicates() {
            return Err(CubeError::DuplicateLabels { axis });
        }
        Ok(target
            .labels
            .iter()
            .map(|tuple| self.positions(tuple).first().copied())
            .collect())
    }

    /// Cartesian product in `self`-outer, `other`-inner order; tuples are
    /// the per-level concatenation of both inputs.
    pub fn product(&self, other: &AxisIndex) -> AxisIndex {
        let mut labels = Vec::with_capacity(self.len() * other.len());
        for a in &self.labels {
            for b in &other.labels {
                let mut tuple = a.clone();
                tuple.extend(b.iter().cloned());
                labels.push(tuple);
            }
        }
        let mut names = self.names.clone();
        names.extend(other.names.iter().cloned());
        AxisIndex::from_tuples(labels, names)
    }

    /// First-seen unique values of one level, in axis order.
    pub fn level_uniques(&self, level: usize) -> Vec<Label> {
        let mut seen: HashMap<&Label, ()> = HashMap::new();
        let mut out = Vec::new();
        for tuple in &self.labels {
            let v = &tuple[level];
            if seen.insert(v, ()).is_none() {
                out.push(v.clone());
            }
        }
        out
    }
}

impl PartialEq for AxisIndex {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels && self.names == other.names
    }
}

/// Two-level index pairing every panel label with every time label, time
/// cycling fastest, with the conventional ("time", "panel") level names.
pub fn panel_index(time: &[Label], panels: &[Label]) -> AxisIndex {
    let mut labels = Vec::with_capacity(time.len() * panels.len());
    for p in panels {
        for t in time {
            labels.push(vec![t.clone(), p.clone()]);
        }
    }
    AxisIndex::from_tuples(
        labels,
        vec![Some("time".to_string()), Some("panel".to_string())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(labels: &[&str]) -> AxisIndex {
        AxisIndex::from_labels(labels.iter().copied())
    }

    #[test]
    fn duplicate_lookup_returns_all_positions() {
        let idx = flat(&["A", "A", "C", "D", "E"]);
        assert!(idx.has_duplicates());
        assert_eq!(idx.positions_of(&"A".into()), vec![0, 1]);
        assert_eq!(idx.positions_of(&"E".into()), vec![4]);
        assert!(idx.positions_of(&"Z".into()).is_empty());
    }

    #[test]
    fn union_is_first_seen_order() {
        let a = flat(&["b", "a"]);
        let b = flat(&["a", "c"]);
        let u = a.union(&b);
        assert_eq!(
            u.labels(),
            &[
                vec![Label::from("b")],
                vec![Label::from("a")],
                vec![Label::from("c")]
            ]
        );
    }

    #[test]
    fn indexer_marks_new_labels_none() {
        let a = flat(&["x", "y"]);
        let target = flat(&["y", "z", "x"]);
        let indexer = a.indexer_for(&target, Axis::Major).unwrap();
        assert_eq!(indexer, vec![Some(1), None, Some(0)]);
    }

    #[test]
    fn indexer_refuses_duplicate_source() {
        let a = flat(&["x", "x"]);
        let target = flat(&["x", "y"]);
        let err = a.indexer_for(&target, Axis::Minor).unwrap_err();
        assert_eq!(err, CubeError::DuplicateLabels { axis: Axis::Minor });
    }

    #[test]
    fn drop_positions_respects_ignore_mode() {
        let idx = flat(&["a", "b", "c"]);
        let err = idx
            .drop_positions(&["z".into()], Axis::Items, false)
            .unwrap_err();
        assert!(matches!(err, CubeError::LabelNotFound { .. }));

        let kept = idx
            .drop_positions(&["z".into(), "b".into()], Axis::Items, true)
            .unwrap();
        assert_eq!(kept, vec![0, 2]);
    }

    #[test]
    fn product_nests_inner_fastest() {
        let major = flat(&["m1", "m2"]);
        let minor = flat(&["x", "y"]);
        let prod = major.product(&minor);
        assert_eq!(prod.len(), 4);
        assert_eq!(prod.nlevels(), 2);
        assert_eq!(prod.label(0), &vec!["m1".into(), "x".into()]);
        assert_eq!(prod.label(1), &vec!["m1".into(), "y".into()]);
        assert_eq!(prod.label(2), &vec!["m2".into(), "x".into()]);
    }

    #[test]
    fn panel_index_tiles_time_and_repeats_panels() {
        let time: Vec<Label> = vec![1.into(), 2.into(), 3.into(), 4.into()];
        let panels: Vec<Label> = vec![1.into(), 2.into(), 3.into()];
        let idx = panel_index(&time, &panels);
        assert_eq!(idx.len(), 12);
        assert_eq!(idx.label(0), &vec![Label::Int(1), Label::Int(1)]);
        assert_eq!(idx.label(3), &vec![Label::Int(4), Label::Int(1)]);
        assert_eq!(idx.label(4), &vec![Label::Int(1), Label::Int(2)]);
        assert_eq!(
            idx.names(),
            &[Some("time".to_string()), Some("panel".to_string())]
        );
    }

    #[test]
    fn partial_first_level_lookup_on_hierarchical_axis() {
        let idx = AxisIndex::from_tuples(
            vec![
                vec!["a".into(), 1.into()],
                vec!["a".into(), 2.into()],
                vec!["b".into(), 1.into()],
            ],
            vec![Some("first".into()), Some("second".into())],
        );
        assert_eq!(idx.positions_of(&"a".into()), vec![0, 1]);
        let stripped = idx.strip_first_level(&[0, 1]);
        assert_eq!(stripped.nlevels(), 1);
        assert_eq!(stripped.flat_label(0), &Label::Int(1));
        assert_eq!(stripped.flat_label(1), &Label::Int(2));
    }
}
