//! One-dimensional labeled vector.

use crate::index::AxisIndex;
use crate::value::{DType, Scalar};

/// Labeled vector of scalars with a declared dtype.
#[derive(Debug, Clone)]
pub struct Series {
    index: AxisIndex,
    dtype: DType,
    values: Vec<Scalar>,
}

impl Series {
    /// Build a series; the index and values must agree in length.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    pub fn new(index: AxisIndex, values: Vec<Scalar>, dtype: DType) -> Self {
        assert_eq!(
            index.len(),
            values.len(),
            "series index length {} does not match {} values",
            index.len(),
            values.len()
        );
        Self {
            index,
            dtype,
            values,
        }
    }

    /// Build a series inferring the minimal dtype from the values.
    pub fn from_values(index: AxisIndex, values: Vec<Scalar>) -> Self {
        let dtype = DType::infer(values.iter());
        Self::new(index, values, dtype)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn index(&self) -> &AxisIndex {
        &self.index
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    #[inline]
    pub fn get(&self, pos: usize) -> &Scalar {
        &self.values[pos]
    }

    /// NaN-aware value equality; the index must match as well.
    pub fn equals(&self, other: &Series) -> bool {
        self.index == other.index
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a.eq_missing(b))
    }
}
