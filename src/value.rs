//! Labels, cell scalars and the element-type lattice.
//!
//! A cube stores cells of one declared [`DType`]. Numeric dtypes (including
//! bool) share dense `f64` storage with `NaN` as the missing sentinel;
//! `Str`/`Object` dtypes store [`Scalar`]s with [`Scalar::Null`] as the
//! sentinel. Promotion follows the minimal-common-type rule: integer/float
//! mixtures promote to float, any non-numeric mixed with numeric promotes
//! to object, and missing data forces a missing-capable dtype.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CubeError;

// =============================================================================
// Label
// =============================================================================

/// An axis label value. Comparable, hashable, displayable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Int(i64),
    Str(String),
}

impl From<i64> for Label {
    fn from(v: i64) -> Self {
        Label::Int(v)
    }
}

impl From<i32> for Label {
    fn from(v: i32) -> Self {
        Label::Int(v as i64)
    }
}

impl From<usize> for Label {
    fn from(v: usize) -> Self {
        Label::Int(v as i64)
    }
}

impl From<&str> for Label {
    fn from(v: &str) -> Self {
        Label::Str(v.to_string())
    }
}

impl From<String> for Label {
    fn from(v: String) -> Self {
        Label::Str(v)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(v) => write!(f, "{v}"),
            Label::Str(v) => f.write_str(v),
        }
    }
}

// =============================================================================
// Scalar
// =============================================================================

/// One cell value.
///
/// `Null` and `Float(NaN)` both count as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Whether this cell counts as missing data.
    #[inline]
    pub fn is_missing(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Truthiness under missing-aware logic. Missing values have none.
    pub fn truthy(&self) -> Option<bool> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(*b),
            Scalar::Int(v) => Some(*v != 0),
            Scalar::Float(v) => {
                if v.is_nan() {
                    None
                } else {
                    Some(*v != 0.0)
                }
            }
            Scalar::Str(s) => Some(!s.is_empty()),
        }
    }

    /// The dtype this scalar naturally carries, for inference.
    ///
    /// Missing cells contribute no dtype of their own; see [`DType::infer`].
    pub(crate) fn natural_dtype(&self) -> Option<DType> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(DType::Bool),
            Scalar::Int(_) => Some(DType::Int64),
            Scalar::Float(v) if v.is_nan() => None,
            Scalar::Float(_) => Some(DType::Float64),
            Scalar::Str(_) => Some(DType::Str),
        }
    }

    /// Convert to the given dtype.
    ///
    /// Fails with [`CubeError::Cast`] when the value cannot represent the
    /// target (string content that does not parse, missing data into an
    /// integer type). No element-by-element recovery is attempted by
    /// callers: the first failure aborts the whole cast.
    pub fn cast(&self, dtype: DType) -> Result<Scalar, CubeError> {
        let fail = || CubeError::Cast {
            value: self.to_string(),
            dtype,
        };
        match dtype {
            DType::Float64 | DType::Float32 => match self {
                Scalar::Null => Ok(Scalar::Float(f64::NAN)),
                Scalar::Bool(b) => Ok(Scalar::Float(if *b { 1.0 } else { 0.0 })),
                Scalar::Int(v) => Ok(Scalar::Float(*v as f64)),
                Scalar::Float(v) => Ok(Scalar::Float(*v)),
                Scalar::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Scalar::Float)
                    .map_err(|_| fail()),
            },
            DType::Int64 | DType::Int32 => match self {
                Scalar::Null => Err(fail()),
                Scalar::Bool(b) => Ok(Scalar::Int(*b as i64)),
                Scalar::Int(v) => Ok(Scalar::Int(*v)),
                Scalar::Float(v) => {
                    if v.is_nan() {
                        Err(fail())
                    } else {
                        Ok(Scalar::Int(*v as i64))
                    }
                }
                Scalar::Str(s) => {
                    let trimmed = s.trim();
                    if let Ok(v) = trimmed.parse::<i64>() {
                        Ok(Scalar::Int(v))
                    } else {
                        trimmed
                            .parse::<f64>()
                            .ok()
                            .filter(|v| v.is_finite())
                            .map(|v| Scalar::Int(v as i64))
                            .ok_or_else(fail)
                    }
                }
            },
            DType::Bool => match self {
                Scalar::Bool(b) => Ok(Scalar::Bool(*b)),
                Scalar::Int(v) => Ok(Scalar::Bool(*v != 0)),
                Scalar::Float(v) if !v.is_nan() => Ok(Scalar::Bool(*v != 0.0)),
                _ => Err(fail()),
            },
            DType::Str => match self {
                Scalar::Null => Ok(Scalar::Null),
                Scalar::Float(v) if v.is_nan() => Ok(Scalar::Null),
                other => Ok(Scalar::Str(other.to_string())),
            },
            DType::Object => Ok(self.clone()),
        }
    }

    /// Storage payload for a numeric-storage dtype.
    ///
    /// Callers cast to the cube dtype first; this only lowers the already
    /// conforming scalar into the shared f64 representation.
    #[inline]
    pub(crate) fn storage_f64(&self) -> f64 {
        match self {
            Scalar::Null => f64::NAN,
            Scalar::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Scalar::Int(v) => *v as f64,
            Scalar::Float(v) => *v,
            Scalar::Str(_) => f64::NAN,
        }
    }

    /// Rehydrate a typed scalar from numeric storage.
    #[inline]
    pub(crate) fn from_storage(value: f64, dtype: DType) -> Scalar {
        if value.is_nan() {
            return match dtype {
                DType::Float64 | DType::Float32 => Scalar::Float(f64::NAN),
                _ => Scalar::Null,
            };
        }
        match dtype {
            DType::Bool => Scalar::Bool(value != 0.0),
            DType::Int64 | DType::Int32 => Scalar::Int(value as i64),
            _ => Scalar::Float(value),
        }
    }

    /// NaN-aware equality: two missing cells compare equal.
    pub fn eq_missing(&self, other: &Scalar) -> bool {
        if self.is_missing() && other.is_missing() {
            return true;
        }
        match (self, other) {
            (Scalar::Int(a), Scalar::Float(b)) | (Scalar::Float(b), Scalar::Int(a)) => {
                *a as f64 == *b
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Str(v) => f.write_str(v),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

// =============================================================================
// DType
// =============================================================================

/// Declared element type of a cube, frame or series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Float64,
    Float32,
    Int64,
    Int32,
    Bool,
    Str,
    Object,
}

impl DType {
    /// Whether values of this dtype live in dense `f64` storage.
    #[inline]
    pub fn is_numeric(self) -> bool {
        !matches!(self, DType::Str | DType::Object)
    }

    /// Whether this dtype can represent missing cells.
    #[inline]
    pub fn supports_missing(self) -> bool {
        matches!(
            self,
            DType::Float64 | DType::Float32 | DType::Str | DType::Object
        )
    }

    /// Minimal common dtype able to hold values of both inputs without loss.
    pub fn promote(self, other: DType) -> DType {
        use DType::*;
        if self == other {
            return self;
        }
        match (self, other) {
            (Object, _) | (_, Object) => Object,
            (Str, _) | (_, Str) => Object,
            (Bool, _) | (_, Bool) => Object,
            (Float64, _) | (_, Float64) => Float64,
            (Float32, Int32) | (Int32, Float32) => Float32,
            (Float32, _) | (_, Float32) => Float64,
            (Int64, Int32) | (Int32, Int64) => Int64,
            _ => Float64,
        }
    }

    /// The dtype this one becomes once a missing cell must be stored.
    pub fn promote_missing(self) -> DType {
        match self {
            DType::Int64 | DType::Int32 => DType::Float64,
            DType::Bool => DType::Object,
            other => other,
        }
    }

    /// Infer the minimal dtype covering every scalar in `values`.
    ///
    /// An all-missing (or empty) input infers `Float64`, the narrowest
    /// missing-capable type.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Scalar>) -> DType {
        let mut acc: Option<DType> = None;
        let mut saw_missing = false;
        for v in values {
            if v.is_missing() {
                saw_missing = true;
                continue;
            }
            let natural = v.natural_dtype().unwrap_or(DType::Object);
            acc = Some(match acc {
                None => natural,
                Some(prev) => prev.promote(natural),
            });
        }
        let base = acc.unwrap_or(DType::Float64);
        if saw_missing {
            base.promote_missing()
        } else {
            base
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DType::Float64 => "float64",
            DType::Float32 => "float32",
            DType::Int64 => "int64",
            DType::Int32 => "int32",
            DType::Bool => "bool",
            DType::Str => "str",
            DType::Object => "object",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_detection() {
        assert!(Scalar::Null.is_missing());
        assert!(Scalar::Float(f64::NAN).is_missing());
        assert!(!Scalar::Float(0.0).is_missing());
        assert!(!Scalar::Str(String::new()).is_missing());
    }

    #[test]
    fn promote_int_float_mixture_is_float() {
        assert_eq!(DType::Int64.promote(DType::Float64), DType::Float64);
        assert_eq!(DType::Int32.promote(DType::Float32), DType::Float32);
        assert_eq!(DType::Int64.promote(DType::Float32), DType::Float64);
    }

    #[test]
    fn promote_nonnumeric_with_numeric_is_object() {
        assert_eq!(DType::Str.promote(DType::Float64), DType::Object);
        assert_eq!(DType::Bool.promote(DType::Int64), DType::Object);
    }

    #[test]
    fn infer_handles_missing() {
        let vals = [Scalar::Int(1), Scalar::Null, Scalar::Int(2)];
        assert_eq!(DType::infer(vals.iter()), DType::Float64);

        let vals = [Scalar::Int(1), Scalar::Int(2)];
        assert_eq!(DType::infer(vals.iter()), DType::Int64);

        let vals = [Scalar::Bool(true), Scalar::Null];
        assert_eq!(DType::infer(vals.iter()), DType::Object);

        let empty: [Scalar; 0] = [];
        assert_eq!(DType::infer(empty.iter()), DType::Float64);
    }

    #[test]
    fn cast_string_to_float_fails_loudly() {
        let err = Scalar::Str("foo".into()).cast(DType::Float64).unwrap_err();
        assert_eq!(
            err,
            CubeError::Cast {
                value: "foo".into(),
                dtype: DType::Float64
            }
        );
        assert_eq!(
            Scalar::Str("1.5".into()).cast(DType::Float64).unwrap(),
            Scalar::Float(1.5)
        );
    }

    #[test]
    fn cast_missing_to_int_fails() {
        assert!(Scalar::Null.cast(DType::Int64).is_err());
        assert!(Scalar::Float(f64::NAN).cast(DType::Int64).is_err());
    }

    #[test]
    fn cast_to_str_keeps_missing_missing() {
        assert_eq!(Scalar::Null.cast(DType::Str).unwrap(), Scalar::Null);
        assert_eq!(
            Scalar::Int(7).cast(DType::Str).unwrap(),
            Scalar::Str("7".into())
        );
    }

    #[test]
    fn eq_missing_treats_nan_as_equal() {
        assert!(Scalar::Null.eq_missing(&Scalar::Float(f64::NAN)));
        assert!(Scalar::Int(2).eq_missing(&Scalar::Float(2.0)));
        assert!(!Scalar::Int(2).eq_missing(&Scalar::Float(2.5)));
    }
}
