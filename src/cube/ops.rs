//! Aligned elementwise arithmetic.
//!
//! Two cubes combine over the union of their axes; cells present on only
//! one side propagate missing. Arithmetic against a lower-rank aligned
//! operand (a frame along a stated axis) is refused by design: there is
//! no broadcasting between ranks.

use crate::axis::Axis;
use crate::error::CubeError;
use crate::frame::Frame;
use crate::value::DType;

use super::Cube;

/// Elementwise binary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    #[inline]
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
        }
    }
}

impl Cube {
    /// Combine with another cube over the union of their axes.
    ///
    /// Missing cells (including those introduced by the alignment)
    /// propagate missing into the result. Numeric dtypes only.
    pub fn combine(&self, other: &Cube, op: BinOp) -> Result<Cube, CubeError> {
        let items = self.items.union(&other.items);
        let major = self.major.union(&other.major);
        let minor = self.minor.union(&other.minor);
        let left = self.reindex(Some(&items), Some(&major), Some(&minor), true)?;
        let right = other.reindex(Some(&items), Some(&major), Some(&minor), true)?;
        let block = left
            .block
            .combine_numeric(&right.block, |a, b| op.apply(a, b))?;
        Cube::from_parts(items, major, minor, DType::Float64, block)
    }

    pub fn add(&self, other: &Cube) -> Result<Cube, CubeError> {
        self.combine(other, BinOp::Add)
    }

    pub fn sub(&self, other: &Cube) -> Result<Cube, CubeError> {
        self.combine(other, BinOp::Sub)
    }

    pub fn mul(&self, other: &Cube) -> Result<Cube, CubeError> {
        self.combine(other, BinOp::Mul)
    }

    pub fn div(&self, other: &Cube) -> Result<Cube, CubeError> {
        self.combine(other, BinOp::Div)
    }

    /// Combine every cell with one scalar.
    pub fn combine_scalar(&self, value: f64, op: BinOp) -> Result<Cube, CubeError> {
        let block = match &self.block {
            crate::block::Block::Numeric(a) => {
                crate::block::Block::Numeric(a.mapv(|v| op.apply(v, value)))
            }
            crate::block::Block::Object(_) => {
                return Err(CubeError::Unsupported(
                    "elementwise arithmetic is only supported for numeric dtypes",
                ))
            }
        };
        Cube::from_parts(
            self.items.clone(),
            self.major.clone(),
            self.minor.clone(),
            DType::Float64,
            block,
        )
    }

    /// Arithmetic between a cube and a frame aligned along `_axis` is
    /// unsupported by design; there is no rank broadcasting.
    pub fn combine_frame(
        &self,
        _other: &Frame,
        _axis: Axis,
        _op: BinOp,
    ) -> Result<Cube, CubeError> {
        Err(CubeError::Unsupported(
            "arithmetic between a cube and an aligned lower-rank operand is not supported",
        ))
    }
}
