//! The three cube axes and their single resolution point.
//!
//! Callers may address an axis by position (0/1/2) or by alias name
//! (`"items"`, `"major_axis"`/`"major"`, `"minor_axis"`/`"minor"`). All
//! call sites resolve through [`Axis::resolve`] rather than branching on
//! aliases ad hoc.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CubeError;

/// One of the cube's three dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Axis 0: one label per 2-D slice.
    Items,
    /// Axis 1: the row dimension of an item slice.
    Major,
    /// Axis 2: the column dimension of an item slice.
    Minor,
}

impl Axis {
    /// All axes in storage order.
    pub const ALL: [Axis; 3] = [Axis::Items, Axis::Major, Axis::Minor];

    /// Storage position of this axis (items=0, major=1, minor=2).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::Items => 0,
            Axis::Major => 1,
            Axis::Minor => 2,
        }
    }

    /// The corresponding ndarray axis.
    #[inline]
    pub(crate) fn nd(self) -> ndarray::Axis {
        ndarray::Axis(self.index())
    }

    /// Canonical name, used in error messages and display.
    pub fn name(self) -> &'static str {
        match self {
            Axis::Items => "items",
            Axis::Major => "major_axis",
            Axis::Minor => "minor_axis",
        }
    }

    /// Resolve a numeric axis position.
    pub fn from_index(index: usize) -> Result<Axis, CubeError> {
        match index {
            0 => Ok(Axis::Items),
            1 => Ok(Axis::Major),
            2 => Ok(Axis::Minor),
            _ => Err(CubeError::UnknownAxis {
                name: index.to_string(),
            }),
        }
    }

    /// Resolve an alias name.
    pub fn from_name(name: &str) -> Result<Axis, CubeError> {
        match name {
            "items" => Ok(Axis::Items),
            "major_axis" | "major" => Ok(Axis::Major),
            "minor_axis" | "minor" => Ok(Axis::Minor),
            _ => Err(CubeError::UnknownAxis {
                name: name.to_string(),
            }),
        }
    }

    /// Resolve any supported axis selector.
    pub fn resolve<A: AxisLike>(selector: A) -> Result<Axis, CubeError> {
        selector.resolve_axis()
    }

    /// The two axes other than this one, in storage order.
    pub fn others(self) -> (Axis, Axis) {
        match self {
            Axis::Items => (Axis::Major, Axis::Minor),
            Axis::Major => (Axis::Items, Axis::Minor),
            Axis::Minor => (Axis::Items, Axis::Major),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that names an axis: the enum itself, a position, or an alias.
pub trait AxisLike {
    fn resolve_axis(self) -> Result<Axis, CubeError>;
}

impl AxisLike for Axis {
    fn resolve_axis(self) -> Result<Axis, CubeError> {
        Ok(self)
    }
}

impl AxisLike for usize {
    fn resolve_axis(self) -> Result<Axis, CubeError> {
        Axis::from_index(self)
    }
}

impl AxisLike for &str {
    fn resolve_axis(self) -> Result<Axis, CubeError> {
        Axis::from_name(self)
    }
}
