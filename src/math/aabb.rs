//! Axis-aligned bounding box

use crate::core::types::{DVec3, IVec3};

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Create AABB spanning two block corners (inclusive cell coordinates)
    pub fn from_block_corners(min: IVec3, max: IVec3) -> Self {
        Self {
            min: min.as_dvec3(),
            max: max.as_dvec3(),
        }
    }

    /// Get center point
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Get half-extents
    pub fn half_extent(&self) -> DVec3 {
        self.max - self.center()
    }
}
