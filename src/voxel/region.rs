//! Regions: finite sets of block positions targeted by edits.

use std::fmt;

use crate::core::types::{DVec3, IVec3};
use crate::math::Aabb;

/// A finite set of integer cells with an axis-aligned bounding box.
pub trait Region: fmt::Debug + Send + Sync {
    /// Minimum corner of the bounding box (inclusive)
    fn minimum_point(&self) -> IVec3;

    /// Maximum corner of the bounding box (inclusive)
    fn maximum_point(&self) -> IVec3;

    /// Check whether a cell belongs to the region
    fn contains(&self, pos: IVec3) -> bool;

    /// Continuous bounds of the bounding box corners
    fn bounds(&self) -> Aabb {
        Aabb::from_block_corners(self.minimum_point(), self.maximum_point())
    }

    /// Iterate over the member cells
    fn cells(&self) -> Box<dyn Iterator<Item = IVec3> + '_> {
        Box::new(
            BoxIter::new(self.minimum_point(), self.maximum_point())
                .filter(move |p| self.contains(*p)),
        )
    }

    /// Number of member cells
    fn volume(&self) -> usize {
        self.cells().count()
    }
}

/// Iterator over every cell of an inclusive box, x-fastest.
#[derive(Clone, Debug)]
pub struct BoxIter {
    min: IVec3,
    max: IVec3,
    next: Option<IVec3>,
}

impl BoxIter {
    /// Iterate `min..=max` on every axis. Empty if any `min > max`.
    pub fn new(min: IVec3, max: IVec3) -> Self {
        let next = if min.cmple(max).all() { Some(min) } else { None };
        Self { min, max, next }
    }
}

impl Iterator for BoxIter {
    type Item = IVec3;

    fn next(&mut self) -> Option<IVec3> {
        let current = self.next?;
        let mut p = current;
        self.next = if p.x < self.max.x {
            p.x += 1;
            Some(p)
        } else if p.y < self.max.y {
            p.x = self.min.x;
            p.y += 1;
            Some(p)
        } else if p.z < self.max.z {
            p.x = self.min.x;
            p.y = self.min.y;
            p.z += 1;
            Some(p)
        } else {
            None
        };
        Some(current)
    }
}

/// Box of cells between two corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CuboidRegion {
    min: IVec3,
    max: IVec3,
}

impl CuboidRegion {
    /// Create a cuboid from two corners in any order
    pub fn new(a: IVec3, b: IVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Cells per axis
    pub fn dimensions(&self) -> IVec3 {
        self.max - self.min + IVec3::ONE
    }
}

impl Region for CuboidRegion {
    fn minimum_point(&self) -> IVec3 {
        self.min
    }

    fn maximum_point(&self) -> IVec3 {
        self.max
    }

    fn contains(&self, pos: IVec3) -> bool {
        pos.cmpge(self.min).all() && pos.cmple(self.max).all()
    }

    fn cells(&self) -> Box<dyn Iterator<Item = IVec3> + '_> {
        Box::new(BoxIter::new(self.min, self.max))
    }

    fn volume(&self) -> usize {
        let d = self.dimensions();
        d.x as usize * d.y as usize * d.z as usize
    }
}

/// Ellipsoid of cells around a center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EllipsoidRegion {
    center: IVec3,
    radius: DVec3,
}

impl EllipsoidRegion {
    /// Create an ellipsoid; radii are clamped to at least half a block.
    pub fn new(center: IVec3, radius: DVec3) -> Self {
        Self {
            center,
            radius: radius.abs().max(DVec3::splat(0.5)),
        }
    }

    /// Center cell
    pub fn center(&self) -> IVec3 {
        self.center
    }

    /// Radii per axis
    pub fn radius(&self) -> DVec3 {
        self.radius
    }
}

impl Region for EllipsoidRegion {
    fn minimum_point(&self) -> IVec3 {
        self.center - self.radius.floor().as_ivec3()
    }

    fn maximum_point(&self) -> IVec3 {
        self.center + self.radius.floor().as_ivec3()
    }

    fn contains(&self, pos: IVec3) -> bool {
        let d = (pos - self.center).as_dvec3() / self.radius;
        d.length_squared() <= 1.0
    }
}
