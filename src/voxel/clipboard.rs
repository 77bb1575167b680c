//! Clipboard: a detached snapshot of a region used as an alternate input.

use crate::core::types::IVec3;
use crate::math::Aabb;
use super::extent::{Extent, InputExtent};
use super::grid::VoxelGrid;
use super::region::Region;
use super::voxel::Voxel;

/// Read-only copy of a region's contents with its own bounds and origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Clipboard {
    grid: VoxelGrid,
    origin: IVec3,
}

impl Clipboard {
    /// Wrap an existing grid. `origin` is the reference point used when pasting.
    pub fn new(grid: VoxelGrid, origin: IVec3) -> Self {
        Self { grid, origin }
    }

    /// Copy the cells of `region` out of `source`.
    ///
    /// Cells inside the region's bounding box but outside the region are left empty.
    pub fn copy_from(source: &dyn InputExtent, region: &dyn Region, origin: IVec3) -> Self {
        let mut grid = VoxelGrid::new(region.minimum_point(), region.maximum_point());
        for pos in region.cells() {
            grid.set_voxel(pos, source.voxel(pos));
        }
        Self { grid, origin }
    }

    /// Minimum corner of the clipboard contents
    pub fn minimum_point(&self) -> IVec3 {
        self.grid.minimum_point()
    }

    /// Maximum corner of the clipboard contents
    pub fn maximum_point(&self) -> IVec3 {
        self.grid.maximum_point()
    }

    /// Continuous bounds of the contents
    pub fn bounds(&self) -> Aabb {
        self.grid.bounds()
    }

    /// Paste reference point
    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    /// Underlying voxel grid
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }
}

impl InputExtent for Clipboard {
    fn voxel(&self, pos: IVec3) -> Voxel {
        self.grid.voxel(pos)
    }
}
