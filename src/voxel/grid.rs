//! Dense, bounded voxel store.

use crate::core::types::{IVec3, UVec3};
use crate::math::Aabb;
use super::extent::{Extent, InputExtent};
use super::voxel::Voxel;

/// Dense voxel array covering the inclusive box `min..=max`.
///
/// Storage is x-fastest, then y, then z.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    min: IVec3,
    size: UVec3,
    voxels: Vec<Voxel>,
}

impl VoxelGrid {
    /// Create an empty grid spanning two corners (in any order).
    pub fn new(a: IVec3, b: IVec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        let size = (max - min + IVec3::ONE).as_uvec3();
        let len = size.x as usize * size.y as usize * size.z as usize;
        Self {
            min,
            size,
            voxels: vec![Voxel::EMPTY; len],
        }
    }

    /// Create a grid and fill every cell from `f(pos)`.
    pub fn from_fn(a: IVec3, b: IVec3, mut f: impl FnMut(IVec3) -> Voxel) -> Self {
        let mut grid = Self::new(a, b);
        for i in 0..grid.voxels.len() {
            let pos = grid.position_of(i);
            grid.voxels[i] = f(pos);
        }
        grid
    }

    /// Minimum corner (inclusive)
    pub fn minimum_point(&self) -> IVec3 {
        self.min
    }

    /// Maximum corner (inclusive)
    pub fn maximum_point(&self) -> IVec3 {
        self.min + self.size.as_ivec3() - IVec3::ONE
    }

    /// Cells per axis
    pub fn size(&self) -> UVec3 {
        self.size
    }

    /// Continuous bounds of the grid's cell coordinates
    pub fn bounds(&self) -> Aabb {
        Aabb::from_block_corners(self.minimum_point(), self.maximum_point())
    }

    /// Check whether `pos` lies inside the grid
    pub fn contains(&self, pos: IVec3) -> bool {
        self.index_of(pos).is_some()
    }

    /// Raw voxel storage (x-fastest)
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Number of non-empty voxels
    pub fn count_non_empty(&self) -> usize {
        self.voxels.iter().filter(|v| !v.is_empty()).count()
    }

    fn index_of(&self, pos: IVec3) -> Option<usize> {
        let local = pos - self.min;
        if local.cmplt(IVec3::ZERO).any() {
            return None;
        }
        let local = local.as_uvec3();
        if local.cmpge(self.size).any() {
            return None;
        }
        let (sx, sy) = (self.size.x as usize, self.size.y as usize);
        Some(local.x as usize + local.y as usize * sx + local.z as usize * sx * sy)
    }

    fn position_of(&self, index: usize) -> IVec3 {
        let (sx, sy) = (self.size.x as usize, self.size.y as usize);
        let x = index % sx;
        let y = (index / sx) % sy;
        let z = index / (sx * sy);
        self.min + IVec3::new(x as i32, y as i32, z as i32)
    }
}

impl InputExtent for VoxelGrid {
    fn voxel(&self, pos: IVec3) -> Voxel {
        self.index_of(pos)
            .map(|i| self.voxels[i])
            .unwrap_or(Voxel::EMPTY)
    }
}

impl Extent for VoxelGrid {
    fn set_voxel(&mut self, pos: IVec3, voxel: Voxel) -> bool {
        match self.index_of(pos) {
            Some(i) => {
                self.voxels[i] = voxel;
                true
            }
            None => false,
        }
    }
}
