//! Unbounded sparse voxel store

use std::collections::HashMap;

use crate::core::types::IVec3;
use super::extent::{Extent, InputExtent};
use super::voxel::Voxel;

/// Sparse voxel world; unset cells read as empty.
#[derive(Clone, Debug, Default)]
pub struct SparseWorld {
    /// Non-empty voxels by position
    voxels: HashMap<IVec3, Voxel>,
    /// Positions written since the last `take_modified`
    modified: Vec<IVec3>,
}

impl SparseWorld {
    /// Create a new empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty voxels
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Check if the world holds no voxels
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Iterate over all non-empty voxels
    pub fn iter(&self) -> impl Iterator<Item = (IVec3, Voxel)> + '_ {
        self.voxels.iter().map(|(p, v)| (*p, *v))
    }

    /// Take the list of written positions and clear it
    pub fn take_modified(&mut self) -> Vec<IVec3> {
        std::mem::take(&mut self.modified)
    }
}

impl InputExtent for SparseWorld {
    fn voxel(&self, pos: IVec3) -> Voxel {
        self.voxels.get(&pos).copied().unwrap_or(Voxel::EMPTY)
    }
}

impl Extent for SparseWorld {
    fn set_voxel(&mut self, pos: IVec3, voxel: Voxel) -> bool {
        if voxel.is_empty() {
            self.voxels.remove(&pos);
        } else {
            self.voxels.insert(pos, voxel);
        }
        self.modified.push(pos);
        true
    }
}
