//! Pre-image overlay - preserves original voxels of cells an operation overwrites.
//!
//! When an operation reads from the same store it writes to, every read must
//! see the store as it was before the operation began. The overlay records the
//! original voxel of each cell on its first overwrite; reads consult the
//! recorded pre-image before falling back to the live store.

use std::collections::HashMap;

use crate::core::types::IVec3;
use super::extent::InputExtent;
use super::voxel::Voxel;

/// Copy-on-write record of original voxels.
#[derive(Clone, Debug, Default)]
pub struct PreImageOverlay {
    /// Original voxel by position, captured before the first write
    original: HashMap<IVec3, Voxel>,
}

impl PreImageOverlay {
    /// Create a new empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current voxel at `pos` unless it was already recorded.
    ///
    /// Must be called before every write to `base` at `pos`.
    pub fn preserve<E: InputExtent + ?Sized>(&mut self, base: &E, pos: IVec3) {
        self.original.entry(pos).or_insert_with(|| base.voxel(pos));
    }

    /// Read the pre-operation voxel at `pos`.
    pub fn read<E: InputExtent + ?Sized>(&self, base: &E, pos: IVec3) -> Voxel {
        match self.original.get(&pos) {
            Some(voxel) => *voxel,
            None => base.voxel(pos),
        }
    }
}
