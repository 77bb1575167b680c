//! Voxel store abstractions consumed by edit operations.

use crate::core::types::IVec3;
use super::voxel::Voxel;

/// Read access to a voxel store.
pub trait InputExtent {
    /// Voxel at `pos`. Positions outside the store's domain read as `Voxel::EMPTY`.
    fn voxel(&self, pos: IVec3) -> Voxel;
}

/// Read/write voxel store.
pub trait Extent: InputExtent {
    /// Store `voxel` at `pos`. Returns false if `pos` is outside the store.
    fn set_voxel(&mut self, pos: IVec3, voxel: Voxel) -> bool;
}

impl<T: InputExtent + ?Sized> InputExtent for &T {
    fn voxel(&self, pos: IVec3) -> Voxel {
        (**self).voxel(pos)
    }
}

impl<T: InputExtent + ?Sized> InputExtent for &mut T {
    fn voxel(&self, pos: IVec3) -> Voxel {
        (**self).voxel(pos)
    }
}

impl<T: InputExtent + ?Sized> InputExtent for Box<T> {
    fn voxel(&self, pos: IVec3) -> Voxel {
        (**self).voxel(pos)
    }
}

impl<T: Extent + ?Sized> Extent for &mut T {
    fn set_voxel(&mut self, pos: IVec3, voxel: Voxel) -> bool {
        (**self).set_voxel(pos, voxel)
    }
}

impl<T: Extent + ?Sized> Extent for Box<T> {
    fn set_voxel(&mut self, pos: IVec3, voxel: Voxel) -> bool {
        (**self).set_voxel(pos, voxel)
    }
}
