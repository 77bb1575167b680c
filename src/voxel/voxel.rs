//! Voxel payload type

use bytemuck::{Pod, Zeroable};

/// Convert RGB888 to RGB565
pub fn rgb_to_565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r as u16 >> 3) & 0x1F;
    let g6 = (g as u16 >> 2) & 0x3F;
    let b5 = (b as u16 >> 3) & 0x1F;
    (r5 << 11) | (g6 << 5) | b5
}

/// Single voxel - exactly 4 bytes.
///
/// The deformation core treats voxels as opaque: it copies them from the
/// sampled source cell to the destination cell without inspecting them.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Voxel {
    /// RGB565 encoded color
    pub color: u16,
    /// Material ID
    pub material_id: u8,
    /// Free-form flags owned by the host
    pub flags: u8,
}

impl Voxel {
    /// Empty/air voxel; also what reads outside a store's domain return
    pub const EMPTY: Voxel = Voxel {
        color: 0,
        material_id: 0,
        flags: 0,
    };

    /// Create voxel from RGB888 values
    pub fn new(r: u8, g: u8, b: u8, material_id: u8) -> Self {
        Self {
            color: rgb_to_565(r, g, b),
            material_id,
            flags: 0,
        }
    }

    /// Uncolored voxel of a material
    pub fn material(material_id: u8) -> Self {
        Self {
            color: 0,
            material_id,
            flags: 0,
        }
    }

    /// Check if voxel is empty (air)
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}
