//! Voxel data structures and stores

pub mod voxel;
pub mod extent;
pub mod grid;
pub mod world;
pub mod region;
pub mod clipboard;
pub mod overlay;

pub use voxel::Voxel;
pub use extent::{Extent, InputExtent};
pub use grid::VoxelGrid;
pub use world::SparseWorld;
pub use region::{Region, CuboidRegion, EllipsoidRegion, BoxIter};
pub use clipboard::Clipboard;
pub use overlay::PreImageOverlay;
