//! Voxdeform - Expression-driven deformation of voxel regions

pub mod core;
pub mod math;
pub mod voxel;
pub mod expression;
pub mod deform;
