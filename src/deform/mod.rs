//! Expression-driven deformation of voxel regions
//!
//! A [`Deform`] describes the job: destination store, region, compiled
//! expression, coordinate [`Mode`] and optional [`Placement`]. Binding it to
//! an [`EditContext`] yields a [`DeformOperation`], which the host drives
//! through the [`Operation`] trait.
//!
//! For each cell `p` of the region the operation normalizes `p` with the
//! mode's transform, runs the expression on `x, y, z`, maps the result back
//! and copies the voxel found there into `p`. Cells are read as they were
//! before the operation started, even when source and destination are the
//! same store.
//!
//! Errors, timeouts and cancellation stop the run; cells already written
//! stay written. Operations are single-threaded and the host must not run
//! two of them against the same store at once. Only the [`CancelHandle`] may
//! be used from another thread.
//!
//! ```
//! use std::sync::Arc;
//! use glam::IVec3;
//! use voxdeform::deform::{complete, Deform, EditContext, Mode};
//! use voxdeform::voxel::{CuboidRegion, Voxel, VoxelGrid};
//!
//! let mut grid = VoxelGrid::from_fn(IVec3::ZERO, IVec3::splat(3), |p| {
//!     if p.y == 0 { Voxel::material(1) } else { Voxel::EMPTY }
//! });
//! let region = Arc::new(CuboidRegion::new(IVec3::ZERO, IVec3::splat(3)));
//!
//! let deform = Deform::new(&mut grid, region, "y = y - 1", Mode::RawCoordinate).unwrap();
//! let mut op = deform.into_operation(EditContext::new());
//! complete(&mut op).unwrap();
//! assert_eq!(op.stats().cells_written, 64);
//! ```

mod context;
mod error;
mod executor;
mod factory;
mod mode;
mod operation;
mod placement;
mod status;

#[cfg(test)]
mod tests;

pub use context::EditContext;
pub use error::DeformError;
pub use executor::{DeformJob, DeformStats, Source};
pub use factory::{Deform, DeformBuilder};
pub use mode::{Mode, ParseModeError};
pub use operation::{CancelHandle, DeformOperation, Operation, OperationState, Progress, complete};
pub use placement::{Placement, PlacementType};
pub use status::{DEFORM_EXPRESSION_KEY, StatusMessage};
