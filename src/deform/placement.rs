//! Placement anchors for offset-mode deformations

use std::fmt;

use glam::IVec3;
use serde::{Deserialize, Serialize};

use super::context::EditContext;
use super::error::DeformError;
use crate::math::to_block_point;
use crate::voxel::Region;

/// What a placement offset is relative to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementType {
    /// Offset is an absolute world position
    #[default]
    World,
    /// Relative to the player's position
    Player,
    /// Relative to the first selection point
    Pos1,
    /// Relative to the region's minimum corner
    Min,
    /// Relative to the region's maximum corner
    Max,
    /// Relative to the region's center (rounded)
    Center,
}

impl PlacementType {
    /// Anchor point for this placement type.
    pub fn anchor(self, region: &dyn Region, ctx: &EditContext) -> Result<IVec3, DeformError> {
        match self {
            PlacementType::World => Ok(IVec3::ZERO),
            PlacementType::Player => ctx
                .player_position()
                .ok_or(DeformError::InvalidArgument("player position")),
            PlacementType::Pos1 => ctx
                .selection_origin()
                .ok_or(DeformError::InvalidArgument("selection origin")),
            PlacementType::Min => Ok(region.minimum_point()),
            PlacementType::Max => Ok(region.maximum_point()),
            PlacementType::Center => Ok(to_block_point(region.bounds().center())),
        }
    }
}

/// Anchor plus offset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub kind: PlacementType,
    pub offset: IVec3,
}

impl Placement {
    pub fn new(kind: PlacementType, offset: IVec3) -> Self {
        Self { kind, offset }
    }

    /// Absolute world position
    pub fn world(position: IVec3) -> Self {
        Self::new(PlacementType::World, position)
    }

    /// Resolve to a world position against the active region and context
    pub fn resolve(&self, region: &dyn Region, ctx: &EditContext) -> Result<IVec3, DeformError> {
        Ok(self.kind.anchor(region, ctx)? + self.offset)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}", self.kind, self.offset)
    }
}
