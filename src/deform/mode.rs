//! Coordinate normalization modes

use std::fmt;
use std::str::FromStr;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Aabb, Transform};

/// How region coordinates are presented to the expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// World coordinates, unchanged
    RawCoordinate,
    /// World coordinates relative to the placement point
    Offset,
    /// Region bounds mapped onto [-1, 1] per axis
    #[default]
    UnitCube,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown deform mode `{0}` (expected raw, offset or unit)")]
pub struct ParseModeError(String);

impl Mode {
    /// Build the transform for a box spanning `min..=max` anchored at `placement`.
    ///
    /// Unit-cube mode centers on the box; an axis with zero half-extent keeps
    /// scale 1 instead of dividing by zero.
    pub fn transform(self, min: DVec3, max: DVec3, placement: DVec3) -> Transform {
        match self {
            Mode::RawCoordinate => Transform::Identity,
            Mode::Offset => Transform::translation(placement),
            Mode::UnitCube => {
                let bounds = Aabb::new(min, max);
                Transform::scale(bounds.center(), bounds.half_extent())
            }
        }
    }

    pub fn transform_for(self, bounds: &Aabb, placement: DVec3) -> Transform {
        self.transform(bounds.min, bounds.max, placement)
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::RawCoordinate => "raw",
            Mode::Offset => "offset",
            Mode::UnitCube => "unit",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" | "raw_coordinate" | "rawcoord" => Ok(Mode::RawCoordinate),
            "offset" => Ok(Mode::Offset),
            "unit" | "unit_cube" | "unitcube" => Ok(Mode::UnitCube),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}
