//! Coordinate transforms between block space and expression space.

use crate::core::types::{DVec3, IVec3};

/// A pure forward/inverse coordinate mapping.
///
/// `inverse(forward(v))` reproduces `v` up to floating point error.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Transform {
    /// Coordinates pass through unchanged
    #[default]
    Identity,
    /// `forward(p) = (p - offset) / scale`, `inverse(p) = p * scale + offset`
    Scale {
        offset: DVec3,
        /// Per-axis divisor; never zero
        scale: DVec3,
    },
}

impl Transform {
    /// Pure translation by `-offset` (unit scale).
    pub fn translation(offset: DVec3) -> Self {
        Transform::Scale { offset, scale: DVec3::ONE }
    }

    /// Translate by `-offset`, then divide by `scale`.
    ///
    /// Zero scale components are replaced with 1.0.
    pub fn scale(offset: DVec3, scale: DVec3) -> Self {
        let scale = DVec3::select(scale.cmpeq(DVec3::ZERO), DVec3::ONE, scale);
        Transform::Scale { offset, scale }
    }

    /// Map a block-space position into expression space.
    pub fn forward(&self, p: DVec3) -> DVec3 {
        match self {
            Transform::Identity => p,
            Transform::Scale { offset, scale } => (p - *offset) / *scale,
        }
    }

    /// Map an expression-space position back into block space.
    pub fn inverse(&self, p: DVec3) -> DVec3 {
        match self {
            Transform::Identity => p,
            Transform::Scale { offset, scale } => p * *scale + *offset,
        }
    }

    /// Scale applied by `forward` (ONE for identity and translations).
    pub fn scale_factors(&self) -> DVec3 {
        match self {
            Transform::Identity => DVec3::ONE,
            Transform::Scale { scale, .. } => *scale,
        }
    }
}

/// Round a continuous position to the nearest block (per axis, ties away from zero).
///
/// Values outside the i32 range saturate.
pub fn to_block_point(v: DVec3) -> IVec3 {
    v.round().as_ivec3()
}
