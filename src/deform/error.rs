//! Deformation errors

use glam::IVec3;
use thiserror::Error;

use crate::expression::{CompileError, EvalError};

/// Errors raised while configuring or running a deformation.
///
/// Cells written before an error stay written; nothing is rolled back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeformError {
    #[error("invalid expression: {0}")]
    Compile(#[from] CompileError),

    #[error("expression failed at {position}: {source}")]
    Evaluation { position: IVec3, source: EvalError },

    #[error("calculation timed out after {elapsed_ms} ms ({cells_written} cells written)")]
    Timeout { elapsed_ms: u64, cells_written: usize },

    #[error("operation canceled ({cells_written} cells written)")]
    Canceled { cells_written: usize },

    #[error("missing or unavailable argument: {0}")]
    InvalidArgument(&'static str),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl DeformError {
    /// Cancellation is an expected way to stop; everything else is a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(self, DeformError::Canceled { .. })
    }

    /// Cells written before the operation stopped, when known
    pub fn cells_written(&self) -> Option<usize> {
        match self {
            DeformError::Timeout { cells_written, .. }
            | DeformError::Canceled { cells_written } => Some(*cells_written),
            _ => None,
        }
    }
}
