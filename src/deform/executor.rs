//! Resampling executor
//!
//! For every region cell `p` the job evaluates the expression at
//! `output.forward(p)`, maps the result through `input.inverse`, rounds it to
//! a block and copies the source voxel found there into `p`.
//!
//! When the destination is also the source, reads go through a
//! [`PreImageOverlay`] so every cell samples the pre-operation state no matter
//! which cells were already rewritten.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::IVec3;

use super::error::DeformError;
use super::operation::Progress;
use crate::core::DeformConfig;
use crate::expression::{EvalError, EvalLimits, Expression};
use crate::math::{Transform, to_block_point};
use crate::voxel::{Clipboard, Extent, InputExtent, PreImageOverlay};

/// Where sampled voxels come from
#[derive(Clone, Debug)]
pub enum Source {
    /// The destination store itself, as it was before the operation
    Destination,
    /// A clipboard snapshot
    Clipboard(Arc<Clipboard>),
}

/// Progress counters for a deformation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeformStats {
    /// Cells in the region
    pub cells_total: usize,
    /// Cells evaluated so far
    pub cells_processed: usize,
    /// Cells the destination accepted a write for
    pub cells_written: usize,
    /// Wall time since the first resume
    pub elapsed: Duration,
}

impl DeformStats {
    pub fn is_complete(&self) -> bool {
        self.cells_processed == self.cells_total
    }
}

/// State of one deformation run, created on the first resume.
pub struct DeformJob {
    cells: Vec<IVec3>,
    next: usize,
    output: Transform,
    input: Transform,
    source: Source,
    overlay: PreImageOverlay,
    expression: Expression,
    budget: Duration,
    check_interval: usize,
    max_loop_iterations: Option<u64>,
    started: Instant,
    stats: DeformStats,
}

impl DeformJob {
    /// Start a job over `cells`. The time budget starts counting now.
    pub fn new(
        cells: Vec<IVec3>,
        output: Transform,
        input: Transform,
        source: Source,
        expression: Expression,
        budget: Duration,
        config: &DeformConfig,
    ) -> Self {
        let stats = DeformStats {
            cells_total: cells.len(),
            ..DeformStats::default()
        };
        Self {
            cells,
            next: 0,
            output,
            input,
            source,
            overlay: PreImageOverlay::new(),
            expression,
            budget,
            check_interval: config.check_interval.max(1),
            max_loop_iterations: config.max_loop_iterations,
            started: Instant::now(),
            stats,
        }
    }

    pub fn stats(&self) -> DeformStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.cells.len()
    }

    /// Process up to `max_cells` cells (all remaining when `None`).
    ///
    /// Cancellation and the time budget are checked before the first cell and
    /// then every `check_interval` cells.
    pub fn run<E: Extent + ?Sized>(
        &mut self,
        destination: &mut E,
        cancel: &AtomicBool,
        max_cells: Option<usize>,
    ) -> Result<Progress, DeformError> {
        let end = match max_cells {
            Some(n) => self.next.saturating_add(n.max(1)).min(self.cells.len()),
            None => self.cells.len(),
        };
        let limits = EvalLimits {
            max_loop_iterations: self.max_loop_iterations,
            deadline: Some(self.started + self.budget),
        };

        let mut since_check = 0;
        self.check(cancel)?;
        while self.next < end {
            if since_check == self.check_interval {
                self.check(cancel)?;
                since_check = 0;
            }
            let pos = self.cells[self.next];
            self.deform_cell(destination, pos, &limits)?;
            self.next += 1;
            self.stats.cells_processed += 1;
            since_check += 1;
        }

        self.stats.elapsed = self.started.elapsed();
        if self.is_finished() {
            Ok(Progress::Done)
        } else {
            Ok(Progress::Continue)
        }
    }

    fn check(&mut self, cancel: &AtomicBool) -> Result<(), DeformError> {
        self.stats.elapsed = self.started.elapsed();
        if cancel.load(Ordering::Relaxed) {
            return Err(DeformError::Canceled {
                cells_written: self.stats.cells_written,
            });
        }
        if self.stats.elapsed >= self.budget {
            return Err(self.timeout());
        }
        Ok(())
    }

    fn timeout(&self) -> DeformError {
        DeformError::Timeout {
            elapsed_ms: saturating_millis(self.started.elapsed()),
            cells_written: self.stats.cells_written,
        }
    }

    fn deform_cell<E: Extent + ?Sized>(
        &mut self,
        destination: &mut E,
        pos: IVec3,
        limits: &EvalLimits,
    ) -> Result<(), DeformError> {
        let normalized = self.output.forward(pos.as_dvec3());
        let result = self
            .expression
            .evaluate_with(normalized.into(), limits)
            .map_err(|e| match e {
                EvalError::DeadlineExceeded => self.timeout(),
                source => DeformError::Evaluation {
                    position: pos,
                    source,
                },
            })?;
        if !result.bindings.is_finite() {
            return Err(DeformError::Evaluation {
                position: pos,
                source: EvalError::NonFiniteResult,
            });
        }

        let sample = to_block_point(self.input.inverse(result.bindings.into()));
        let voxel = match &self.source {
            Source::Clipboard(clipboard) => clipboard.voxel(sample),
            Source::Destination => {
                let voxel = self.overlay.read(&*destination, sample);
                self.overlay.preserve(&*destination, pos);
                voxel
            }
        };

        if destination.set_voxel(pos, voxel) {
            self.stats.cells_written += 1;
        }
        Ok(())
    }
}

fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
