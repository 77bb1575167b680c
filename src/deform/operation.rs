//! Resumable, cancelable operations

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::IVec3;

use super::context::EditContext;
use super::error::DeformError;
use super::executor::{DeformJob, DeformStats, Source};
use super::mode::Mode;
use super::placement::Placement;
use super::status::StatusMessage;
use crate::expression::Expression;
use crate::voxel::{Extent, Region};

/// Outcome of a successful `resume`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// All work is done
    Done,
    /// More work remains; call `resume` again
    Continue,
}

/// A unit of work the host drives by calling `resume` until it is done.
pub trait Operation {
    /// Do some work. Errors are terminal: later calls return the same error
    /// without doing anything.
    fn resume(&mut self) -> Result<Progress, DeformError>;

    /// Request cancellation; takes effect at the next check point.
    fn cancel(&mut self);

    fn status_messages(&self) -> Vec<StatusMessage>;
}

/// Drive an operation until it finishes.
pub fn complete<O: Operation + ?Sized>(operation: &mut O) -> Result<(), DeformError> {
    while operation.resume()? == Progress::Continue {}
    Ok(())
}

/// Thread-safe cancellation trigger shared with a running operation
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn flag(&self) -> &AtomicBool {
        &self.0
    }
}

/// Externally visible lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationState {
    Ready,
    Running,
    Done,
    Canceled,
    Failed,
}

enum Phase {
    Ready,
    Running(Box<DeformJob>),
    Done,
    Canceled(DeformError),
    Failed(DeformError),
}

/// A deformation bound to a destination store and host context.
///
/// Created by [`Deform::into_operation`](super::Deform::into_operation) or
/// [`Deform::create_operation`](super::Deform::create_operation).
/// Setup (region snapshot, transforms, clipboard lookup) happens on the first
/// `resume`; the time budget starts then.
pub struct DeformOperation<E> {
    destination: E,
    region: Arc<dyn Region>,
    expression: Expression,
    mode: Mode,
    placement: Option<Placement>,
    use_clipboard: bool,
    context: EditContext,
    cancel: CancelHandle,
    phase: Phase,
    stats: DeformStats,
}

impl<E: Extent> DeformOperation<E> {
    pub(crate) fn new(
        destination: E,
        region: Arc<dyn Region>,
        expression: Expression,
        mode: Mode,
        placement: Option<Placement>,
        use_clipboard: bool,
        context: EditContext,
    ) -> Self {
        Self {
            destination,
            region,
            expression,
            mode,
            placement,
            use_clipboard,
            context,
            cancel: CancelHandle::new(),
            phase: Phase::Ready,
            stats: DeformStats::default(),
        }
    }

    /// Handle that can cancel this operation from another thread
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> OperationState {
        match self.phase {
            Phase::Ready => OperationState::Ready,
            Phase::Running(_) => OperationState::Running,
            Phase::Done => OperationState::Done,
            Phase::Canceled(_) => OperationState::Canceled,
            Phase::Failed(_) => OperationState::Failed,
        }
    }

    pub fn stats(&self) -> DeformStats {
        self.stats
    }

    pub fn destination(&self) -> &E {
        &self.destination
    }

    pub fn into_destination(self) -> E {
        self.destination
    }

    fn start(&self) -> Result<DeformJob, DeformError> {
        let region = self.context.region().unwrap_or(&self.region);
        let bounds = region.bounds();

        let placement = match &self.placement {
            Some(p) => p.resolve(region.as_ref(), &self.context)?,
            None => IVec3::ZERO,
        };
        let output = self.mode.transform_for(&bounds, placement.as_dvec3());

        let (source, input) = if self.use_clipboard {
            let clipboard = self
                .context
                .clipboard()
                .ok_or_else(|| DeformError::InvalidState("no clipboard available".to_string()))?;
            let clip_bounds = clipboard.bounds();
            let input = self.mode.transform_for(&clip_bounds, clip_bounds.min);
            (Source::Clipboard(Arc::clone(clipboard)), input)
        } else {
            (Source::Destination, output)
        };

        let cells: Vec<IVec3> = region.cells().collect();
        let budget = self.context.timeout();
        log::debug!(
            "Deform `{}`: {} cells, mode {}, placement {}, budget {:?}, source {}",
            self.expression,
            cells.len(),
            self.mode,
            placement,
            budget,
            if self.use_clipboard { "clipboard" } else { "destination" }
        );

        Ok(DeformJob::new(
            cells,
            output,
            input,
            source,
            self.expression.clone(),
            budget,
            self.context.config(),
        ))
    }

    fn terminate(&mut self, error: DeformError) -> DeformError {
        match &error {
            DeformError::Canceled { cells_written } => {
                log::info!("Deform `{}` canceled after {} cells", self.expression, cells_written);
                self.phase = Phase::Canceled(error.clone());
            }
            _ => {
                log::warn!("Deform `{}` failed: {}", self.expression, error);
                self.phase = Phase::Failed(error.clone());
            }
        }
        error
    }
}

impl<E: Extent> Operation for DeformOperation<E> {
    fn resume(&mut self) -> Result<Progress, DeformError> {
        match &self.phase {
            Phase::Done => return Ok(Progress::Done),
            Phase::Canceled(e) | Phase::Failed(e) => return Err(e.clone()),
            Phase::Ready | Phase::Running(_) => {}
        }
        if let Phase::Ready = self.phase {
            let job = match self.start() {
                Ok(job) => job,
                Err(e) => return Err(self.terminate(e)),
            };
            self.phase = Phase::Running(Box::new(job));
        }

        let Phase::Running(job) = &mut self.phase else {
            return Ok(Progress::Done);
        };
        let result = job.run(
            &mut self.destination,
            self.cancel.flag(),
            self.context.config().cells_per_resume,
        );
        self.stats = job.stats();

        match result {
            Ok(Progress::Continue) => Ok(Progress::Continue),
            Ok(Progress::Done) => {
                log::info!(
                    "Deform `{}` complete: {}/{} cells written in {:?}",
                    self.expression,
                    self.stats.cells_written,
                    self.stats.cells_total,
                    self.stats.elapsed
                );
                self.phase = Phase::Done;
                Ok(Progress::Done)
            }
            Err(e) => Err(self.terminate(e)),
        }
    }

    fn cancel(&mut self) {
        self.cancel.cancel();
    }

    fn status_messages(&self) -> Vec<StatusMessage> {
        vec![StatusMessage::deform_expression(self.expression.source())]
    }
}
