//! Deformation factory

use std::fmt;
use std::sync::Arc;

use glam::DVec3;

use super::context::EditContext;
use super::error::DeformError;
use super::mode::Mode;
use super::operation::DeformOperation;
use super::placement::{Placement, PlacementType};
use crate::expression::Expression;
use crate::math::to_block_point;
use crate::voxel::{Extent, Region};

/// Reusable description of an expression deformation: where to write, which
/// cells, how coordinates are normalized and where samples come from.
///
/// The expression is compiled once at construction.
pub struct Deform<E> {
    destination: E,
    region: Arc<dyn Region>,
    expression: Expression,
    mode: Mode,
    placement: Option<Placement>,
    use_clipboard: bool,
}

/// Builder for [`Deform`]. Destination, region and mode are required.
pub struct DeformBuilder<E> {
    source: String,
    destination: Option<E>,
    region: Option<Arc<dyn Region>>,
    mode: Option<Mode>,
    placement: Option<Placement>,
    use_clipboard: bool,
}

impl<E: Extent> DeformBuilder<E> {
    pub fn destination(mut self, destination: E) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn region(mut self, region: Arc<dyn Region>) -> Self {
        self.region = Some(region);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Absolute placement, rounded to the nearest block
    pub fn offset(self, offset: DVec3) -> Self {
        self.placement(Placement::world(to_block_point(offset)))
    }

    pub fn use_clipboard(mut self, use_clipboard: bool) -> Self {
        self.use_clipboard = use_clipboard;
        self
    }

    /// Validate and compile. Nothing is read from or written to the
    /// destination here.
    pub fn build(self) -> Result<Deform<E>, DeformError> {
        let destination = self
            .destination
            .ok_or(DeformError::InvalidArgument("destination"))?;
        let region = self.region.ok_or(DeformError::InvalidArgument("region"))?;
        let mode = self.mode.ok_or(DeformError::InvalidArgument("mode"))?;
        let expression = Expression::compile(&self.source)?;

        Ok(Deform {
            destination,
            region,
            expression,
            mode,
            placement: self.placement,
            use_clipboard: self.use_clipboard,
        })
    }
}

impl<E: Extent> Deform<E> {
    /// Start building a deformation for `expression`
    pub fn builder(expression: impl Into<String>) -> DeformBuilder<E> {
        DeformBuilder {
            source: expression.into(),
            destination: None,
            region: None,
            mode: None,
            placement: None,
            use_clipboard: false,
        }
    }

    pub fn new(
        destination: E,
        region: Arc<dyn Region>,
        expression: &str,
        mode: Mode,
    ) -> Result<Self, DeformError> {
        Self::builder(expression)
            .destination(destination)
            .region(region)
            .mode(mode)
            .build()
    }

    pub fn destination(&self) -> &E {
        &self.destination
    }

    pub fn destination_mut(&mut self) -> &mut E {
        &mut self.destination
    }

    pub fn set_destination(&mut self, destination: E) {
        self.destination = destination;
    }

    pub fn region(&self) -> &Arc<dyn Region> {
        &self.region
    }

    pub fn set_region(&mut self, region: Arc<dyn Region>) {
        self.region = region;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.placement = Some(placement);
    }

    /// Set an absolute world placement (rounded to the nearest block)
    pub fn set_offset(&mut self, offset: DVec3) {
        self.placement = Some(Placement::world(to_block_point(offset)));
    }

    /// The offset given to [`set_offset`](Self::set_offset).
    ///
    /// Fails for any other kind of placement.
    #[deprecated(note = "use `placement()`; only meaningful after `set_offset`")]
    pub fn offset(&self) -> Result<DVec3, DeformError> {
        match &self.placement {
            Some(p) if p.kind == PlacementType::World => Ok(p.offset.as_dvec3()),
            _ => Err(DeformError::InvalidState(
                "offset is only available after set_offset".to_string(),
            )),
        }
    }

    pub fn use_clipboard(&self) -> bool {
        self.use_clipboard
    }

    pub fn set_use_clipboard(&mut self, use_clipboard: bool) {
        self.use_clipboard = use_clipboard;
    }

    /// Bind to a host context, consuming the factory
    pub fn into_operation(self, context: EditContext) -> DeformOperation<E> {
        DeformOperation::new(
            self.destination,
            self.region,
            self.expression,
            self.mode,
            self.placement,
            self.use_clipboard,
            context,
        )
    }

    /// Create an operation while keeping the factory for reuse
    pub fn create_operation(&self, context: EditContext) -> DeformOperation<E>
    where
        E: Clone,
    {
        DeformOperation::new(
            self.destination.clone(),
            Arc::clone(&self.region),
            self.expression.clone(),
            self.mode,
            self.placement,
            self.use_clipboard,
            context,
        )
    }
}

impl<E> fmt::Display for Deform<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deformation of {}", self.expression.source())
    }
}

impl<E> fmt::Debug for Deform<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deform")
            .field("expression", &self.expression.source())
            .field("region", &self.region)
            .field("mode", &self.mode)
            .field("placement", &self.placement)
            .field("use_clipboard", &self.use_clipboard)
            .finish_non_exhaustive()
    }
}
