//! Host context handed to operations at creation time

use std::sync::Arc;
use std::time::Duration;

use glam::IVec3;

use crate::core::DeformConfig;
use crate::voxel::{Clipboard, Region};

/// Everything an operation needs from its host: selection, player, clipboard
/// and timing settings.
#[derive(Clone, Debug, Default)]
pub struct EditContext {
    region: Option<Arc<dyn Region>>,
    player_position: Option<IVec3>,
    selection_origin: Option<IVec3>,
    clipboard: Option<Arc<Clipboard>>,
    timeout: Option<Duration>,
    config: DeformConfig,
}

impl EditContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Region that replaces the factory's region for this run
    pub fn with_region(mut self, region: Arc<dyn Region>) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_player_position(mut self, position: IVec3) -> Self {
        self.player_position = Some(position);
        self
    }

    pub fn with_selection_origin(mut self, origin: IVec3) -> Self {
        self.selection_origin = Some(origin);
        self
    }

    pub fn with_clipboard(mut self, clipboard: Arc<Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Session timeout; overrides `DeformConfig::calculation_timeout_ms`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_config(mut self, config: DeformConfig) -> Self {
        self.config = config;
        self
    }

    pub fn region(&self) -> Option<&Arc<dyn Region>> {
        self.region.as_ref()
    }

    pub fn player_position(&self) -> Option<IVec3> {
        self.player_position
    }

    pub fn selection_origin(&self) -> Option<IVec3> {
        self.selection_origin
    }

    pub fn clipboard(&self) -> Option<&Arc<Clipboard>> {
        self.clipboard.as_ref()
    }

    pub fn config(&self) -> &DeformConfig {
        &self.config
    }

    /// Effective calculation budget
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or_else(|| self.config.timeout())
    }
}
