//! Deformation settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Host-level settings for deformation operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeformConfig {
    /// Wall-time budget for one operation, in milliseconds.
    /// A session timeout in the edit context takes precedence.
    pub calculation_timeout_ms: u64,
    /// Cells processed between cancellation/timeout checks.
    pub check_interval: usize,
    /// Cells processed per `resume` call (None = whole region in one call)
    pub cells_per_resume: Option<usize>,
    /// Total loop iterations allowed per expression evaluation (None = unbounded,
    /// only the time budget applies)
    pub max_loop_iterations: Option<u64>,
}

impl Default for DeformConfig {
    fn default() -> Self {
        Self {
            calculation_timeout_ms: 100,
            check_interval: 64,
            cells_per_resume: None,
            max_loop_iterations: None,
        }
    }
}

impl DeformConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculation budget as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.calculation_timeout_ms)
    }

    /// Parse a config from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> crate::core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> crate::core::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Save the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> crate::core::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
