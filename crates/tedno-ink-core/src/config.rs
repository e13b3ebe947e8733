//! Tunable settings for a drawing canvas.

use crate::geometry::StrokeOptions;
use crate::storage::AutoSaveConfig;
use crate::tools::DEFAULT_CLEAR_CONFIRM_MS;
use crate::viewport::ViewportConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Zoom range {min}..{max} must be positive and include 1")]
    ZoomRange { min: f64, max: f64 },
    #[error("Invalid {field}: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Everything a canvas session can be tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkConfig {
    pub viewport: ViewportConfig,
    /// Outline options; `size` is replaced by the stroke width.
    pub smoothing: StrokeOptions,
    /// Maximum undo depth, unlimited when absent.
    pub history_limit: Option<usize>,
    pub autosave: AutoSaveConfig,
    pub clear_confirm_ms: u64,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            smoothing: StrokeOptions::default(),
            history_limit: None,
            autosave: AutoSaveConfig::default(),
            clear_confirm_ms: DEFAULT_CLEAR_CONFIRM_MS,
        }
    }
}

impl InkConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.viewport.validate()
    }
}
