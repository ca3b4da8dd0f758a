//! Loader and engine configuration

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Settings for the shared engine resource, handed to the engine factory
/// on first acquisition.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum simultaneously audible streams
    pub max_streams: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { max_streams: 16 }
    }
}

/// Clip loader configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Batch deadline in milliseconds. The timer is armed once per batch,
    /// before request iteration, so slow per-clip byte reads consume
    /// deadline budget.
    pub load_timeout_ms: u64,

    /// Decode priority attached to each submission
    pub submit_priority: u32,

    /// Shared engine resource settings
    pub engine: EngineSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            load_timeout_ms: 5000,
            submit_priority: 1,
            engine: EngineSettings::default(),
        }
    }
}

impl Config {
    /// Batch deadline as a [`Duration`]
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Load configuration from a TOML file. Missing keys fall back to
    /// their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}
