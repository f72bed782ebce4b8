//! Runtime configuration
//!
//! Loaded from an optional JSON file; every field has a default so an
//! empty object `{}` is a valid config.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MagicKnobError, Result};
use crate::training::DEFAULT_LEARNING_RATE;

/// Overrides `model_dir`
pub const MODEL_DIR_ENV: &str = "MAGICKNOB_MODEL_DIR";

/// Overrides `log_filter`
pub const LOG_FILTER_ENV: &str = "MAGICKNOB_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub learning_rate: f32,
    pub default_iterations: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            default_iterations: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for `*_dist_*.json` and `*_lpf2_*.json` models
    pub model_dir: PathBuf,
    /// Channels the processor allocates engines for
    pub num_channels: usize,
    /// Host block size used by offline rendering
    pub block_size: usize,
    pub trainer: TrainerConfig,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            num_channels: 2,
            block_size: 512,
            trainer: TrainerConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| MagicKnobError::FileUnreadable {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = env::var(MODEL_DIR_ENV) {
            self.model_dir = PathBuf::from(dir);
        }
        if let Ok(filter) = env::var(LOG_FILTER_ENV) {
            self.log_filter = filter;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_channels == 0 {
            return Err(invalid("num_channels must be at least 1"));
        }
        if self.block_size == 0 {
            return Err(invalid("block_size must be at least 1"));
        }
        // Descent runs on standardised inputs and is only stable below 1
        if !(self.trainer.learning_rate > 0.0 && self.trainer.learning_rate < 1.0) {
            return Err(invalid("trainer.learning_rate must be in (0, 1)"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> MagicKnobError {
    MagicKnobError::InvalidConfig {
        reason: reason.to_string(),
    }
}
