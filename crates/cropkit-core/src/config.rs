//! Crop settings loaded from TOML.
//!
//! Every field has a default, so a config file only lists what it
//! overrides:
//!
//! ```toml
//! max_side_length = 1024
//! jpeg_quality = 90
//! storage_root = "/sdcard"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::DEFAULT_COMPRESS_QUALITY;
use crate::save::DEFAULT_SAVE_DIRECTORY;

/// Default bound on the decoded bitmap's constraining side.
pub const DEFAULT_MAX_SIDE_LENGTH: u32 = 2048;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings for one crop run. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Upper bound on the loaded bitmap's constraining side.
    pub max_side_length: u32,
    /// Constrain the shorter side instead of the longer one.
    pub use_min: bool,
    /// JPEG quality of saved output, 1-100.
    pub jpeg_quality: u8,
    /// Replace the source's index row and remove its file when possible.
    pub delete_original: bool,
    /// Fallback directory name under `storage_root`.
    pub default_save_directory: String,
    /// Root for the fallback directory. The working directory when unset.
    pub storage_root: Option<PathBuf>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            max_side_length: DEFAULT_MAX_SIDE_LENGTH,
            use_min: false,
            jpeg_quality: DEFAULT_COMPRESS_QUALITY,
            delete_original: false,
            default_save_directory: DEFAULT_SAVE_DIRECTORY.to_string(),
            storage_root: None,
        }
    }
}

impl CropConfig {
    /// Read and validate the config at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CropConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_side_length == 0 {
            return Err(ConfigError::Validation(
                "max_side_length must be positive".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Validation(
                "jpeg_quality must be 1-100".into(),
            ));
        }
        if self.default_save_directory.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_save_directory must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Root for the fallback save directory.
    pub fn storage_root(&self) -> PathBuf {
        self.storage_root.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
