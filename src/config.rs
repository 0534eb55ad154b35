//! Configuration for metadata validation runs

use crate::error::{MetadataError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for validating a metadata model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Repair inconsistent images in place instead of only reporting them
    pub correct: bool,

    /// Pixel data needs at least one channel; an image without channels is
    /// then invalid (and uncorrectable when `SizeC` is 0)
    pub require_channel: bool,

    /// Abort a model-wide run at the first uncorrectable image instead of
    /// recording it and continuing with the next one
    pub fail_fast: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            correct: false,
            require_channel: true,
            fail_fast: false,
        }
    }
}

impl ValidationConfig {
    /// Create a new configuration builder
    ///
    /// ```rust
    /// use ome_metatools::ValidationConfig;
    ///
    /// let config = ValidationConfig::builder()
    ///     .correct(true)
    ///     .fail_fast(true)
    ///     .build()
    ///     .unwrap();
    /// assert!(config.correct);
    /// ```
    #[must_use]
    pub fn builder() -> ValidationConfigBuilder {
        ValidationConfigBuilder::default()
    }

    /// Read-only validation with default settings
    #[must_use]
    pub fn check_only() -> Self {
        Self::default()
    }

    /// Validation with in-place correction
    #[must_use]
    pub fn correcting() -> Self {
        Self {
            correct: true,
            ..Self::default()
        }
    }

    /// Validate configuration consistency
    ///
    /// # Errors
    /// - `fail_fast` without `correct`: read-only runs never abort
    pub fn validate(&self) -> Result<()> {
        if self.fail_fast && !self.correct {
            return Err(MetadataError::invalid_config(
                "fail_fast only applies when correction is enabled",
            ));
        }
        Ok(())
    }

    /// Parse a configuration from TOML text; missing keys take defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MetadataError::file_io_error("read config", path, e))?;
        Self::from_toml_str(&text)
    }
}

/// Builder for `ValidationConfig`
#[derive(Debug, Default)]
pub struct ValidationConfigBuilder {
    config: ValidationConfig,
}

impl ValidationConfigBuilder {
    /// Enable or disable in-place correction
    #[must_use]
    pub fn correct(mut self, correct: bool) -> Self {
        self.config.correct = correct;
        self
    }

    /// Require at least one channel per image
    #[must_use]
    pub fn require_channel(mut self, require: bool) -> Self {
        self.config.require_channel = require;
        self
    }

    /// Abort at the first uncorrectable image
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.fail_fast = fail_fast;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ValidationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
