//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::ValidationConfig;
use anyhow::{Context, Result};

/// Convert CLI arguments to `ValidationConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build `ValidationConfig` from CLI arguments. Settings from `--config`
    /// are the base; flags that are set override them.
    pub(crate) fn from_cli(cli: &Cli) -> Result<ValidationConfig> {
        let base = match &cli.config {
            Some(path) => ValidationConfig::from_path(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?,
            None => ValidationConfig::default(),
        };

        ValidationConfig::builder()
            .correct(base.correct || cli.correct)
            .require_channel(base.require_channel)
            .fail_fast(base.fail_fast || cli.fail_fast)
            .build()
            .context("Invalid configuration")
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if let Some(pattern) = &cli.pattern {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid file pattern '{}'", pattern))?;
        }

        if cli.fail_fast && !cli.correct && cli.config.is_none() {
            anyhow::bail!("--fail-fast requires --correct");
        }

        Ok(())
    }
}
