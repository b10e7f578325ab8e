//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use geoquery_core::config::{CliConfigOverrides, LayeredConfig, CONFIG_FILE_NAME};
use std::path::Path;

/// Load layered configuration
///
/// An explicit `--config` file must exist; otherwise `geoquery.toml` in
/// the working directory is used when present.
pub fn load_config(config_path: Option<&Path>) -> Result<LayeredConfig> {
    let config = LayeredConfig::with_defaults();

    let config = match config_path {
        Some(path) => config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?,
        None if Path::new(CONFIG_FILE_NAME).is_file() => config
            .load_from_file(CONFIG_FILE_NAME)
            .context("Failed to load configuration file")?,
        None => config,
    };

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides
pub fn load_config_with_overrides(
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(config_path)?;
    config.update_from_cli(overrides);
    Ok(config)
}
