//! Command implementations

mod config;
mod devices;
mod identify;
mod query;
mod schema;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use geoquery_core::config::CliConfigOverrides;
use geoquery_core::formats::{FormatDataset, FormatRegistry};
use std::path::Path;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let overrides = CliConfigOverrides {
        crs: cli.crs,
        ..Default::default()
    };
    let config = load_config_with_overrides(cli.config.as_deref(), overrides)?;

    match cli.command {
        Commands::Query(args) => query::execute(args, &config, &output),
        Commands::Schema(args) => schema::execute(args, &output),
        Commands::Identify(args) => identify::execute(args, &config, &output),
        Commands::Devices(args) => devices::execute(args, &output),
        Commands::Config => config::execute(&config, &output),
    }
}

/// Read an input document with the reader matching its extension
fn read_document(path: &Path) -> Result<FormatDataset> {
    FormatRegistry::with_defaults()
        .read(path)
        .with_context(|| format!("Failed to read {}", path.display()))
}
