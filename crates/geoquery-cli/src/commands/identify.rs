//! Identify command implementation

use crate::cli::IdentifyArgs;
use crate::output::OutputWriter;
use anyhow::{bail, Result};
use geoquery_core::config::LayeredConfig;
use geoquery_core::{PropertyValue, QueryEngine};

pub fn execute(args: IdentifyArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let dataset = super::read_document(&args.input)?;
    let field = args.field.unwrap_or_else(|| config.id_field.value.clone());
    let value = PropertyValue::parse_literal(&args.value);

    let mut engine = QueryEngine::with_document(dataset.collection);
    if args.assign_id {
        engine.assign_sequential_id(&field)?;
    }

    match engine.identify_by_id(&field, &value)? {
        Some(found) => output.result(found),
        None => bail!("No feature has {} = {}", field, args.value),
    }
}
