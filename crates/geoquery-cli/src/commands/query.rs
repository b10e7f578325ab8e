//! Query command implementation

use crate::cli::QueryArgs;
use crate::output::OutputWriter;
use crate::output_types::WriteOutput;
use anyhow::{Context, Result};
use geoquery_core::config::LayeredConfig;
use geoquery_core::formats::write_geojson;
use geoquery_core::query::{QueryOutput, QueryPlan, SortSpec};
use std::fs;

pub fn execute(args: QueryArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let dataset = super::read_document(&args.input)?;
    let crs = dataset.crs.unwrap_or(config.crs.value);

    let plan = QueryPlan {
        assign_id: args
            .assign_id
            .map(|field| field.unwrap_or_else(|| config.id_field.value.clone())),
        bbox: args.bbox.map(|bbox| bbox.unwrap_or(config.default_bbox.value)),
        filter: args.filter,
        sort: args.sort.map(|key| SortSpec {
            key,
            direction: args.order.unwrap_or(config.sort_direction.value),
        }),
        offset: args.offset,
        limit: args.limit,
        select: args.select,
        drop_geometry: args.drop_geometry,
    };
    tracing::debug!(?plan, "Running query");

    let result = plan.execute(dataset.collection)?;

    let Some(path) = args.output else {
        return match result {
            QueryOutput::Table(rows) if !output.is_json() => {
                output.records(&rows);
                Ok(())
            }
            other => output.result(other),
        };
    };

    match &result {
        QueryOutput::Features(collection) => write_geojson(&path, collection, true)?,
        QueryOutput::Table(rows) => {
            let text = serde_json::to_string_pretty(rows)?;
            fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }

    let summary = WriteOutput {
        input: args.input.display().to_string(),
        output: path.display().to_string(),
        crs,
        count: result.len(),
    };

    if output.is_json() {
        output.result(summary)?;
    } else {
        output.success(format!("Wrote {} results to {}", summary.count, summary.output));
        output.section("Query");
        output.kv("Input", &summary.input);
        output.kv("CRS", format!("EPSG:{}", summary.crs));
    }

    Ok(())
}
