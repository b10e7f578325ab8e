//! Devices command implementation

use crate::cli::DevicesArgs;
use crate::output::OutputWriter;
use crate::output_types::{ModelRow, StateUpdateOutput, WriteOutput};
use anyhow::{Context, Result};
use chrono::Utc;
use geoquery_core::devices::{
    apply_discovered_states, devices_to_feature_collection, group_by_product_model, DeviceRegistry,
    PlainJsonDecryptor,
};
use geoquery_core::formats::{write_geojson, DEFAULT_EPSG};
use geoquery_core::FeatureCollection;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub fn execute(args: DevicesArgs, output: &OutputWriter) -> Result<()> {
    let mut registry = DeviceRegistry::load(&args.registry)
        .with_context(|| format!("Failed to load device registry {}", args.registry.display()))?;

    if let Some(states_path) = &args.states {
        return refresh_states(&mut registry, &args.registry, states_path, output);
    }

    if args.list_models {
        let groups = group_by_product_model(&registry, None)?;
        let rows: Vec<ModelRow> = groups
            .iter()
            .map(|(model, devices)| ModelRow { model: model.clone(), devices: devices.len() })
            .collect();

        return if output.is_json() {
            output.result(rows)
        } else {
            output.table(rows);
            Ok(())
        };
    }

    let groups = group_by_product_model(&registry, args.model.as_deref())?;
    let layer = match &args.model {
        Some(model) => match groups.get(model) {
            Some(devices) => devices_to_feature_collection(devices),
            None => {
                output.warning(format!("No devices with product model {}", model));
                FeatureCollection::default()
            }
        },
        None => devices_to_feature_collection(&registry),
    };

    let Some(path) = &args.output else {
        return output.result(layer);
    };

    write_geojson(path, &layer, true)?;
    if output.is_json() {
        output.result(WriteOutput {
            input: args.registry.display().to_string(),
            output: path.display().to_string(),
            crs: DEFAULT_EPSG,
            count: layer.len(),
        })
    } else {
        output.success(format!("Wrote {} devices to {}", layer.len(), path.display()));
        Ok(())
    }
}

fn refresh_states(
    registry: &mut DeviceRegistry,
    registry_path: &Path,
    states_path: &Path,
    output: &OutputWriter,
) -> Result<()> {
    let content = fs::read_to_string(states_path)
        .with_context(|| format!("Failed to read {}", states_path.display()))?;
    let discovered: IndexMap<String, Map<String, Value>> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON object of device payloads", states_path.display()))?;

    let update = apply_discovered_states(registry, discovered, &PlainJsonDecryptor, Utc::now())?;
    registry.save(registry_path)?;

    for device_id in &update.unknown {
        output.warning(format!("Device {} not found in registry", device_id));
    }

    if output.is_json() {
        output.result(StateUpdateOutput {
            registry: registry_path.display().to_string(),
            updated: update.updated,
            unknown: update.unknown,
        })
    } else {
        output.success(format!("Updated {} devices in {}", update.updated.len(), registry_path.display()));
        if update.updated.is_empty() {
            output.info("No discovered device matched the registry");
        }
        Ok(())
    }
}
