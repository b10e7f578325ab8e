//! Smart-plug device registry adapter.
//!
//! A registry file maps a device key to its cloud metadata
//! (`ewelinkData`), user-maintained extras (coordinates, last refresh
//! time) and the last observed `state`. Registries are grouped by product
//! model and exported as GeoJSON point layers for the query engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::{GeoqueryError, Result};
use crate::models::{Feature, FeatureCollection, Geometry, Properties, PropertyValue};

pub mod payload;

pub use payload::{apply_discovered_states, merge_payload_fragments, PayloadDecryptor, PlainJsonDecryptor, StateUpdate};

/// Model name used when `ewelinkData.productModel` is missing
pub const UNKNOWN_MODEL: &str = "UNKNOWN";

/// User-maintained device metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<f64>,

    /// Time of the last state refresh (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// One registry entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(default)]
    pub extra: DeviceExtra,

    #[serde(rename = "ewelinkData", default)]
    pub ewelink_data: Map<String, Value>,

    /// Last observed state; absent until the first refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl DeviceRecord {
    pub fn product_model(&self) -> &str {
        self.ewelink_data
            .get("productModel")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_MODEL)
    }

    /// Device id as reported by LAN discovery
    pub fn device_id(&self) -> Option<&str> {
        self.ewelink_data.get("deviceid").and_then(Value::as_str)
    }

    pub fn device_key(&self) -> Option<&str> {
        self.ewelink_data.get("devicekey").and_then(Value::as_str)
    }

    /// `[long, lat]` when both are known
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.extra.long?, self.extra.lat?))
    }
}

/// Ordered map of device key to record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRegistry {
    devices: IndexMap<String, DeviceRecord>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let registry: Self = serde_json::from_str(&content).map_err(|e| GeoqueryError::FormatParse {
            format: "device registry".to_string(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), devices = registry.len(), "Loaded device registry");
        Ok(registry)
    }

    /// Write the registry as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| GeoqueryError::Serialization(format!("Failed to serialize device registry: {}", e)))?;
        fs::write(path, content)?;
        tracing::info!(path = %path.display(), devices = self.len(), "Saved device registry");
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, record: DeviceRecord) -> Option<DeviceRecord> {
        self.devices.insert(key.into(), record)
    }

    pub fn get(&self, key: &str) -> Option<&DeviceRecord> {
        self.devices.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut DeviceRecord> {
        self.devices.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeviceRecord)> {
        self.devices.iter()
    }

    /// Fail with `DeviceMissingState` on the first device never refreshed
    pub fn ensure_states(&self) -> Result<()> {
        match self.devices.iter().find(|(_, record)| record.state.is_none()) {
            Some((key, _)) => Err(GeoqueryError::DeviceMissingState { device_id: key.clone() }),
            None => Ok(()),
        }
    }
}

impl FromIterator<(String, DeviceRecord)> for DeviceRegistry {
    fn from_iter<I: IntoIterator<Item = (String, DeviceRecord)>>(iter: I) -> Self {
        Self { devices: iter.into_iter().collect() }
    }
}

/// Distinct product models in registry order
pub fn product_models(registry: &DeviceRegistry) -> Result<Vec<String>> {
    Ok(group_by_product_model(registry, None)?.into_keys().collect())
}

/// Split the registry by product model, optionally keeping only `model`
///
/// Every device must have been refreshed, including the ones the model
/// filter drops.
pub fn group_by_product_model(
    registry: &DeviceRegistry,
    model: Option<&str>,
) -> Result<IndexMap<String, DeviceRegistry>> {
    registry.ensure_states()?;

    let mut groups: IndexMap<String, DeviceRegistry> = IndexMap::new();
    for (key, record) in registry.iter() {
        let product_model = record.product_model();
        if model.is_some_and(|wanted| wanted != product_model) {
            continue;
        }
        groups
            .entry(product_model.to_string())
            .or_default()
            .insert(key.clone(), record.clone());
    }

    Ok(groups)
}

/// One Point feature per device with known coordinates
///
/// Properties are `id`, `datetime`, `ewelinkData` and `state`.
pub fn devices_to_feature_collection(devices: &DeviceRegistry) -> FeatureCollection {
    let collection: FeatureCollection = devices
        .iter()
        .filter_map(|(key, record)| {
            let (long, lat) = record.position()?;

            let mut properties = Properties::new();
            properties.insert("id".to_string(), PropertyValue::from(key.as_str()));
            properties.insert(
                "datetime".to_string(),
                record.extra.datetime.as_deref().map_or(PropertyValue::Null, PropertyValue::from),
            );
            properties.insert(
                "ewelinkData".to_string(),
                PropertyValue::from(Value::Object(record.ewelink_data.clone())),
            );
            properties.insert(
                "state".to_string(),
                PropertyValue::from(record.state.clone().unwrap_or_else(|| Value::Object(Map::new()))),
            );

            Some(Feature::new(Geometry::point(long, lat), properties))
        })
        .collect();

    let skipped = devices.len() - collection.len();
    if skipped > 0 {
        tracing::debug!(skipped, "Skipped devices without coordinates");
    }
    collection
}
