//! LAN discovery payloads and state refresh

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::DeviceRegistry;
use crate::error::{GeoqueryError, Result};

/// Fragment keys, in concatenation order
const FRAGMENT_KEYS: [&str; 3] = ["data1", "data2", "data3"];

/// Decodes the `data` field of a discovery payload
///
/// Implementations replace `payload["data"]` with the decoded JSON and
/// return the payload.
pub trait PayloadDecryptor {
    fn decrypt(&self, payload: Map<String, Value>, device_key: &str) -> Result<Map<String, Value>>;
}

/// Decoder for devices that publish `data` as plain JSON text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainJsonDecryptor;

impl PayloadDecryptor for PlainJsonDecryptor {
    fn decrypt(&self, mut payload: Map<String, Value>, _device_key: &str) -> Result<Map<String, Value>> {
        let decoded = match payload.get("data") {
            Some(Value::String(text)) if text.trim().is_empty() => Value::Object(Map::new()),
            Some(Value::String(text)) => serde_json::from_str(text)
                .map_err(|e| GeoqueryError::Serialization(format!("Invalid device payload: {}", e)))?,
            _ => return Ok(payload),
        };
        payload.insert("data".to_string(), decoded);
        Ok(payload)
    }
}

/// Join `data1`, `data2`, `data3` into `data`
///
/// Fragments are taken in order up to the first missing one and removed
/// from the payload. Returns whether anything was merged.
pub fn merge_payload_fragments(payload: &mut Map<String, Value>) -> bool {
    let mut merged = String::new();
    let mut count = 0;

    for key in FRAGMENT_KEYS {
        match payload.get(key) {
            Some(Value::String(fragment)) => merged.push_str(fragment),
            _ => break,
        }
        payload.remove(key);
        count += 1;
    }

    if count > 0 {
        payload.insert("data".to_string(), Value::String(merged));
    }
    count > 0
}

/// Outcome of [`apply_discovered_states`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    /// Registry keys whose state was replaced
    pub updated: Vec<String>,
    /// Discovered device ids with no registry entry
    pub unknown: Vec<String>,
}

/// Store discovery results as device states
///
/// `discovered` is keyed by device id (`ewelinkData.deviceid`). Each
/// payload has its fragments merged, is decrypted when it carries `data`
/// and becomes the device `state`; `extra.datetime` is set to `now`.
///
/// Every payload is decoded before any device is touched, so a decode
/// failure returns the error with the registry unchanged.
pub fn apply_discovered_states(
    registry: &mut DeviceRegistry,
    discovered: IndexMap<String, Map<String, Value>>,
    decryptor: &dyn PayloadDecryptor,
    now: DateTime<Utc>,
) -> Result<StateUpdate> {
    let by_device_id: HashMap<String, String> = registry
        .iter()
        .filter_map(|(key, record)| Some((record.device_id()?.to_string(), key.clone())))
        .collect();

    let mut update = StateUpdate::default();
    let mut states: Vec<(String, Value)> = Vec::with_capacity(discovered.len());

    for (device_id, mut payload) in discovered {
        let Some(key) = by_device_id.get(&device_id) else {
            tracing::warn!(device_id = %device_id, "Discovered device not found in registry");
            update.unknown.push(device_id);
            continue;
        };

        merge_payload_fragments(&mut payload);
        if payload.contains_key("data") {
            match registry.get(key).and_then(|record| record.device_key()) {
                Some(device_key) => {
                    payload = decryptor.decrypt(payload, device_key).map_err(|e| {
                        tracing::warn!(device_id = %device_id, error = %e, "Failed to decode device payload");
                        e
                    })?;
                }
                None => tracing::warn!(device_id = %device_id, "No device key; storing payload undecoded"),
            }
        }

        states.push((key.clone(), Value::Object(payload)));
    }

    let timestamp = now.to_rfc3339();
    for (key, state) in states {
        if let Some(record) = registry.get_mut(&key) {
            record.state = Some(state);
            record.extra.datetime = Some(timestamp.clone());
            update.updated.push(key);
        }
    }

    tracing::debug!(updated = update.updated.len(), unknown = update.unknown.len(), "Applied device states");
    Ok(update)
}
