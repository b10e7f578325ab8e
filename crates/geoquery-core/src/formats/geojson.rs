//! GeoJSON reader and writer

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use super::{FormatDataset, FormatReader};
use crate::error::{GeoqueryError, Result};
use crate::models::{Feature, FeatureCollection, Geometry, Properties};

const FORMAT_NAME: &str = "GeoJSON";

/// GeoJSON format reader
///
/// Accepts a FeatureCollection, a single Feature or a bare Geometry; the
/// latter two are wrapped into a one-feature collection.
pub struct GeoJsonReader;

impl FormatReader for GeoJsonReader {
    fn read(&self, path: &Path) -> Result<FormatDataset> {
        let content = fs::read_to_string(path)?;
        self.parse(&content, path)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["geojson", "json"]
    }

    fn format_name(&self) -> &str {
        FORMAT_NAME
    }
}

impl GeoJsonReader {
    /// Parse GeoJSON text; `path` names the dataset and appears in errors
    pub fn parse(&self, content: &str, path: &Path) -> Result<FormatDataset> {
        let parse_error = |reason: String| GeoqueryError::FormatParse {
            format: FORMAT_NAME.to_string(),
            path: path.to_path_buf(),
            reason,
        };

        let document: ::geojson::GeoJson = content.parse().map_err(|e: ::geojson::Error| parse_error(e.to_string()))?;

        let (collection, crs) = match &document {
            ::geojson::GeoJson::FeatureCollection(fc) => {
                let crs = fc
                    .foreign_members
                    .as_ref()
                    .and_then(|fm| fm.get("crs"))
                    .and_then(extract_epsg_from_crs);
                (convert::<FeatureCollection>(fc).map_err(parse_error)?, crs)
            }
            ::geojson::GeoJson::Feature(feature) => {
                let feature = convert::<Feature>(feature).map_err(parse_error)?;
                (FeatureCollection::new(vec![feature]), None)
            }
            ::geojson::GeoJson::Geometry(geometry) => {
                let geometry = convert::<Geometry>(geometry).map_err(parse_error)?;
                (FeatureCollection::new(vec![Feature::new(geometry, Properties::new())]), None)
            }
        };

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        tracing::debug!(name = %name, features = collection.len(), crs = ?crs, "Parsed GeoJSON document");

        Ok(FormatDataset { name, format_name: FORMAT_NAME.to_string(), crs, collection })
    }
}

/// Re-read a validated `geojson` value as one of our model types
fn convert<T: DeserializeOwned>(value: &impl serde::Serialize) -> std::result::Result<T, String> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|e| e.to_string())
}

/// Extract the EPSG code from a legacy `crs` member
///
/// Handles both `EPSG:3857` and `urn:ogc:def:crs:EPSG::3857`.
fn extract_epsg_from_crs(crs: &serde_json::Value) -> Option<u32> {
    crs.get("properties")?
        .get("name")?
        .as_str()?
        .rsplit(':')
        .next()?
        .parse()
        .ok()
}

/// Serialize a collection as GeoJSON text
pub fn to_geojson_string(collection: &FeatureCollection, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(collection)
    } else {
        serde_json::to_string(collection)
    };
    text.map_err(|e| GeoqueryError::Serialization(format!("Failed to serialize GeoJSON: {}", e)))
}

/// Write a collection to `path` as GeoJSON
pub fn write_geojson(path: &Path, collection: &FeatureCollection, pretty: bool) -> Result<()> {
    let text = to_geojson_string(collection, pretty)?;
    fs::write(path, text)?;
    tracing::info!(path = %path.display(), features = collection.len(), "Wrote GeoJSON document");
    Ok(())
}
