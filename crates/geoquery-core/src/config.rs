use crate::error::{GeoqueryError, Result};
use crate::geo::BBox;
use crate::query::SortDirection;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "geoquery.toml";

/// Property name used for sequential feature ids
pub const DEFAULT_ID_FIELD: &str = "ID_OGR";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    File,
    Environment,
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for GeoQuery
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// EPSG code reported for documents that declare none
    pub crs: ConfigValue<u32>,
    pub id_field: ConfigValue<String>,
    pub default_bbox: ConfigValue<BBox>,
    pub sort_direction: ConfigValue<SortDirection>,
}

impl LayeredConfig {
    pub fn with_defaults() -> Self {
        Self {
            crs: ConfigValue::new(4326, ConfigSource::Default),
            id_field: ConfigValue::new(DEFAULT_ID_FIELD.to_string(), ConfigSource::Default),
            default_bbox: ConfigValue::new(BBox::world(), ConfigSource::Default),
            sort_direction: ConfigValue::new(SortDirection::Ascending, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| GeoqueryError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file {}: {}", path.as_ref().display(), e),
        })?;

        let file_config: FileConfig = toml::from_str(&content).map_err(|e| GeoqueryError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to parse TOML: {}", e),
        })?;

        if let Some(crs) = file_config.crs {
            self.crs.update(crs, ConfigSource::File);
        }

        if let Some(id_field) = file_config.id_field {
            self.id_field.update(parse_id_field(&id_field)?, ConfigSource::File);
        }

        if let Some(bbox) = file_config.default_bbox {
            self.default_bbox.update(bbox, ConfigSource::File);
        }

        if let Some(direction) = file_config.sort_direction {
            self.sort_direction.update(direction, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    ///
    /// Invalid values are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        // GEOQUERY_CRS
        if let Ok(crs_str) = env::var("GEOQUERY_CRS") {
            match parse_crs(&crs_str) {
                Ok(crs) => self.crs.update(crs, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOQUERY_CRS value '{}': expected an EPSG code such as 4326 or EPSG:4326",
                    crs_str
                ),
            }
        }

        // GEOQUERY_ID_FIELD
        if let Ok(id_field) = env::var("GEOQUERY_ID_FIELD") {
            match parse_id_field(&id_field) {
                Ok(id_field) => self.id_field.update(id_field, ConfigSource::Environment),
                Err(_) => tracing::warn!("Invalid GEOQUERY_ID_FIELD value: field name must not be empty"),
            }
        }

        // GEOQUERY_BBOX
        if let Ok(bbox_str) = env::var("GEOQUERY_BBOX") {
            match bbox_str.parse::<BBox>() {
                Ok(bbox) => self.default_bbox.update(bbox, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOQUERY_BBOX value '{}': expected min_x,min_y,max_x,max_y",
                    bbox_str
                ),
            }
        }

        // GEOQUERY_SORT_DIRECTION
        if let Ok(direction_str) = env::var("GEOQUERY_SORT_DIRECTION") {
            match direction_str.parse::<SortDirection>() {
                Ok(direction) => self.sort_direction.update(direction, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOQUERY_SORT_DIRECTION value '{}': expected asc or desc",
                    direction_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(crs) = overrides.crs {
            self.crs.update(crs, ConfigSource::Cli);
        }

        if let Some(id_field) = overrides.id_field {
            self.id_field.update(id_field, ConfigSource::Cli);
        }

        if let Some(bbox) = overrides.default_bbox {
            self.default_bbox.update(bbox, ConfigSource::Cli);
        }

        if let Some(direction) = overrides.sort_direction {
            self.sort_direction.update(direction, ConfigSource::Cli);
        }
    }

    /// All configuration values with their sources, in declaration order
    pub fn to_inspection_map(&self) -> IndexMap<String, (String, ConfigSource)> {
        let mut map = IndexMap::new();

        map.insert("crs".to_string(), (format!("EPSG:{}", self.crs.value), self.crs.source));
        map.insert("id_field".to_string(), (self.id_field.value.clone(), self.id_field.source));
        map.insert(
            "default_bbox".to_string(),
            (self.default_bbox.value.to_string(), self.default_bbox.source),
        );
        map.insert(
            "sort_direction".to_string(),
            (self.sort_direction.value.to_string(), self.sort_direction.source),
        );

        map
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    crs: Option<u32>,
    id_field: Option<String>,
    default_bbox: Option<BBox>,
    sort_direction: Option<SortDirection>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub crs: Option<u32>,
    pub id_field: Option<String>,
    pub default_bbox: Option<BBox>,
    pub sort_direction: Option<SortDirection>,
}

/// Parse an EPSG code from `4326` or `EPSG:4326`
pub fn parse_crs(s: &str) -> Result<u32> {
    let trimmed = s.trim();
    let code = trimmed
        .strip_prefix("EPSG:")
        .or_else(|| trimmed.strip_prefix("epsg:"))
        .unwrap_or(trimmed);

    code.parse().map_err(|_| GeoqueryError::ConfigInvalid {
        key: "crs".to_string(),
        reason: format!("Invalid EPSG code: {}", s),
    })
}

fn parse_id_field(s: &str) -> Result<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(GeoqueryError::ConfigInvalid {
            key: "id_field".to_string(),
            reason: "Field name must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}
