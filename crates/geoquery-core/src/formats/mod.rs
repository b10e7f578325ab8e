//! Format abstraction layer
//!
//! Each input format implements [`FormatReader`]; [`FormatRegistry`]
//! picks a reader from the file extension.

use std::path::Path;

use crate::error::{GeoqueryError, Result};
use crate::models::FeatureCollection;

pub mod geojson;

pub use self::geojson::{to_geojson_string, write_geojson, GeoJsonReader};

/// Default CRS when a document does not declare one (WGS84)
pub const DEFAULT_EPSG: u32 = 4326;

/// Reader for one input format
pub trait FormatReader: Send + Sync {
    /// Read a document from the given path
    fn read(&self, path: &Path) -> Result<FormatDataset>;

    /// Supported file extensions (e.g., ["geojson", "json"])
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable format name
    fn format_name(&self) -> &str;
}

/// Document loaded by a [`FormatReader`]
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDataset {
    /// Dataset name, taken from the file stem
    pub name: String,

    pub format_name: String,

    /// EPSG code declared by the document, if any
    pub crs: Option<u32>,

    pub collection: FeatureCollection,
}

impl FormatDataset {
    /// Declared EPSG code, falling back to [`DEFAULT_EPSG`]
    pub fn epsg(&self) -> u32 {
        self.crs.unwrap_or(DEFAULT_EPSG)
    }
}

/// Registry of format readers keyed by extension
pub struct FormatRegistry {
    readers: Vec<Box<dyn FormatReader>>,
}

impl FormatRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry with every built-in reader
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GeoJsonReader));
        registry
    }

    pub fn register(&mut self, reader: Box<dyn FormatReader>) {
        self.readers.push(reader);
    }

    /// Find the reader for `path` by its extension (case-insensitive)
    pub fn detect_format(&self, path: &Path) -> Result<&dyn FormatReader> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| GeoqueryError::UnsupportedFormat {
                extension: "none".to_string(),
                supported: self.supported_formats(),
            })?;

        self.readers
            .iter()
            .find(|r| r.supported_extensions().contains(&extension.as_str()))
            .map(|r| r.as_ref())
            .ok_or_else(|| GeoqueryError::UnsupportedFormat {
                extension,
                supported: self.supported_formats(),
            })
    }

    /// Detect the format of `path` and read it
    pub fn read(&self, path: &Path) -> Result<FormatDataset> {
        let reader = self.detect_format(path)?;
        tracing::debug!(path = %path.display(), format = reader.format_name(), "Reading document");
        reader.read(path)
    }

    /// All registered extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn readers(&self) -> &[Box<dyn FormatReader>] {
        &self.readers
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
