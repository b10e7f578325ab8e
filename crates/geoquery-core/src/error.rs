//! Error types for GeoQuery

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoqueryError {
    // Query engine errors
    #[error("No GeoJSON document loaded. Load a FeatureCollection before querying")]
    NoDocumentLoaded,

    #[error("Invalid filter syntax in '{filter}' at position {position}: {reason}")]
    InvalidFilterSyntax {
        filter: String,
        position: usize,
        reason: String,
    },

    #[error("Invalid bounding box: {reason}")]
    InvalidBoundingBox { reason: String },

    // Format errors
    #[error("Unsupported format: {extension}. Supported formats: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("Failed to parse {format} document {path}: {reason}")]
    FormatParse {
        format: String,
        path: PathBuf,
        reason: String,
    },

    // Device registry errors
    #[error("Device {device_id} has no state. Refresh device states first")]
    DeviceMissingState { device_id: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, GeoqueryError>;
