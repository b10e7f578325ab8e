//! Attribute type inference over schema-less features

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{FeatureCollection, PropertyValue};

/// Inferred scalar kind of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Boolean,
    Integer,
    Number,
    String,
    Null,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::Boolean => "boolean",
            AttributeType::Integer => "integer",
            AttributeType::Number => "number",
            AttributeType::String => "string",
            AttributeType::Null => "null",
        };
        f.write_str(name)
    }
}

/// Per-key descriptor, serialized as `{"type": "..."}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    #[serde(rename = "type")]
    pub kind: AttributeType,
}

/// Key -> descriptor, in first-seen key order
pub type AttributeSchema = IndexMap<String, AttributeDescriptor>;

/// Infer the type tag of a single value
///
/// Booleans are classified before integers; nested objects and arrays
/// are reported as strings.
pub fn infer_type(value: &PropertyValue) -> AttributeType {
    match value {
        PropertyValue::Bool(_) => AttributeType::Boolean,
        PropertyValue::Int(_) => AttributeType::Integer,
        PropertyValue::Float(_) => AttributeType::Number,
        PropertyValue::Null => AttributeType::Null,
        PropertyValue::Str(_) | PropertyValue::Json(_) => AttributeType::String,
    }
}

/// Infer a type for every property key seen in the collection
///
/// The first observed type is the candidate; any later disagreement
/// widens the key to `string` for good.
pub fn infer_attribute_schema(collection: &FeatureCollection) -> AttributeSchema {
    let mut schema = AttributeSchema::new();

    for feature in collection.iter() {
        for (key, value) in &feature.properties {
            let kind = infer_type(value);
            schema
                .entry(key.clone())
                .and_modify(|descriptor| {
                    if descriptor.kind != kind {
                        descriptor.kind = AttributeType::String;
                    }
                })
                .or_insert(AttributeDescriptor { kind });
        }
    }

    tracing::debug!(attributes = schema.len(), features = collection.len(), "Inferred attribute schema");
    schema
}
