use serde::{Deserialize, Deserializer, Serialize};

use super::geometry::Geometry;
use super::value::Properties;

/// Feature identifier (GeoJSON allows strings or numbers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    String(String),
    Number(serde_json::Number),
}

impl From<usize> for FeatureId {
    fn from(value: usize) -> Self {
        FeatureId::Number(serde_json::Number::from(value as u64))
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        FeatureId::String(value.to_string())
    }
}

/// GeoJSON Feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,

    /// None for features without geometry (`"geometry": null`)
    #[serde(default)]
    pub geometry: Option<Geometry>,

    #[serde(default, deserialize_with = "nullable_properties")]
    pub properties: Properties,
}

impl Feature {
    /// Create a feature with geometry
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self { id: None, geometry: Some(geometry), properties }
    }

    /// Create a feature without geometry
    pub fn without_geometry(properties: Properties) -> Self {
        Self { id: None, geometry: None, properties }
    }

    pub fn with_id(mut self, id: impl Into<FeatureId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// GeoJSON FeatureCollection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Tabular projection of a collection: property maps without geometry
pub type AttributeTable = Vec<Properties>;

/// `"properties": null` is valid GeoJSON and means no properties
fn nullable_properties<'de, D>(deserializer: D) -> Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Properties>::deserialize(deserializer).map(Option::unwrap_or_default)
}
