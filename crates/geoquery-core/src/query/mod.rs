//! Feature collection query operations.
//!
//! Every operation takes a document and returns a new one, so a query is
//! a plain chain of calls:
//!
//! ```
//! use geoquery_core::query::{self, SortDirection};
//! use geoquery_core::{BBox, FeatureCollection};
//!
//! # fn run(doc: FeatureCollection) -> geoquery_core::Result<FeatureCollection> {
//! let doc = query::spatial_filter(doc, &BBox::new(-1.0, -1.0, 10.0, 10.0)?);
//! let doc = query::sql_filter(doc, "cat = 'A'")?;
//! let doc = query::sort_by(doc, "name", SortDirection::Ascending);
//! Ok(query::limit(query::offset(doc, 10), 10))
//! # }
//! ```
//!
//! Data-level anomalies never abort a query: features without geometry are
//! dropped by spatial filtering and features whose filter evaluation fails
//! (for example comparing a text value with `>` against a number) are
//! silently excluded. Only malformed filter strings are reported.
//!
//! [`QueryEngine`] wraps the same operations around a held document for
//! callers that prefer chaining on one object.

pub mod engine;
pub mod plan;

pub use engine::QueryEngine;
pub use plan::{QueryOutput, QueryPlan, SortSpec};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{GeoqueryError, Result};
use crate::filter::Predicate;
use crate::geo::{in_bbox, BBox};
use crate::models::{AttributeTable, Feature, FeatureCollection, FeatureId, PropertyValue};

/// Sort order for [`sort_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl FromStr for SortDirection {
    type Err = GeoqueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(GeoqueryError::ConfigInvalid {
                key: "sort_direction".to_string(),
                reason: format!("Invalid sort direction: {}. Use asc or desc", s),
            }),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

/// Keep features with at least one coordinate inside `bbox`
///
/// Features with no geometry are dropped. See [`in_bbox`] for the
/// coordinate-existence approximation.
pub fn spatial_filter(collection: FeatureCollection, bbox: &BBox) -> FeatureCollection {
    let before = collection.len();
    let result: FeatureCollection = collection
        .features
        .into_iter()
        .filter(|f| f.geometry.as_ref().is_some_and(|g| in_bbox(g, bbox)))
        .collect();

    tracing::debug!(%bbox, before, after = result.len(), "Applied spatial filter");
    result
}

/// Keep features whose properties satisfy a SQL-like filter string
pub fn sql_filter(collection: FeatureCollection, filter: &str) -> Result<FeatureCollection> {
    let predicate = Predicate::compile(filter).map_err(|e| e.into_query_error(filter))?;
    Ok(filter_with(collection, &predicate))
}

/// Keep features matching an already compiled predicate
pub fn filter_with(collection: FeatureCollection, predicate: &Predicate) -> FeatureCollection {
    let before = collection.len();
    let result: FeatureCollection = collection
        .features
        .into_iter()
        .filter(|f| predicate.matches(&f.properties))
        .collect();

    tracing::debug!(filter = predicate.source(), before, after = result.len(), "Applied attribute filter");
    result
}

/// Stable sort by the textual form of a property
///
/// Null and missing values are the smallest: first when ascending, last
/// when descending. Non-null values compare as strings, so `9` sorts
/// after `"10"`.
pub fn sort_by(mut collection: FeatureCollection, key: &str, direction: SortDirection) -> FeatureCollection {
    let sort_key = |feature: &Feature| -> Option<String> {
        feature.properties.get(key).filter(|v| !v.is_null()).map(|v| v.to_string())
    };

    collection.features.sort_by(|a, b| {
        let ordering: Ordering = sort_key(a).cmp(&sort_key(b));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    collection
}

/// Drop the first `n` features
pub fn offset(mut collection: FeatureCollection, n: usize) -> FeatureCollection {
    let n = n.min(collection.features.len());
    collection.features.drain(..n);
    collection
}

/// Keep at most the first `n` features
pub fn limit(mut collection: FeatureCollection, n: usize) -> FeatureCollection {
    collection.features.truncate(n);
    collection
}

/// Project every feature's properties to `keys`, dropping geometry
///
/// Key order follows each feature's own property order; keys a feature
/// lacks are simply absent from its row.
pub fn select_attributes<S: AsRef<str>>(collection: &FeatureCollection, keys: &[S]) -> AttributeTable {
    collection
        .iter()
        .map(|f| {
            f.properties
                .iter()
                .filter(|(k, _)| keys.iter().any(|wanted| wanted.as_ref() == k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .collect()
}

/// All properties of every feature, without geometry
pub fn drop_geometry(collection: &FeatureCollection) -> AttributeTable {
    collection.iter().map(|f| f.properties.clone()).collect()
}

/// Features whose `properties[key]` equals `value`, or `None` if none match
///
/// Integer and float values compare numerically.
pub fn identify_by_id(
    collection: &FeatureCollection,
    key: &str,
    value: &PropertyValue,
) -> Option<FeatureCollection> {
    let matches: Vec<Feature> = collection
        .iter()
        .filter(|f| f.properties.get(key).is_some_and(|v| v.loosely_equals(value)))
        .cloned()
        .collect();

    if matches.is_empty() {
        tracing::debug!(key, %value, "No feature matched identifier");
        return None;
    }

    Some(FeatureCollection::new(matches))
}

/// Number features 0..n in document order
///
/// Sets both `properties[field_name]` and the feature-level `id`.
pub fn assign_sequential_id(mut collection: FeatureCollection, field_name: &str) -> FeatureCollection {
    for (index, feature) in collection.features.iter_mut().enumerate() {
        feature.properties.insert(field_name.to_string(), PropertyValue::Int(index as i64));
        feature.id = Some(FeatureId::from(index));
    }
    collection
}
