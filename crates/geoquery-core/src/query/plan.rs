//! Declarative query pipeline.
//!
//! A plan can be built in code or deserialized (TOML/JSON) and runs its
//! steps in a fixed order: assign ids, spatial filter, attribute filter,
//! sort, offset, limit, projection.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::Predicate;
use crate::geo::BBox;
use crate::models::{AttributeTable, FeatureCollection};

use super::SortDirection;

/// Sort step of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPlan {
    /// Number features in source order under this property name
    pub assign_id: Option<String>,
    pub bbox: Option<BBox>,
    /// SQL-like attribute filter
    pub filter: Option<String>,
    pub sort: Option<SortSpec>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    /// Project to these property keys (drops geometry)
    pub select: Option<Vec<String>>,
    /// Return all properties without geometry
    pub drop_geometry: bool,
}

/// Result of running a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Features(FeatureCollection),
    Table(AttributeTable),
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Features(fc) => fc.len(),
            QueryOutput::Table(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign_id(mut self, field_name: impl Into<String>) -> Self {
        self.assign_id = Some(field_name.into());
        self
    }

    pub fn bbox(mut self, bbox: BBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec { key: key.into(), direction });
        self
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn select<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn drop_geometry(mut self) -> Self {
        self.drop_geometry = true;
        self
    }

    /// Run the plan against `collection`
    ///
    /// The filter is compiled before any step runs, so a malformed filter
    /// fails the whole plan without partial work.
    pub fn execute(&self, collection: FeatureCollection) -> Result<QueryOutput> {
        let predicate = self
            .filter
            .as_deref()
            .map(|f| Predicate::compile(f).map_err(|e| e.into_query_error(f)))
            .transpose()?;

        let mut doc = collection;

        if let Some(field) = &self.assign_id {
            doc = super::assign_sequential_id(doc, field);
        }
        if let Some(bbox) = &self.bbox {
            doc = super::spatial_filter(doc, bbox);
        }
        if let Some(predicate) = &predicate {
            doc = super::filter_with(doc, predicate);
        }
        if let Some(sort) = &self.sort {
            doc = super::sort_by(doc, &sort.key, sort.direction);
        }
        if let Some(n) = self.offset {
            doc = super::offset(doc, n);
        }
        if let Some(n) = self.limit {
            doc = super::limit(doc, n);
        }

        let output = match &self.select {
            Some(keys) => QueryOutput::Table(super::select_attributes(&doc, keys)),
            None if self.drop_geometry => QueryOutput::Table(super::drop_geometry(&doc)),
            None => QueryOutput::Features(doc),
        };

        tracing::debug!(results = output.len(), "Executed query plan");
        Ok(output)
    }
}
