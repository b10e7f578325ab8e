//! Stateful query engine holding one document.
//!
//! Each operation replaces the held document with its result. One engine
//! serves one query chain; it is not meant to be shared between
//! concurrent requests.

use crate::error::{GeoqueryError, Result};
use crate::filter::Predicate;
use crate::geo::BBox;
use crate::models::{AttributeTable, Feature, FeatureCollection, PropertyValue};
use crate::schema::{infer_attribute_schema, AttributeSchema};

use super::SortDirection;

#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    document: Option<FeatureCollection>,
}

impl QueryEngine {
    /// Create an engine with no document loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine holding `document`
    pub fn with_document(document: FeatureCollection) -> Self {
        Self { document: Some(document) }
    }

    /// Replace the held document
    pub fn load(&mut self, document: FeatureCollection) {
        self.document = Some(document);
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// Current document
    pub fn document(&self) -> Result<&FeatureCollection> {
        self.document.as_ref().ok_or(GeoqueryError::NoDocumentLoaded)
    }

    /// Take the current document out, leaving the engine empty
    pub fn into_document(self) -> Result<FeatureCollection> {
        self.document.ok_or(GeoqueryError::NoDocumentLoaded)
    }

    fn replace_with(
        &mut self,
        op: impl FnOnce(FeatureCollection) -> FeatureCollection,
    ) -> Result<&FeatureCollection> {
        let current = self.document.take().ok_or(GeoqueryError::NoDocumentLoaded)?;
        Ok(self.document.insert(op(current)))
    }

    pub fn spatial_filter(&mut self, bbox: &BBox) -> Result<&FeatureCollection> {
        self.replace_with(|doc| super::spatial_filter(doc, bbox))
    }

    /// Apply a SQL-like filter; a syntax error leaves the document untouched
    pub fn sql_filter(&mut self, filter: &str) -> Result<&FeatureCollection> {
        self.document()?;
        let predicate = Predicate::compile(filter).map_err(|e| e.into_query_error(filter))?;
        self.replace_with(|doc| super::filter_with(doc, &predicate))
    }

    pub fn sort_by(&mut self, key: &str, direction: SortDirection) -> Result<&FeatureCollection> {
        self.replace_with(|doc| super::sort_by(doc, key, direction))
    }

    pub fn offset(&mut self, n: usize) -> Result<&FeatureCollection> {
        self.replace_with(|doc| super::offset(doc, n))
    }

    pub fn limit(&mut self, n: usize) -> Result<&FeatureCollection> {
        self.replace_with(|doc| super::limit(doc, n))
    }

    /// Project properties to `keys` and return them as rows
    ///
    /// The held document keeps the projected properties with geometry
    /// removed, so later calls see the same columns.
    pub fn select_attributes<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<AttributeTable> {
        let rows = super::select_attributes(self.document()?, keys);
        self.strip_geometry(rows.clone())?;
        Ok(rows)
    }

    /// Return all properties as rows and remove geometry from the document
    pub fn drop_geometry(&mut self) -> Result<AttributeTable> {
        let rows = super::drop_geometry(self.document()?);
        self.strip_geometry(rows.clone())?;
        Ok(rows)
    }

    fn strip_geometry(&mut self, rows: AttributeTable) -> Result<()> {
        self.replace_with(|doc| {
            doc.features
                .into_iter()
                .zip(rows)
                .map(|(feature, properties)| Feature { id: feature.id, geometry: None, properties })
                .collect()
        })?;
        Ok(())
    }

    /// Narrow the document to features with `properties[key] == value`
    ///
    /// Returns `None` and keeps the document when nothing matches.
    pub fn identify_by_id(&mut self, key: &str, value: &PropertyValue) -> Result<Option<&FeatureCollection>> {
        let found = super::identify_by_id(self.document()?, key, value);
        match found {
            Some(found) => Ok(Some(self.document.insert(found))),
            None => Ok(None),
        }
    }

    pub fn assign_sequential_id(&mut self, field_name: &str) -> Result<&FeatureCollection> {
        self.replace_with(|doc| super::assign_sequential_id(doc, field_name))
    }

    /// Infer attribute types of the current document
    pub fn infer_attribute_schema(&self) -> Result<AttributeSchema> {
        Ok(infer_attribute_schema(self.document()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Geometry, Properties};
    use serde_json::json;

    fn engine() -> QueryEngine {
        let features = vec![(0.0, "A"), (5.0, "B"), (20.0, "A")]
            .into_iter()
            .map(|(xy, cat)| {
                let properties: Properties = serde_json::from_value(json!({"cat": cat})).unwrap();
                Feature::new(Geometry::point(xy, xy), properties)
            })
            .collect();
        QueryEngine::with_document(features)
    }

    #[test]
    fn test_operations_require_document() {
        let mut empty = QueryEngine::new();

        assert!(matches!(empty.document(), Err(GeoqueryError::NoDocumentLoaded)));
        assert!(matches!(empty.limit(1), Err(GeoqueryError::NoDocumentLoaded)));
        assert!(matches!(empty.sql_filter("cat = 'A'"), Err(GeoqueryError::NoDocumentLoaded)));
        assert!(matches!(empty.drop_geometry(), Err(GeoqueryError::NoDocumentLoaded)));
        assert!(matches!(empty.infer_attribute_schema(), Err(GeoqueryError::NoDocumentLoaded)));
        assert!(!empty.is_loaded());
    }

    #[test]
    fn test_chained_filters_replace_document() {
        let mut engine = engine();
        engine.spatial_filter(&BBox::new(-1.0, -1.0, 10.0, 10.0).unwrap()).unwrap();
        assert_eq!(engine.document().unwrap().len(), 2);

        let result = engine.sql_filter("cat = 'A'").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.features[0].geometry, Some(Geometry::point(0.0, 0.0)));
    }

    #[test]
    fn test_syntax_error_keeps_document() {
        let mut engine = engine();
        assert!(engine.sql_filter("cat = (").is_err());
        assert_eq!(engine.document().unwrap().len(), 3);
    }

    #[test]
    fn test_identify_without_match_keeps_document() {
        let mut engine = engine();
        engine.assign_sequential_id("ID_OGR").unwrap();

        assert!(engine.identify_by_id("ID_OGR", &PropertyValue::Int(10)).unwrap().is_none());
        assert_eq!(engine.document().unwrap().len(), 3);

        let found = engine.identify_by_id("ID_OGR", &PropertyValue::Int(2)).unwrap().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(engine.document().unwrap().len(), 1);
    }

    #[test]
    fn test_select_attributes_strips_geometry() {
        let mut engine = engine();
        engine.assign_sequential_id("fid").unwrap();

        let rows = engine.select_attributes(&["fid"]).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["fid"], PropertyValue::Int(1));
        assert!(!rows[1].contains_key("cat"));

        let doc = engine.document().unwrap();
        assert!(doc.iter().all(|f| f.geometry.is_none()));
        assert!(doc.iter().all(|f| f.properties.len() == 1));
    }

    #[test]
    fn test_schema_reflects_current_document() {
        let mut engine = engine();
        assert_eq!(engine.infer_attribute_schema().unwrap().len(), 1);

        engine.assign_sequential_id("fid").unwrap();
        assert_eq!(engine.infer_attribute_schema().unwrap().len(), 2);
    }
}
