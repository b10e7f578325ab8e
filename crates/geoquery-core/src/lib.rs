//! GeoQuery Core - GeoJSON query engine, data model and adapters
//!
//! This crate holds the in-memory GeoJSON query engine (bounding-box
//! filtering, SQL-like predicates, sorting, paging, projection and schema
//! inference) together with the adapters that feed it documents.

pub mod config;
pub mod devices;
pub mod error;
pub mod filter;
pub mod formats;
pub mod geo;
pub mod models;
pub mod query;
pub mod schema;

pub use error::{GeoqueryError, Result};
pub use filter::Predicate;
pub use geo::{in_bbox, BBox};
pub use models::{Feature, FeatureCollection, FeatureId, Geometry, Properties, PropertyValue};
pub use query::{QueryEngine, QueryOutput, QueryPlan, SortDirection};
pub use schema::{infer_attribute_schema, AttributeSchema, AttributeType};
