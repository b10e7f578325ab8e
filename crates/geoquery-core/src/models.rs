pub mod feature;
pub mod geometry;
pub mod value;

pub use feature::{AttributeTable, Feature, FeatureCollection, FeatureId};
pub use geometry::{Geometry, Position};
pub use value::{Properties, PropertyValue};
