//! GeoJSON geometry representation.
//!
//! Coordinates are kept as plain nested sequences so documents round-trip
//! without loss (including any Z/M ordinates).

use serde::{Deserialize, Serialize};

/// A single coordinate position: `[x, y, ...]`
pub type Position = Vec<f64>;

/// GeoJSON geometry object
///
/// Unknown `type` tags deserialize to `Unsupported` instead of failing the
/// whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point { coordinates: vec![x, y] }
    }

    /// Create a LineString geometry
    pub fn line_string(coords: Vec<[f64; 2]>) -> Self {
        Geometry::LineString { coordinates: coords.into_iter().map(Vec::from).collect() }
    }

    /// Create a Polygon geometry
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon {
            coordinates: rings
                .into_iter()
                .map(|ring| ring.into_iter().map(Vec::from).collect())
                .collect(),
        }
    }

    /// Create a GeometryCollection
    pub fn collection(geometries: Vec<Geometry>) -> Self {
        Geometry::GeometryCollection { geometries }
    }

    /// GeoJSON type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
            Geometry::Unsupported => "Unsupported",
        }
    }
}
