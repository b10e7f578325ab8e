use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GeoqueryError, Result};
use crate::models::{Geometry, Position};

/// Axis-aligned bounding box `(minx, miny, maxx, maxy)`
///
/// Serialized as a four-element array, the GeoJSON `bbox` layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    /// Create a bounding box, rejecting inverted or non-finite bounds
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(GeoqueryError::InvalidBoundingBox {
                reason: "bounds must be finite numbers".to_string(),
            });
        }
        if min_x > max_x || min_y > max_y {
            return Err(GeoqueryError::InvalidBoundingBox {
                reason: format!(
                    "minimum exceeds maximum ({}, {}, {}, {})",
                    min_x, min_y, max_x, max_y
                ),
            });
        }

        Ok(Self { min_x, min_y, max_x, max_y })
    }

    /// Whole-world extent in geographic coordinates
    pub fn world() -> Self {
        Self { min_x: -180.0, min_y: -90.0, max_x: 180.0, max_y: 90.0 }
    }

    /// Inclusive on all four edges
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    fn contains_position(&self, position: &Position) -> bool {
        match position.as_slice() {
            [x, y, ..] => self.contains_point(*x, *y),
            _ => false,
        }
    }

    fn contains_any<'a>(&self, mut positions: impl Iterator<Item = &'a Position>) -> bool {
        positions.any(|p| self.contains_position(p))
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::world()
    }
}

impl TryFrom<[f64; 4]> for BBox {
    type Error = GeoqueryError;

    fn try_from(v: [f64; 4]) -> Result<Self> {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

impl FromStr for BBox {
    type Err = GeoqueryError;

    /// Parse `"minx,miny,maxx,maxy"`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeoqueryError::InvalidBoundingBox {
                reason: format!("expected 4 comma-separated values, got {}", parts.len()),
            });
        }

        let mut values = [0.0; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| GeoqueryError::InvalidBoundingBox {
                reason: format!("'{}' is not a number", part),
            })?;
        }

        BBox::try_from(values)
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// Check whether any coordinate of `geometry` falls inside `bbox`
///
/// This is a coordinate-existence test, not a geometric intersection: a
/// polygon or line whose vertices all lie outside the box is reported as
/// outside even when its interior or an edge crosses the box. Unsupported
/// geometry types are never inside.
pub fn in_bbox(geometry: &Geometry, bbox: &BBox) -> bool {
    match geometry {
        Geometry::Point { coordinates } => bbox.contains_position(coordinates),
        Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
            bbox.contains_any(coordinates.iter())
        }
        Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
            bbox.contains_any(coordinates.iter().flatten())
        }
        Geometry::MultiPolygon { coordinates } => {
            bbox.contains_any(coordinates.iter().flatten().flatten())
        }
        Geometry::GeometryCollection { geometries } => {
            geometries.iter().any(|member| in_bbox(member, bbox))
        }
        Geometry::Unsupported => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BBox {
        BBox::new(0.0, 0.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn test_point_on_each_edge_is_inside() {
        let bbox = unit_box();

        assert!(in_bbox(&Geometry::point(0.0, 5.0), &bbox));
        assert!(in_bbox(&Geometry::point(10.0, 5.0), &bbox));
        assert!(in_bbox(&Geometry::point(5.0, 0.0), &bbox));
        assert!(in_bbox(&Geometry::point(5.0, 10.0), &bbox));
        assert!(!in_bbox(&Geometry::point(10.000001, 5.0), &bbox));
        assert!(!in_bbox(&Geometry::point(5.0, -0.000001), &bbox));
    }

    #[test]
    fn test_line_partially_inside() {
        let line = Geometry::line_string(vec![[-5.0, -5.0], [5.0, 5.0], [20.0, 20.0]]);
        assert!(in_bbox(&line, &unit_box()));

        let outside = Geometry::line_string(vec![[-5.0, -5.0], [-1.0, -1.0]]);
        assert!(!in_bbox(&outside, &unit_box()));
    }

    #[test]
    fn test_polygon_vertex_inside() {
        let polygon = Geometry::polygon(vec![vec![
            [8.0, 8.0],
            [15.0, 8.0],
            [15.0, 15.0],
            [8.0, 15.0],
            [8.0, 8.0],
        ]]);
        assert!(in_bbox(&polygon, &unit_box()));
    }

    #[test]
    fn test_polygon_covering_box_without_vertices_inside() {
        // Known approximation: the polygon covers the box but no vertex is inside
        let polygon = Geometry::polygon(vec![vec![
            [-10.0, -10.0],
            [20.0, -10.0],
            [20.0, 20.0],
            [-10.0, 20.0],
            [-10.0, -10.0],
        ]]);
        assert!(!in_bbox(&polygon, &unit_box()));
    }

    #[test]
    fn test_multipolygon_second_member_inside() {
        let geometry = Geometry::MultiPolygon {
            coordinates: vec![
                vec![vec![vec![50.0, 50.0], vec![60.0, 50.0], vec![60.0, 60.0], vec![50.0, 50.0]]],
                vec![vec![vec![1.0, 1.0], vec![2.0, 1.0], vec![2.0, 2.0], vec![1.0, 1.0]]],
            ],
        };
        assert!(in_bbox(&geometry, &unit_box()));
    }

    #[test]
    fn test_geometry_collection_any_member() {
        let matching = Geometry::collection(vec![
            Geometry::point(50.0, 50.0),
            Geometry::point(5.0, 5.0),
        ]);
        let missing = Geometry::collection(vec![Geometry::point(50.0, 50.0)]);

        assert!(in_bbox(&matching, &unit_box()));
        assert!(!in_bbox(&missing, &unit_box()));
        assert!(!in_bbox(&Geometry::collection(vec![]), &unit_box()));
    }

    #[test]
    fn test_unsupported_and_degenerate_positions() {
        assert!(!in_bbox(&Geometry::Unsupported, &unit_box()));
        assert!(!in_bbox(&Geometry::Point { coordinates: vec![5.0] }, &unit_box()));
        // Extra ordinates are ignored
        assert!(in_bbox(&Geometry::Point { coordinates: vec![5.0, 5.0, 900.0] }, &unit_box()));
    }

    #[test]
    fn test_bbox_validation() {
        assert!(BBox::new(10.0, 0.0, 0.0, 10.0).is_err());
        assert!(BBox::new(0.0, 0.0, f64::NAN, 10.0).is_err());
        assert!(BBox::new(1.0, 1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_bbox_parse_and_serde() {
        let bbox: BBox = " -1, -1 ,10,10".parse().unwrap();
        assert_eq!(bbox, BBox::new(-1.0, -1.0, 10.0, 10.0).unwrap());
        assert!("1,2,3".parse::<BBox>().is_err());
        assert!("a,2,3,4".parse::<BBox>().is_err());

        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[-1.0,-1.0,10.0,10.0]");
        let back: BBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bbox);
        assert!(serde_json::from_str::<BBox>("[5.0, 0.0, 1.0, 1.0]").is_err());
    }
}
