//! Geo module for spatial operations
//!
//! This module provides the bounding box type and the coordinate-level
//! containment test used by spatial filtering. No reprojection happens
//! here: the bbox and the geometries must share a CRS.

pub mod bbox;

pub use bbox::{in_bbox, BBox};
