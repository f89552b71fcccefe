#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry for the street-level crime pipeline.
//!
//! The police.uk crime endpoint caps the area a single query may cover, so
//! a neighbourhood boundary is broken down before it is queried:
//!
//! 1. [`boundary`] loads the boundary polygon from KML, `GeoJSON`, or the
//!    police.uk boundary JSON.
//! 2. [`simplify`] reduces its vertex count without introducing crossings.
//! 3. [`triangulate`] splits it into triangles whose centroids lie inside
//!    the polygon.
//! 4. [`encode`] renders each triangle as the API's `poly` parameter.
//!
//! Coordinates are stored with `x = longitude` and `y = latitude`.

pub mod boundary;
pub mod encode;
pub mod simplify;
pub mod triangulate;

pub use encode::{PolygonString, encode_ring, encode_triangle};
pub use simplify::{DEFAULT_TOLERANCE, simplify_polygon};
pub use triangulate::triangulate_polygon;

use thiserror::Error;

/// Errors that can occur while loading or decomposing boundaries.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Reading the boundary file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The KML document could not be parsed.
    #[error("KML error: {message}")]
    Kml {
        /// Description of what went wrong.
        message: String,
    },

    /// The `GeoJSON` document could not be parsed or converted.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The police.uk boundary JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input held no usable polygon.
    #[error("No polygon found in {origin}")]
    NoPolygon {
        /// File path or description of the input.
        origin: String,
    },

    /// The file extension does not name a known boundary format.
    #[error("Unsupported boundary file: {path}")]
    UnsupportedFormat {
        /// Offending path.
        path: String,
    },

    /// The Delaunay triangulation rejected the polygon's vertices.
    #[error("Triangulation failed: {message}")]
    Triangulation {
        /// Description of what went wrong.
        message: String,
    },
}
