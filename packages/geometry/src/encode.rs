//! police.uk `poly` query parameter encoding.
//!
//! The API takes a polygon as `lat,lng` pairs joined with `:`. Geometry is
//! stored `x = longitude`, `y = latitude`, so the axes are swapped on the
//! way out.

use std::fmt;

use geo::{Coord, Triangle};

/// An encoded `poly` parameter, e.g. `"52.6,-1.1:52.6,-1.0:52.7,-1.0"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolygonString(String);

impl PolygonString {
    /// Returns the encoded string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of coordinate pairs in the string.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.split(':').count()
        }
    }
}

impl fmt::Display for PolygonString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PolygonString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encodes a triangle as exactly three `lat,lng` pairs.
#[must_use]
pub fn encode_triangle(triangle: &Triangle<f64>) -> PolygonString {
    encode_coords(&triangle.to_array())
}

/// Encodes a ring of vertices, dropping the closing vertex if it repeats
/// the first.
#[must_use]
pub fn encode_ring(coords: &[Coord<f64>]) -> PolygonString {
    match coords {
        [first, rest @ .., last] if !rest.is_empty() && first == last => {
            encode_coords(&coords[..coords.len() - 1])
        }
        _ => encode_coords(coords),
    }
}

fn encode_coords(coords: &[Coord<f64>]) -> PolygonString {
    PolygonString(
        coords
            .iter()
            .map(|coord| format!("{},{}", coord.y, coord.x))
            .collect::<Vec<_>>()
            .join(":"),
    )
}
