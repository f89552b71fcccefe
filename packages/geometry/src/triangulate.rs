//! Polygon triangulation for area-limited crime queries.
//!
//! The polygon's vertices are Delaunay-triangulated as a point set, which
//! covers the convex hull. Triangles filling concave notches or holes are
//! then dropped by keeping only those whose centroid lies inside the
//! polygon.

use std::collections::BTreeSet;

use geo::{Centroid, Contains, Coord, Polygon, Triangle};
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::GeometryError;
use crate::boundary::open_ring;

/// Splits `polygon` into triangles whose centroids lie strictly inside it.
///
/// A degenerate polygon (collinear vertices, zero area) yields an empty
/// list, which callers treat as "no coverage" rather than an error.
///
/// # Errors
///
/// Returns [`GeometryError::Triangulation`] if a vertex has a non-finite
/// coordinate.
pub fn triangulate_polygon(polygon: &Polygon<f64>) -> Result<Vec<Triangle<f64>>, GeometryError> {
    let vertices = unique_vertices(polygon);

    if let Some(bad) = vertices.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::Triangulation {
            message: format!("non-finite vertex ({}, {})", bad.x, bad.y),
        });
    }

    let points: Vec<Point2<f64>> = vertices.iter().map(|c| Point2::new(c.x, c.y)).collect();
    let triangulation: DelaunayTriangulation<Point2<f64>> =
        DelaunayTriangulation::bulk_load(points).map_err(|e| GeometryError::Triangulation {
            message: format!("{e:?}"),
        })?;

    let candidates = triangulation.num_inner_faces();
    let triangles: Vec<Triangle<f64>> = triangulation
        .inner_faces()
        .map(|face| {
            let [a, b, c] = face.positions();
            Triangle::new(
                Coord { x: a.x, y: a.y },
                Coord { x: b.x, y: b.y },
                Coord { x: c.x, y: c.y },
            )
        })
        .filter(|triangle| polygon.contains(&triangle.centroid()))
        .collect();

    log::debug!(
        "Triangulated {} vertices into {} triangles ({} outside the polygon dropped)",
        vertices.len(),
        triangles.len(),
        candidates - triangles.len()
    );

    Ok(triangles)
}

/// Collects ring vertices in order, skipping closing points and repeats.
fn unique_vertices(polygon: &Polygon<f64>) -> Vec<Coord<f64>> {
    let mut seen = BTreeSet::new();
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .flat_map(open_ring)
        .filter(|c| seen.insert((c.x.to_bits(), c.y.to_bits())))
        .collect()
}

#[cfg(test)]
mod tests {
    use geo::{Area, LineString, polygon};

    use super::*;

    fn total_area(triangles: &[Triangle<f64>]) -> f64 {
        triangles.iter().map(|triangle| triangle.unsigned_area()).sum()
    }

    #[test]
    fn rectangle_yields_two_triangles() {
        let rectangle = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 0.0),
        ];
        let triangles = triangulate_polygon(&rectangle).unwrap();
        assert_eq!(triangles.len(), 2);
        assert!((total_area(&triangles) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn concave_notch_triangles_are_dropped() {
        let u_shape = polygon![
            (x: 0.0, y: 0.0),
            (x: 3.0, y: 0.0),
            (x: 3.0, y: 3.0),
            (x: 2.0, y: 3.0),
            (x: 2.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 3.0),
            (x: 0.0, y: 3.0),
        ];
        let triangles = triangulate_polygon(&u_shape).unwrap();

        assert!(!triangles.is_empty());
        for triangle in &triangles {
            assert!(
                u_shape.contains(&triangle.centroid()),
                "centroid of {triangle:?} is outside the polygon"
            );
        }
        assert!((total_area(&triangles) - u_shape.unsigned_area()).abs() < 1e-9);
    }

    #[test]
    fn hole_is_not_covered() {
        let exterior = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let hole = LineString::from(vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let polygon = Polygon::new(exterior, vec![hole]);

        let triangles = triangulate_polygon(&polygon).unwrap();
        for triangle in &triangles {
            assert!(polygon.contains(&triangle.centroid()));
        }
        assert!((total_area(&triangles) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_polygon_yields_no_triangles() {
        let sliver = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 2.0)];
        assert!(triangulate_polygon(&sliver).unwrap().is_empty());
    }

    #[test]
    fn non_finite_vertex_is_an_error() {
        let broken = polygon![
            (x: 0.0, y: 0.0),
            (x: f64::NAN, y: 1.0),
            (x: 1.0, y: 0.0),
        ];
        assert!(matches!(
            triangulate_polygon(&broken),
            Err(GeometryError::Triangulation { .. })
        ));
    }

    #[test]
    fn duplicate_vertices_are_ignored() {
        let repeated = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        assert_eq!(unique_vertices(&repeated).len(), 4);
        assert_eq!(triangulate_polygon(&repeated).unwrap().len(), 2);
    }
}
