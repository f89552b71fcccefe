//! Topology-preserving polygon simplification.
//!
//! Each ring is reduced with Douglas-Peucker ([`geo::Simplify`]). A reduced
//! ring is only accepted if the polygon it forms with the other rings is
//! still valid: every hole inside the shell, no ring touching another, and
//! no ring collapsing to zero area. Otherwise the tolerance is halved and
//! the ring retried, down to the unmodified input ring. Output vertices are
//! always a subset of the input vertices, so every one of them lies on the
//! input boundary.

use geo::{Area, Contains, Intersects, LineString, Polygon, Simplify, Validation};

/// Default tolerance in degrees, roughly 50m at UK latitudes.
pub const DEFAULT_TOLERANCE: f64 = 0.0005;

/// How many times the tolerance is halved before a ring is left as-is.
const MAX_ATTEMPTS: u32 = 8;

/// Simplifies every ring of `polygon` so that no vertex moves more than
/// `tolerance` away from the input boundary and no crossing edges appear.
///
/// Degenerate polygons (fewer than four ring vertices) and non-positive
/// tolerances return the input unchanged.
#[must_use]
pub fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    if tolerance.is_nan() || tolerance <= 0.0 {
        return polygon.clone();
    }

    let holes = polygon.interiors();

    let exterior = simplify_ring_with(polygon.exterior(), tolerance, |shell| {
        fits_together(shell, holes)
    });

    let mut interiors = holes.to_vec();
    for (index, hole) in holes.iter().enumerate() {
        let simplified = simplify_ring_with(hole, tolerance, |candidate| {
            let mut rings = interiors.clone();
            rings[index] = candidate.clone();
            fits_together(&exterior, &rings)
        });
        interiors[index] = simplified;
    }

    let simplified = Polygon::new(exterior, interiors);

    log::debug!(
        "Simplified polygon from {} to {} exterior vertices (tolerance {tolerance})",
        polygon.exterior().0.len(),
        simplified.exterior().0.len()
    );

    simplified
}

/// Simplifies a single closed ring, accepting the first candidate that
/// passes `compatible`.
fn simplify_ring_with<F>(ring: &LineString<f64>, tolerance: f64, compatible: F) -> LineString<f64>
where
    F: Fn(&LineString<f64>) -> bool,
{
    // A closed triangle.
    if ring.0.len() <= 4 {
        return ring.clone();
    }

    let mut attempt_tolerance = tolerance;
    for _ in 0..MAX_ATTEMPTS {
        let candidate = ring.simplify(attempt_tolerance);
        if candidate.0.len() == ring.0.len() || compatible(&candidate) {
            return candidate;
        }
        attempt_tolerance /= 2.0;
    }

    ring.clone()
}

fn encloses_area(ring: &LineString<f64>) -> bool {
    Polygon::new(ring.clone(), vec![]).unsigned_area() > 0.0
}

/// Whether `shell` and `holes` form a valid polygon whose rings are
/// pairwise disjoint.
fn fits_together(shell: &LineString<f64>, holes: &[LineString<f64>]) -> bool {
    if !encloses_area(shell) || !holes.iter().all(encloses_area) {
        return false;
    }

    let outline = Polygon::new(shell.clone(), vec![]);
    let disjoint = holes.iter().enumerate().all(|(index, hole)| {
        outline.contains(hole)
            && !shell.intersects(hole)
            && holes[index + 1..].iter().all(|other| !hole.intersects(other))
    });

    disjoint && Polygon::new(shell.clone(), holes.to_vec()).is_valid()
}

#[cfg(test)]
mod tests {
    use geo::{Distance, Euclidean, Point, polygon};

    use super::*;
    use crate::boundary::exterior_coords;

    #[test]
    fn rectangle_is_already_minimal() {
        let rectangle = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 0.0),
        ];
        let simplified = simplify_polygon(&rectangle, DEFAULT_TOLERANCE);
        assert_eq!(simplified, rectangle);
    }

    #[test]
    fn removes_vertices_within_tolerance() {
        let noisy = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.5, y: 0.0001),
            (x: 1.0, y: 0.0),
            (x: 1.0001, y: 0.5),
            (x: 1.0, y: 1.0),
            (x: 0.5, y: 0.9999),
            (x: 0.0, y: 1.0),
        ];
        let simplified = simplify_polygon(&noisy, DEFAULT_TOLERANCE);
        assert_eq!(exterior_coords(&simplified).len(), 4);
        assert!(simplified.is_valid());
    }

    #[test]
    fn keeps_vertices_beyond_tolerance() {
        let notched = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.5, y: 0.1),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        let simplified = simplify_polygon(&notched, DEFAULT_TOLERANCE);
        assert_eq!(simplified, notched);
    }

    #[test]
    fn output_is_subset_within_tolerance_and_no_larger() {
        let wavy: Vec<(f64, f64)> = (0..40)
            .map(|i| {
                let angle = f64::from(i) * std::f64::consts::TAU / 40.0;
                let wobble = if i % 2 == 0 { 0.0002 } else { -0.0002 };
                (angle.cos() + wobble, angle.sin())
            })
            .collect();
        let polygon = Polygon::new(LineString::from(wavy), vec![]);
        let original = exterior_coords(&polygon);

        for tolerance in [0.0005, 0.01, 0.1, 0.5] {
            let simplified = simplify_polygon(&polygon, tolerance);
            let reduced = exterior_coords(&simplified);
            assert!(reduced.len() <= original.len());
            assert!(simplified.is_valid(), "tolerance {tolerance} produced invalid polygon");
            for vertex in &reduced {
                let distance = Euclidean.distance(&Point::from(*vertex), polygon.exterior());
                assert!(distance <= tolerance);
            }
        }
    }

    #[test]
    fn does_not_cut_through_a_hole() {
        let exterior = LineString::from(vec![
            (0.0, 0.2),
            (5.0, 0.0),
            (10.0, 0.2),
            (10.0, 10.0),
            (0.0, 10.0),
        ]);
        let hole = LineString::from(vec![(4.8, 0.05), (5.2, 0.05), (5.2, 0.5), (4.8, 0.5)]);

        let without_hole = Polygon::new(exterior.clone(), vec![]);
        assert_eq!(exterior_coords(&simplify_polygon(&without_hole, 0.3)).len(), 4);

        let with_hole = Polygon::new(exterior, vec![hole]);
        let simplified = simplify_polygon(&with_hole, 0.3);
        assert_eq!(exterior_coords(&simplified).len(), 5);
        assert_eq!(simplified.interiors().len(), 1);
        assert!(!simplified.exterior().intersects(&simplified.interiors()[0]));
        assert!(simplified.is_valid());
    }

    #[test]
    fn hole_in_a_small_bump_stays_inside_the_shell() {
        let exterior = LineString::from(vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (5.0, 10.0004),
            (0.0, 10.0),
        ]);
        let hole = LineString::from(vec![(4.9, 10.0001), (5.1, 10.0001), (5.0, 10.0003)]);
        let polygon = Polygon::new(exterior, vec![hole]);
        assert!(polygon.is_valid());

        let simplified = simplify_polygon(&polygon, DEFAULT_TOLERANCE);
        let shell = Polygon::new(simplified.exterior().clone(), vec![]);

        assert_eq!(simplified.interiors().len(), 1);
        assert!(shell.contains(&simplified.interiors()[0]));
        assert!(simplified.is_valid());
    }

    #[test]
    fn falls_back_to_input_when_every_candidate_is_rejected() {
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (0.5, 0.0001),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]);
        let result = simplify_ring_with(&ring, 0.01, |_| false);
        assert_eq!(result, ring);
    }

    #[test]
    fn simplification_is_deterministic() {
        let polygon = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.3, y: 0.0002),
            (x: 0.6, y: -0.0001),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        assert_eq!(
            simplify_polygon(&polygon, DEFAULT_TOLERANCE),
            simplify_polygon(&polygon, DEFAULT_TOLERANCE)
        );
    }

    #[test]
    fn degenerate_input_is_returned_unchanged() {
        let sliver = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 2.0)];
        assert_eq!(simplify_polygon(&sliver, DEFAULT_TOLERANCE), sliver);
    }

    #[test]
    fn rejects_self_intersecting_shell() {
        let bowtie = LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]);
        assert!(!fits_together(&bowtie, &[]));
    }

    #[test]
    fn rejects_collapsed_shell() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.0, 0.0)]);
        assert!(!fits_together(&line, &[]));
    }
}
