//! Boundary polygon loading.
//!
//! Neighbourhood boundaries come from police.uk either as KML downloads or
//! as the JSON vertex list served by `/{force}/{neighbourhood}/boundary`.
//! `GeoJSON` is accepted too. Only the first polygon of a file is used.

use std::path::Path;

use geo::{Area, Coord, LineString, Polygon};
use geojson::GeoJson;
use quick_xml::Reader;
use quick_xml::events::Event;
use uk_crime_crime_models::BoundaryPoint;

use crate::GeometryError;

/// On-disk boundary formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryFormat {
    /// KML document; the first `<Polygon>` is used.
    Kml,
    /// `GeoJSON` geometry, feature, or feature collection.
    GeoJson,
    /// police.uk boundary JSON: an array of `{latitude, longitude}` objects.
    PoliceJson,
}

impl BoundaryFormat {
    /// Picks a format from the file extension. A `.json` file is sniffed:
    /// a top-level array is police.uk boundary JSON, anything else
    /// `GeoJSON`.
    #[must_use]
    pub fn detect(path: &Path, contents: &str) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "kml" => Some(Self::Kml),
            "geojson" => Some(Self::GeoJson),
            "json" => {
                if contents.trim_start().starts_with('[') {
                    Some(Self::PoliceJson)
                } else {
                    Some(Self::GeoJson)
                }
            }
            _ => None,
        }
    }
}

/// Loads the boundary polygon stored at `path`.
///
/// # Errors
///
/// Returns [`GeometryError`] if the file cannot be read, its format is not
/// recognised, or it holds no polygon.
pub fn load_polygon(path: &Path) -> Result<Polygon<f64>, GeometryError> {
    let contents = std::fs::read_to_string(path)?;
    let format =
        BoundaryFormat::detect(path, &contents).ok_or_else(|| GeometryError::UnsupportedFormat {
            path: path.display().to_string(),
        })?;

    log::debug!("Loading {format:?} boundary from {}", path.display());

    let polygon = match format {
        BoundaryFormat::Kml => parse_kml(&contents),
        BoundaryFormat::GeoJson => parse_geojson(&contents),
        BoundaryFormat::PoliceJson => parse_police_boundary(&contents),
    };

    polygon.map_err(|e| match e {
        GeometryError::NoPolygon { .. } => GeometryError::NoPolygon {
            origin: path.display().to_string(),
        },
        other => other,
    })
}

#[derive(Debug, Clone, Copy)]
enum RingKind {
    Outer,
    Inner,
}

/// Parses the first `<Polygon>` of a KML document.
///
/// # Errors
///
/// Returns [`GeometryError::Kml`] for malformed XML or coordinates and
/// [`GeometryError::NoPolygon`] when the document has no outer boundary.
pub fn parse_kml(kml: &str) -> Result<Polygon<f64>, GeometryError> {
    let mut reader = Reader::from_str(kml);
    reader.config_mut().trim_text(true);

    let mut in_polygon = false;
    let mut ring_kind: Option<RingKind> = None;
    let mut in_coordinates = false;
    let mut exterior: Option<LineString<f64>> = None;
    let mut interiors = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| GeometryError::Kml {
            message: format!("at byte {}: {e}", reader.buffer_position()),
        })?;

        match event {
            Event::Start(tag) => match tag.local_name().as_ref() {
                b"Polygon" => in_polygon = true,
                b"outerBoundaryIs" if in_polygon => ring_kind = Some(RingKind::Outer),
                b"innerBoundaryIs" if in_polygon => ring_kind = Some(RingKind::Inner),
                b"coordinates" if ring_kind.is_some() => in_coordinates = true,
                _ => {}
            },
            Event::Text(text) if in_coordinates => {
                let raw = text.unescape().map_err(|e| GeometryError::Kml {
                    message: e.to_string(),
                })?;
                let ring = parse_kml_coordinates(&raw)?;
                match ring_kind {
                    Some(RingKind::Outer) => exterior = Some(ring),
                    Some(RingKind::Inner) => interiors.push(ring),
                    None => {}
                }
            }
            Event::End(tag) => match tag.local_name().as_ref() {
                b"coordinates" => in_coordinates = false,
                b"outerBoundaryIs" | b"innerBoundaryIs" => ring_kind = None,
                b"Polygon" if in_polygon => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let exterior = exterior.ok_or_else(|| GeometryError::NoPolygon {
        origin: "KML document".to_string(),
    })?;

    Ok(Polygon::new(exterior, interiors))
}

/// Parses a KML `<coordinates>` body: whitespace separated `lon,lat[,alt]`
/// tuples.
fn parse_kml_coordinates(text: &str) -> Result<LineString<f64>, GeometryError> {
    let mut coords = Vec::new();

    for tuple in text.split_whitespace() {
        let mut parts = tuple.split(',');
        let (Some(lon), Some(lat)) = (parts.next(), parts.next()) else {
            return Err(GeometryError::Kml {
                message: format!("Malformed coordinate tuple '{tuple}'"),
            });
        };
        let parse = |value: &str| {
            value.parse::<f64>().map_err(|e| GeometryError::Kml {
                message: format!("Invalid coordinate '{value}' in '{tuple}': {e}"),
            })
        };
        coords.push(Coord {
            x: parse(lon)?,
            y: parse(lat)?,
        });
    }

    Ok(LineString::new(coords))
}

/// Parses a `GeoJSON` document into a polygon.
///
/// For feature collections the first feature with a geometry is used. A
/// `MultiPolygon` resolves to its largest member.
///
/// # Errors
///
/// Returns [`GeometryError`] if the document is invalid or holds no
/// polygonal geometry.
pub fn parse_geojson(text: &str) -> Result<Polygon<f64>, GeometryError> {
    let geojson: GeoJson = text.parse()?;

    let geometry = match geojson {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .find_map(|feature| feature.geometry),
    };

    let no_polygon = || GeometryError::NoPolygon {
        origin: "GeoJSON document".to_string(),
    };

    let geometry: geo::Geometry<f64> = geometry.ok_or_else(no_polygon)?.try_into()?;

    match geometry {
        geo::Geometry::Polygon(polygon) => Ok(polygon),
        geo::Geometry::MultiPolygon(multi) => {
            if multi.0.len() > 1 {
                log::warn!(
                    "Boundary is a MultiPolygon with {} parts, using the largest",
                    multi.0.len()
                );
            }
            multi
                .0
                .into_iter()
                .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
                .ok_or_else(no_polygon)
        }
        _ => Err(no_polygon()),
    }
}

/// Parses the police.uk boundary JSON (`[{"latitude": .., "longitude": ..}]`).
///
/// # Errors
///
/// Returns [`GeometryError`] if the JSON is invalid or yields fewer than
/// three usable vertices.
pub fn parse_police_boundary(text: &str) -> Result<Polygon<f64>, GeometryError> {
    let points: Vec<BoundaryPoint> = serde_json::from_str(text)?;
    polygon_from_boundary_points(&points)
}

/// Builds a polygon from police.uk boundary vertices.
///
/// Vertices with non-numeric coordinates are skipped with a warning.
///
/// # Errors
///
/// Returns [`GeometryError::NoPolygon`] if fewer than three vertices are
/// usable.
pub fn polygon_from_boundary_points(
    points: &[BoundaryPoint],
) -> Result<Polygon<f64>, GeometryError> {
    let coords: Vec<Coord<f64>> = points
        .iter()
        .filter_map(|point| {
            match (point.longitude.to_f64(), point.latitude.to_f64()) {
                (Some(x), Some(y)) => Some(Coord { x, y }),
                _ => {
                    log::warn!("Skipping boundary vertex with invalid coordinates: {point:?}");
                    None
                }
            }
        })
        .collect();

    if coords.len() < 3 {
        return Err(GeometryError::NoPolygon {
            origin: format!("boundary with {} usable vertices", coords.len()),
        });
    }

    Ok(Polygon::new(LineString::new(coords), vec![]))
}

/// Returns a ring's vertices without the closing duplicate of the first.
#[must_use]
pub fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut coords = ring.0.clone();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}

/// Returns the polygon's exterior vertices without the closing duplicate.
#[must_use]
pub fn exterior_coords(polygon: &Polygon<f64>) -> Vec<Coord<f64>> {
    open_ring(polygon.exterior())
}
