//! Area orchestration: one boundary in, one raw crime table out.
//!
//! Triangles are fetched one at a time, in order. What happens when a
//! triangle fails is decided by [`FailurePolicy`].

use std::path::Path;
use std::sync::Arc;

use geo::Polygon;
use uk_crime_geometry::boundary::load_polygon;
use uk_crime_geometry::{PolygonString, encode_triangle, simplify_polygon, triangulate_polygon};
use uk_crime_police_api::{CrimeFetcher, PoliceApiError};

use crate::PipelineError;
use crate::aggregate::{RawCrimeTable, aggregate, union_tables};
use crate::clean::{CrimeTable, clean};
use crate::config::{FailurePolicy, PipelineConfig};
use crate::progress::ProgressCallback;

/// Per-area processing options.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOptions {
    /// Simplification tolerance in degrees.
    pub tolerance: f64,
    /// Month to query (`YYYY-MM`), `None` for the latest.
    pub date: Option<String>,
    /// Per-triangle failure handling.
    pub failure_policy: FailurePolicy,
}

impl Default for AreaOptions {
    fn default() -> Self {
        Self {
            tolerance: uk_crime_geometry::DEFAULT_TOLERANCE,
            date: None,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl From<&PipelineConfig> for AreaOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            date: config.date.clone(),
            failure_policy: config.failure_policy,
        }
    }
}

/// A triangle whose fetch failed under [`FailurePolicy::Partial`].
#[derive(Debug)]
pub struct TriangleFailure {
    /// Force the area belongs to.
    pub police_force_id: String,
    /// Position of the triangle in the area's triangulation.
    pub index: usize,
    /// The query that failed.
    pub poly: PolygonString,
    /// Why it failed.
    pub error: PoliceApiError,
}

/// Outcome of processing one area.
#[derive(Debug)]
pub struct AreaResult {
    /// Force the area belongs to.
    pub police_force_id: String,
    /// Number of triangles queried.
    pub triangles: usize,
    /// Crimes from every successful triangle.
    pub table: RawCrimeTable,
    /// Triangles that failed; always empty under [`FailurePolicy::Abort`].
    pub failures: Vec<TriangleFailure>,
}

impl AreaResult {
    /// Whether every triangle was fetched.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of processing several forces.
#[derive(Debug)]
pub struct RegionsResult {
    /// Cleaned union of every force's crimes.
    pub table: CrimeTable,
    /// Failed triangles across all forces.
    pub failures: Vec<TriangleFailure>,
}

/// Simplifies and triangulates `polygon`, fetches crimes for each
/// triangle, and aggregates them under `force_id`.
///
/// A polygon that triangulates to nothing yields an empty table.
///
/// # Errors
///
/// Returns [`PipelineError::Geometry`] if triangulation fails, and
/// [`PipelineError::Api`] for the first failing triangle under
/// [`FailurePolicy::Abort`].
pub async fn process_area<F: CrimeFetcher + ?Sized>(
    fetcher: &F,
    polygon: &Polygon<f64>,
    force_id: &str,
    options: &AreaOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<AreaResult, PipelineError> {
    let simplified = simplify_polygon(polygon, options.tolerance);
    let triangles = triangulate_polygon(&simplified)?;

    log::info!("{force_id}: querying {} triangle(s)", triangles.len());
    if triangles.is_empty() {
        log::warn!("{force_id}: boundary produced no triangles, no crimes fetched");
    }

    progress.set_total(triangles.len() as u64);
    progress.set_message(force_id.to_string());

    let mut batches = Vec::with_capacity(triangles.len());
    let mut failures = Vec::new();

    for (index, triangle) in triangles.iter().enumerate() {
        let poly = encode_triangle(triangle);
        match fetcher.street_crimes(&poly, options.date.as_deref()).await {
            Ok(crimes) => {
                log::debug!("{force_id}: triangle {index} returned {} crime(s)", crimes.len());
                batches.push(crimes);
            }
            Err(error) => match options.failure_policy {
                FailurePolicy::Abort => {
                    log::error!("{force_id}: triangle {index} failed: {error}");
                    progress.finish_and_clear();
                    return Err(error.into());
                }
                FailurePolicy::Partial => {
                    log::warn!("{force_id}: triangle {index} failed, continuing: {error}");
                    failures.push(TriangleFailure {
                        police_force_id: force_id.to_string(),
                        index,
                        poly,
                        error,
                    });
                }
            },
        }
        progress.inc(1);
    }

    let table = aggregate(batches, force_id);
    progress.finish(format!("{force_id}: {} crime(s)", table.len()));

    Ok(AreaResult {
        police_force_id: force_id.to_string(),
        triangles: triangles.len(),
        table,
        failures,
    })
}

/// Loads the boundary at `path` and runs [`process_area`] on it.
///
/// # Errors
///
/// Returns [`PipelineError::Geometry`] if the boundary cannot be loaded,
/// plus anything [`process_area`] returns.
pub async fn process_boundary_file<F: CrimeFetcher + ?Sized>(
    fetcher: &F,
    path: &Path,
    force_id: &str,
    options: &AreaOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<AreaResult, PipelineError> {
    let polygon = load_polygon(path)?;
    process_area(fetcher, &polygon, force_id, options, progress).await
}

/// Processes each force's boundary file from `config.boundary_dir`, then
/// unions and cleans the results.
///
/// `overall` advances once per force. Each force's triangles report to a
/// fresh callback from `area_progress`, called with the force id.
///
/// # Errors
///
/// Returns the first [`PipelineError`] from any force; under
/// [`FailurePolicy::Partial`] triangle failures are collected instead.
pub async fn crime_for_all_regions<F, P>(
    fetcher: &F,
    forces: &[String],
    config: &PipelineConfig,
    overall: &Arc<dyn ProgressCallback>,
    area_progress: P,
) -> Result<RegionsResult, PipelineError>
where
    F: CrimeFetcher + ?Sized,
    P: Fn(&str) -> Arc<dyn ProgressCallback>,
{
    let options = AreaOptions::from(config);
    let mut tables = Vec::with_capacity(forces.len());
    let mut failures = Vec::new();

    overall.set_total(forces.len() as u64);

    for force_id in forces {
        overall.set_message(force_id.clone());
        let path = config.boundary_path(force_id);
        let progress = area_progress(force_id);
        let result = match process_boundary_file(fetcher, &path, force_id, &options, &progress).await
        {
            Ok(result) => result,
            Err(e) => {
                progress.finish_and_clear();
                overall.finish_and_clear();
                return Err(e);
            }
        };
        if !result.is_complete() {
            log::warn!(
                "{force_id}: {} of {} triangle(s) failed",
                result.failures.len(),
                result.triangles
            );
        }
        failures.extend(result.failures);
        tables.push(result.table);
        overall.inc(1);
    }

    let table = clean(union_tables(tables));
    overall.finish(format!("{} force(s): {} crime(s)", forces.len(), table.len()));

    Ok(RegionsResult { table, failures })
}
