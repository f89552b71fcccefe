//! Summary tables derived from a cleaned crime table.
//!
//! These feed charts downstream: counts per force and category, crime
//! rates per 1,000 residents, the category mix, and grid hotspots.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uk_crime_crime_models::{PoliceForce, label_for_slug};

use crate::PipelineError;
use crate::clean::CrimeTable;
use crate::population::ForcePopulation;

/// Label used for categories folded together by [`category_summary`].
pub const OTHER_CATEGORY: &str = "Other";

/// Number of crimes of one category within one force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// Force identifier, empty when the row had none.
    pub police_force_id: String,
    /// Category slug.
    pub category: String,
    /// Number of crimes.
    pub count: u64,
}

/// Crime count and rate for one force.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrimeRate {
    /// Force identifier.
    pub police_force_id: String,
    /// Force name, when known.
    pub police_force_name: Option<String>,
    /// Number of crimes.
    pub crime_count: u64,
    /// Residents, when known.
    pub population: Option<u64>,
    /// Crimes per 1,000 residents, when the population is known and
    /// non-zero.
    pub crime_rate_per_1000: Option<f64>,
}

/// Share of one category in a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    /// Human-readable category label.
    pub category: String,
    /// Number of crimes.
    pub count: u64,
    /// Percentage of all crimes.
    pub percentage: f64,
}

/// A grid cell and the number of crimes in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    /// Southern edge of the cell.
    pub lat_bin: f64,
    /// Western edge of the cell.
    pub lon_bin: f64,
    /// Number of crimes.
    pub count: u64,
}

fn force_of(row: &uk_crime_crime_models::CrimeRow) -> String {
    row.police_force_id.clone().unwrap_or_default()
}

/// Counts crimes by force and category, sorted by force then category.
#[must_use]
pub fn crime_counts(table: &CrimeTable) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<(String, String), u64> = BTreeMap::new();
    for row in &table.rows {
        *counts
            .entry((force_of(row), row.category.clone()))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((police_force_id, category), count)| CategoryCount {
            police_force_id,
            category,
            count,
        })
        .collect()
}

/// Totals crimes per force and joins population and force name.
///
/// Forces missing from `populations` get no rate. Output is sorted by
/// force id.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn crime_rates(
    table: &CrimeTable,
    populations: &[ForcePopulation],
    forces: &[PoliceForce],
) -> Vec<CrimeRate> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for row in &table.rows {
        *totals.entry(force_of(row)).or_default() += 1;
    }

    let populations: HashMap<&str, u64> = populations
        .iter()
        .map(|p| (p.police_force_id.as_str(), p.population))
        .collect();
    let names: HashMap<&str, &str> = forces
        .iter()
        .map(|f| (f.id.as_str(), f.name.as_str()))
        .collect();

    totals
        .into_iter()
        .map(|(police_force_id, crime_count)| {
            let population = populations.get(police_force_id.as_str()).copied();
            let crime_rate_per_1000 = population
                .filter(|&p| p > 0)
                .map(|p| crime_count as f64 / p as f64 * 1000.0);
            CrimeRate {
                police_force_name: names
                    .get(police_force_id.as_str())
                    .map(|name| (*name).to_string()),
                police_force_id,
                crime_count,
                population,
                crime_rate_per_1000,
            }
        })
        .collect()
}

/// The `top_n` most frequent categories with their share of all crimes;
/// the remainder is folded into [`OTHER_CATEGORY`] when non-empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn category_summary(table: &CrimeTable, top_n: usize) -> Vec<CategoryShare> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for row in &table.rows {
        *counts.entry(row.category.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total = table.len() as f64;
    let share = |count: u64| if total > 0.0 { count as f64 / total * 100.0 } else { 0.0 };

    let other: u64 = ranked.iter().skip(top_n).map(|(_, count)| count).sum();
    let mut summary: Vec<CategoryShare> = ranked
        .into_iter()
        .take(top_n)
        .map(|(slug, count)| CategoryShare {
            category: label_for_slug(slug),
            count,
            percentage: share(count),
        })
        .collect();

    if other > 0 {
        summary.push(CategoryShare {
            category: OTHER_CATEGORY.to_string(),
            count: other,
            percentage: share(other),
        });
    }
    summary
}

/// Bins located crimes into `grid_size`-degree cells and returns the
/// `top_n` busiest, busiest first.
///
/// Rows without both coordinates are skipped.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `grid_size` is not a
/// positive finite number.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn hotspots(
    table: &CrimeTable,
    grid_size: f64,
    top_n: usize,
) -> Result<Vec<Hotspot>, PipelineError> {
    if !grid_size.is_finite() || grid_size <= 0.0 {
        return Err(PipelineError::InvalidInput {
            message: format!("grid size must be positive, got {grid_size}"),
        });
    }

    let mut cells: HashMap<(i64, i64), u64> = HashMap::new();
    for row in &table.rows {
        if let (Some(lat), Some(lon)) = (row.latitude, row.longitude) {
            let cell = (
                (lat / grid_size).floor() as i64,
                (lon / grid_size).floor() as i64,
            );
            *cells.entry(cell).or_default() += 1;
        }
    }

    let mut ranked: Vec<((i64, i64), u64)> = cells.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(ranked
        .into_iter()
        .take(top_n)
        .map(|((lat, lon), count)| Hotspot {
            lat_bin: lat as f64 * grid_size,
            lon_bin: lon as f64 * grid_size,
            count,
        })
        .collect())
}
