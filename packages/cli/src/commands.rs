//! Subcommand implementations shared by the argument parser and the
//! interactive mode.

use std::path::{Path, PathBuf};
use std::time::Instant;

use uk_crime_cli_utils::{IndicatifProgress, MultiProgress};
use uk_crime_geometry::boundary::{load_polygon, polygon_from_boundary_points};
use uk_crime_pipeline::area::{crime_for_all_regions, process_area};
use uk_crime_pipeline::output::{
    read_crime_csv, read_forces_csv, write_crime_csv, write_forces_csv, write_neighbourhoods_csv,
};
use uk_crime_pipeline::population::{read_population_csv, write_population_csv};
use uk_crime_pipeline::stats::{category_summary, crime_counts, crime_rates, hotspots};
use uk_crime_pipeline::{
    AreaOptions, FailurePolicy, PipelineConfig, PipelineError, TriangleFailure, clean,
};
use uk_crime_police_api::PoliceApiClient;

/// Where the boundary for `fetch` comes from.
pub enum BoundarySource {
    /// `{boundary_dir}/{force}.kml` from the config.
    Configured,
    /// An explicit boundary file.
    File(PathBuf),
    /// A neighbourhood boundary fetched from the API.
    Neighbourhood(String),
}

/// Applies command-line overrides on top of the loaded config.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] if the resulting config is invalid.
pub fn apply_overrides(
    config: &mut PipelineConfig,
    output: Option<PathBuf>,
    date: Option<String>,
    partial: bool,
) -> Result<(), PipelineError> {
    if let Some(output) = output {
        config.output = output;
    }
    if date.is_some() {
        config.date = date;
    }
    if partial {
        config.failure_policy = FailurePolicy::Partial;
    }
    config.validate()
}

/// Splits a comma-separated force list, dropping blanks.
#[must_use]
pub fn parse_force_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prints all forces, optionally saving them as CSV.
///
/// # Errors
///
/// Returns an error if the API request or the CSV write fails.
pub async fn list_forces(
    client: &PoliceApiClient,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let forces = client.forces().await?;

    println!("{:<32} NAME", "ID");
    println!("{}", "-".repeat(70));
    for force in &forces {
        println!("{:<32} {}", force.id, force.name);
    }

    if let Some(path) = output {
        write_forces_csv(path, &forces)?;
    }
    Ok(())
}

/// Prints the neighbourhoods of `forces`, optionally saving them as CSV.
///
/// With `details`, each neighbourhood's detail record is fetched as well
/// and its population estimate and force page are printed.
///
/// # Errors
///
/// Returns an error if an API request or the CSV write fails.
pub async fn list_neighbourhoods(
    client: &PoliceApiClient,
    forces: &[String],
    details: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if forces.is_empty() {
        return Err("No forces given".into());
    }

    let neighbourhoods = client.all_neighbourhoods(forces).await?;

    if details {
        println!("{:<24} {:<16} {:<32} {:>10} PAGE", "FORCE", "ID", "NAME", "POPULATION");
        println!("{}", "-".repeat(100));
        for force in forces {
            for detail in client.neighbourhood_details(force, &neighbourhoods).await? {
                println!(
                    "{:<24} {:<16} {:<32} {:>10} {}",
                    force,
                    detail.id,
                    detail.name,
                    detail.population.as_deref().unwrap_or("-"),
                    detail.url_force.as_deref().unwrap_or("-"),
                );
            }
        }
    } else {
        println!("{:<24} {:<16} NAME", "FORCE", "ID");
        println!("{}", "-".repeat(70));
        for neighbourhood in &neighbourhoods {
            println!(
                "{:<24} {:<16} {}",
                neighbourhood.police_force_id.as_deref().unwrap_or("-"),
                neighbourhood.id,
                neighbourhood.name
            );
        }
    }

    if let Some(path) = output {
        write_neighbourhoods_csv(path, &neighbourhoods)?;
    }
    Ok(())
}

/// Prints the detail record of one neighbourhood.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn show_neighbourhood(
    client: &PoliceApiClient,
    force: &str,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let detail = client.neighbourhood(force, id).await?;

    println!("{} ({force}/{})", detail.name, detail.id);
    if let Some(population) = &detail.population {
        println!("  Population: {population}");
    }
    let centre = detail
        .centre
        .as_ref()
        .and_then(|c| Some((c.latitude.to_f64()?, c.longitude.to_f64()?)));
    if let Some((lat, lon)) = centre {
        println!("  Centre:     {lat:.4}, {lon:.4}");
    }
    if let Some(url) = &detail.url_force {
        println!("  Page:       {url}");
    }
    Ok(())
}

/// Fetches, cleans, and writes the crimes of one force's area.
///
/// # Errors
///
/// Returns an error if the boundary cannot be loaded, a fetch fails under
/// [`FailurePolicy::Abort`], or the output cannot be written.
pub async fn fetch_force(
    multi: &MultiProgress,
    client: &PoliceApiClient,
    config: &PipelineConfig,
    force: &str,
    source: BoundarySource,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let polygon = match source {
        BoundarySource::Configured => load_polygon(&config.boundary_path(force))?,
        BoundarySource::File(path) => load_polygon(&path)?,
        BoundarySource::Neighbourhood(id) => {
            log::info!("Fetching boundary for {force}/{id}");
            let points = client.neighbourhood_boundary(force, &id).await?;
            polygon_from_boundary_points(&points)?
        }
    };

    let progress = IndicatifProgress::triangles_bar(multi, force);
    let result = process_area(client, &polygon, force, &AreaOptions::from(config), &progress).await?;

    report_failures(&result.failures);
    let table = clean(result.table);
    write_crime_csv(&config.output, &table)?;

    log::info!("{force}: done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Fetches, cleans, and writes the crimes of several forces.
///
/// # Errors
///
/// Returns an error if no forces are given, any force fails under
/// [`FailurePolicy::Abort`], or the output cannot be written.
pub async fn fetch_all(
    multi: &MultiProgress,
    client: &PoliceApiClient,
    config: &PipelineConfig,
    forces: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    if forces.is_empty() {
        return Err("No forces given: pass --forces or set `forces` in the config".into());
    }

    let start = Instant::now();
    log::info!("Fetching {} force(s): {}", forces.len(), forces.join(", "));

    let overall = IndicatifProgress::forces_bar(multi, "Forces", forces.len() as u64);
    let result = crime_for_all_regions(client, forces, config, &overall, |force| {
        IndicatifProgress::triangles_bar(multi, force)
    })
    .await?;

    report_failures(&result.failures);
    write_crime_csv(&config.output, &result.table)?;

    log::info!(
        "Fetched {} crime(s) for {} force(s) in {:.1}s",
        result.table.len(),
        forces.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn report_failures(failures: &[TriangleFailure]) {
    if failures.is_empty() {
        return;
    }
    log::warn!("{} triangle(s) could not be fetched:", failures.len());
    for failure in failures {
        log::warn!(
            "  {} triangle {} ({}): {}",
            failure.police_force_id,
            failure.index,
            failure.poly,
            failure.error
        );
    }
}

/// Cleans a raw population CSV into a new file.
///
/// # Errors
///
/// Returns [`PipelineError`] if reading, cleaning, or writing fails.
pub fn clean_population_file(input: &Path, output: &Path) -> Result<(), PipelineError> {
    let populations = read_population_csv(input)?;
    write_population_csv(output, &populations)
}

/// Prints counts, rates, category mix, and hotspots for a crime CSV.
///
/// # Errors
///
/// Returns [`PipelineError`] if an input cannot be read or the grid size
/// is invalid.
pub fn print_stats(
    crimes: &Path,
    population: Option<&Path>,
    forces: Option<&Path>,
    grid: f64,
    top: usize,
) -> Result<(), PipelineError> {
    let table = read_crime_csv(crimes)?;
    let populations = population.map(read_population_csv).transpose()?.unwrap_or_default();
    let forces = forces.map(read_forces_csv).transpose()?.unwrap_or_default();

    println!("{} crime(s)", table.len());

    println!();
    println!("{:<24} {:<32} {:>8}", "FORCE", "CATEGORY", "COUNT");
    for count in crime_counts(&table) {
        println!(
            "{:<24} {:<32} {:>8}",
            count.police_force_id, count.category, count.count
        );
    }

    println!();
    println!(
        "{:<32} {:>8} {:>12} {:>10}",
        "FORCE", "CRIMES", "POPULATION", "PER 1000"
    );
    for rate in crime_rates(&table, &populations, &forces) {
        println!(
            "{:<32} {:>8} {:>12} {:>10}",
            rate.police_force_name.unwrap_or(rate.police_force_id),
            rate.crime_count,
            rate.population.map_or_else(|| "-".to_string(), |p| p.to_string()),
            rate.crime_rate_per_1000
                .map_or_else(|| "-".to_string(), |r| format!("{r:.2}")),
        );
    }

    println!();
    println!("{:<32} {:>8} {:>8}", "CATEGORY", "COUNT", "%");
    for share in category_summary(&table, top) {
        println!(
            "{:<32} {:>8} {:>7.1}%",
            share.category, share.count, share.percentage
        );
    }

    println!();
    println!("{:>10} {:>10} {:>8}", "LAT", "LON", "COUNT");
    for spot in hotspots(&table, grid, top)? {
        println!(
            "{:>10.4} {:>10.4} {:>8}",
            spot.lat_bin, spot.lon_bin, spot.count
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_list_ignores_blanks() {
        assert_eq!(
            parse_force_list(" kent, ,essex,"),
            vec!["kent".to_string(), "essex".to_string()]
        );
        assert!(parse_force_list("").is_empty());
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = PipelineConfig::default();
        apply_overrides(
            &mut config,
            Some(PathBuf::from("out.csv")),
            Some("2024-02".to_string()),
            true,
        )
        .unwrap();

        assert_eq!(config.output, PathBuf::from("out.csv"));
        assert_eq!(config.date.as_deref(), Some("2024-02"));
        assert_eq!(config.failure_policy, FailurePolicy::Partial);
    }

    #[test]
    fn bad_date_override_is_rejected() {
        let mut config = PipelineConfig::default();
        assert!(apply_overrides(&mut config, None, Some("2024/02".to_string()), false).is_err());
    }
}
