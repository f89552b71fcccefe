#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `uk_crime`: fetch, clean, and summarise police.uk street-level crime.
//!
//! With no subcommand the tool runs interactively, prompting for forces
//! and options before fetching.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uk_crime_pipeline::PipelineConfig;
use uk_crime_police_api::PoliceApiClient;

use crate::commands::BoundarySource;

#[derive(Parser)]
#[command(name = "uk_crime", about = "UK street-level crime pipeline")]
struct Cli {
    /// Config file (defaults to `UK_CRIME_CONFIG`, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List police forces
    Forces {
        /// Also write the list as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the neighbourhoods of one or more forces
    Neighbourhoods {
        /// Comma-separated force identifiers (e.g., "leicestershire,kent")
        forces: String,
        /// Also fetch each neighbourhood's population and force page
        #[arg(long)]
        details: bool,
        /// Also write the list as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show one neighbourhood's details
    Neighbourhood {
        /// Force identifier (e.g., "leicestershire")
        force: String,
        /// Neighbourhood identifier (e.g., "NC04")
        id: String,
    },
    /// Fetch and clean crimes for one force or neighbourhood
    Fetch {
        /// Force identifier (e.g., "leicestershire")
        force: String,
        /// Boundary file (KML, `GeoJSON`, or police.uk JSON) instead of the
        /// configured `{boundary_dir}/{force}.kml`
        #[arg(long, conflicts_with = "neighbourhood")]
        boundary: Option<PathBuf>,
        /// Use a neighbourhood's boundary from the API
        #[arg(long)]
        neighbourhood: Option<String>,
        /// Output CSV (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Month to fetch, `YYYY-MM` (overrides config)
        #[arg(long)]
        date: Option<String>,
        /// Keep going when a triangle fails
        #[arg(long)]
        partial: bool,
    },
    /// Fetch and clean crimes for several forces
    FetchAll {
        /// Comma-separated force identifiers (overrides config)
        #[arg(long)]
        forces: Option<String>,
        /// Output CSV (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Month to fetch, `YYYY-MM` (overrides config)
        #[arg(long)]
        date: Option<String>,
        /// Keep going when a triangle fails
        #[arg(long)]
        partial: bool,
    },
    /// Normalise a population CSV (e.g. "1.2m" to 1200000)
    Population {
        /// Raw CSV with `police_force_id` and `population` columns
        input: PathBuf,
        /// Cleaned CSV to write
        output: PathBuf,
    },
    /// Summarise a cleaned crime CSV
    Stats {
        /// Crime CSV written by `fetch` or `fetch-all`
        #[arg(long)]
        crimes: PathBuf,
        /// Population CSV, enables crime rates
        #[arg(long)]
        population: Option<PathBuf>,
        /// Force CSV written by `forces --output`, adds force names
        #[arg(long)]
        forces: Option<PathBuf>,
        /// Hotspot grid cell size in degrees
        #[arg(long, default_value = "0.01")]
        grid: f64,
        /// Number of hotspots and categories to show
        #[arg(long, default_value = "5")]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = uk_crime_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = PipelineConfig::resolve(cli.config.as_deref())?;
    let client = PoliceApiClient::new(config.api_base_url.clone());

    let Some(command) = cli.command else {
        return interactive::run(&multi, &client, config).await;
    };

    match command {
        Commands::Forces { output } => {
            commands::list_forces(&client, output.as_deref()).await?;
        }
        Commands::Neighbourhoods {
            forces,
            details,
            output,
        } => {
            let forces = commands::parse_force_list(&forces);
            commands::list_neighbourhoods(&client, &forces, details, output.as_deref()).await?;
        }
        Commands::Neighbourhood { force, id } => {
            commands::show_neighbourhood(&client, &force, &id).await?;
        }
        Commands::Fetch {
            force,
            boundary,
            neighbourhood,
            output,
            date,
            partial,
        } => {
            commands::apply_overrides(&mut config, output, date, partial)?;
            let source = match (boundary, neighbourhood) {
                (Some(path), _) => BoundarySource::File(path),
                (None, Some(id)) => BoundarySource::Neighbourhood(id),
                (None, None) => BoundarySource::Configured,
            };
            commands::fetch_force(&multi, &client, &config, &force, source).await?;
        }
        Commands::FetchAll {
            forces,
            output,
            date,
            partial,
        } => {
            commands::apply_overrides(&mut config, output, date, partial)?;
            let forces = forces.map_or_else(
                || config.forces.clone(),
                |list| commands::parse_force_list(&list),
            );
            commands::fetch_all(&multi, &client, &config, &forces).await?;
        }
        Commands::Population { input, output } => {
            commands::clean_population_file(&input, &output)?;
        }
        Commands::Stats {
            crimes,
            population,
            forces,
            grid,
            top,
        } => {
            commands::print_stats(&crimes, population.as_deref(), forces.as_deref(), grid, top)?;
        }
    }

    Ok(())
}
