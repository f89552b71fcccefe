#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Street-level crime retrieval pipeline.
//!
//! Ties the geometry and API crates together:
//!
//! ```text
//! boundary file -> simplify -> triangulate -> encode -> fetch
//!               -> aggregate -> clean -> CSV
//! ```
//!
//! [`area`] drives one force (or one polygon) through the fetch stages,
//! [`aggregate`] and [`clean`] turn the raw responses into a flat
//! [`CrimeTable`](clean::CrimeTable), and [`output`] persists it. The
//! [`population`] and [`stats`] modules prepare the per-force summaries
//! consumed by charts downstream.

pub mod aggregate;
pub mod area;
pub mod clean;
pub mod config;
pub mod output;
pub mod population;
pub mod progress;
pub mod stats;

pub use aggregate::{CrimeSchema, IdentifierField, RawCrime, RawCrimeTable};
pub use area::{AreaOptions, AreaResult, RegionsResult, TriangleFailure};
pub use clean::{CrimeTable, clean};
pub use config::{FailurePolicy, PipelineConfig};

use uk_crime_geometry::GeometryError;
use uk_crime_police_api::PoliceApiError;

/// Errors that can occur while running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Loading or decomposing a boundary failed.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// A police.uk request failed.
    #[error("Police API error: {0}")]
    Api(#[from] PoliceApiError),

    /// Reading or writing CSV failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be parsed or is invalid.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// A population value could not be interpreted.
    #[error("Invalid population value: {value:?}")]
    Population {
        /// The offending raw value.
        value: String,
    },

    /// A caller-supplied parameter is out of range.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what went wrong.
        message: String,
    },
}
