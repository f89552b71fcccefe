#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the `data.police.uk` REST API.
//!
//! Every call is a single GET. A non-success status is returned as
//! [`PoliceApiError::Status`] and is not retried. Street-level crime
//! queries go through the [`CrimeFetcher`] trait so the pipeline can be
//! driven by other sources in tests.

pub mod client;

pub use client::{DEFAULT_BASE_URL, PoliceApiClient};

use async_trait::async_trait;
use uk_crime_crime_models::StreetCrime;
use uk_crime_geometry::PolygonString;

/// Errors that can occur when talking to the police.uk API.
#[derive(Debug, thiserror::Error)]
pub enum PoliceApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("API error: {status} ({url})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL, without query string.
        url: String,
    },
}

/// Source of street-level crimes for an encoded polygon.
#[async_trait]
pub trait CrimeFetcher: Send + Sync {
    /// Fetches all crimes inside `poly`, optionally restricted to one
    /// `YYYY-MM` month (the API defaults to the latest month).
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError`] if the request fails or the response is
    /// not a crime list.
    async fn street_crimes(
        &self,
        poly: &PolygonString,
        month: Option<&str>,
    ) -> Result<Vec<StreetCrime>, PoliceApiError>;
}
