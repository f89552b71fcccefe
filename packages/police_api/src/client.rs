//! HTTP client for the police.uk endpoints used by the pipeline.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uk_crime_crime_models::{
    BoundaryPoint, Neighbourhood, NeighbourhoodDetail, PoliceForce, StreetCrime,
};
use uk_crime_geometry::PolygonString;

use crate::{CrimeFetcher, PoliceApiError};

/// Public police.uk API root.
pub const DEFAULT_BASE_URL: &str = "https://data.police.uk/api";

/// Thin wrapper over a shared [`reqwest::Client`] rooted at a base URL.
#[derive(Debug, Clone)]
pub struct PoliceApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for PoliceApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl PoliceApiClient {
    /// Creates a client for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client reusing an existing [`reqwest::Client`].
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Returns the API root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PoliceApiError> {
        let url = self.url(path);
        log::trace!("GET {url} {query:?}");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PoliceApiError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Lists all territorial forces (`/forces`).
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError`] if the request fails.
    pub async fn forces(&self) -> Result<Vec<PoliceForce>, PoliceApiError> {
        self.get_json("forces", &[]).await
    }

    /// Lists the neighbourhoods of one force (`/{force}/neighbourhoods`),
    /// tagging each with the force id.
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError`] if the request fails.
    pub async fn neighbourhoods(
        &self,
        force_id: &str,
    ) -> Result<Vec<Neighbourhood>, PoliceApiError> {
        let mut neighbourhoods: Vec<Neighbourhood> = self
            .get_json(&format!("{force_id}/neighbourhoods"), &[])
            .await?;
        for neighbourhood in &mut neighbourhoods {
            neighbourhood.police_force_id = Some(force_id.to_string());
        }
        Ok(neighbourhoods)
    }

    /// Lists the neighbourhoods of several forces, one request per force.
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError`] on the first failing force.
    pub async fn all_neighbourhoods(
        &self,
        force_ids: &[String],
    ) -> Result<Vec<Neighbourhood>, PoliceApiError> {
        let mut all = Vec::new();
        for force_id in force_ids {
            let neighbourhoods = self.neighbourhoods(force_id).await?;
            log::info!("{force_id}: {} neighbourhoods", neighbourhoods.len());
            all.extend(neighbourhoods);
        }
        Ok(all)
    }

    /// Fetches the detail record of one neighbourhood (`/{force}/{id}`).
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError`] if the request fails.
    pub async fn neighbourhood(
        &self,
        force_id: &str,
        neighbourhood_id: &str,
    ) -> Result<NeighbourhoodDetail, PoliceApiError> {
        let mut detail: NeighbourhoodDetail = self
            .get_json(&format!("{force_id}/{neighbourhood_id}"), &[])
            .await?;
        detail.police_force_id = Some(force_id.to_string());
        Ok(detail)
    }

    /// Fetches detail records for every neighbourhood of `force_id` found
    /// in `neighbourhoods`.
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError`] on the first failing neighbourhood.
    pub async fn neighbourhood_details(
        &self,
        force_id: &str,
        neighbourhoods: &[Neighbourhood],
    ) -> Result<Vec<NeighbourhoodDetail>, PoliceApiError> {
        let mut details = Vec::new();
        for neighbourhood in neighbourhoods
            .iter()
            .filter(|n| n.police_force_id.as_deref() == Some(force_id))
        {
            details.push(self.neighbourhood(force_id, &neighbourhood.id).await?);
        }
        Ok(details)
    }

    /// Fetches the boundary vertices of one neighbourhood
    /// (`/{force}/{id}/boundary`).
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError`] if the request fails.
    pub async fn neighbourhood_boundary(
        &self,
        force_id: &str,
        neighbourhood_id: &str,
    ) -> Result<Vec<BoundaryPoint>, PoliceApiError> {
        self.get_json(&format!("{force_id}/{neighbourhood_id}/boundary"), &[])
            .await
    }
}

#[async_trait]
impl CrimeFetcher for PoliceApiClient {
    async fn street_crimes(
        &self,
        poly: &PolygonString,
        month: Option<&str>,
    ) -> Result<Vec<StreetCrime>, PoliceApiError> {
        let mut query = vec![("poly", poly.as_str())];
        if let Some(month) = month {
            query.push(("date", month));
        }
        self.get_json("crimes-street/all-crime", &query).await
    }
}
