//! Pipeline configuration.
//!
//! Configuration is TOML. When no file is given the embedded
//! `config/default.toml` is used. A file can be named explicitly or via
//! the [`CONFIG_ENV_VAR`] environment variable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uk_crime_geometry::DEFAULT_TOLERANCE;
use uk_crime_police_api::DEFAULT_BASE_URL;

use crate::PipelineError;

/// Embedded default configuration.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Environment variable naming a config file to load.
pub const CONFIG_ENV_VAR: &str = "UK_CRIME_CONFIG";

/// What to do when fetching one triangle of an area fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the area and return the error.
    #[default]
    Abort,
    /// Keep fetching the remaining triangles and report the failures.
    Partial,
}

/// Settings for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root of the police.uk API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Simplification tolerance in degrees.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Directory holding `{force_id}.kml` boundary files.
    #[serde(default = "default_boundary_dir")]
    pub boundary_dir: PathBuf,
    /// CSV file the cleaned crime table is written to.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Per-triangle failure handling.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Month to query (`YYYY-MM`); the API's latest month when absent.
    #[serde(default)]
    pub date: Option<String>,
    /// Forces processed by `fetch-all` when none are given.
    #[serde(default)]
    pub forces: Vec<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_boundary_dir() -> PathBuf {
    PathBuf::from("data/kml")
}

fn default_output() -> PathBuf {
    PathBuf::from("data/street_crimes.csv")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            tolerance: default_tolerance(),
            boundary_dir: default_boundary_dir(),
            output: default_output(),
            failure_policy: FailurePolicy::default(),
            date: None,
            forces: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a TOML config.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the TOML is malformed or a
    /// value is out of range.
    pub fn parse(toml_str: &str) -> Result<Self, PipelineError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|e| PipelineError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the embedded default config.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the embedded TOML is invalid.
    pub fn embedded() -> Result<Self, PipelineError> {
        Self::parse(DEFAULT_CONFIG_TOML)
    }

    /// Loads the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        log::debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Loads `explicit` if given, else the file named by
    /// [`CONFIG_ENV_VAR`], else the embedded default.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the chosen file cannot be loaded.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, PipelineError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Self::embedded(),
        }
    }

    /// Checks value ranges that TOML typing cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(PipelineError::Config {
                message: format!("tolerance must be a non-negative number, got {}", self.tolerance),
            });
        }
        if self.api_base_url.trim().is_empty() {
            return Err(PipelineError::Config {
                message: "api_base_url must not be empty".to_string(),
            });
        }
        if let Some(date) = &self.date {
            validate_month(date)?;
        }
        Ok(())
    }

    /// Path of the boundary file for `force_id`.
    #[must_use]
    pub fn boundary_path(&self, force_id: &str) -> PathBuf {
        self.boundary_dir.join(format!("{force_id}.kml"))
    }
}

/// Checks that `month` is a `YYYY-MM` string.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] if it is not.
pub fn validate_month(month: &str) -> Result<(), PipelineError> {
    crate::clean::parse_month(month)
        .map(|_| ())
        .ok_or_else(|| PipelineError::Config {
            message: format!("date must be YYYY-MM, got {month:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_parses() {
        let config = PipelineConfig::embedded().unwrap();
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert!((config.tolerance - DEFAULT_TOLERANCE).abs() < f64::EPSILON);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.date, None);
        assert_eq!(
            config.forces,
            vec!["bedfordshire", "hertfordshire", "thames-valley"]
        );
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = PipelineConfig::parse("forces = [\"leicestershire\"]").unwrap();
        let defaults = PipelineConfig::default();
        assert_eq!(config.api_base_url, defaults.api_base_url);
        assert_eq!(config.boundary_dir, defaults.boundary_dir);
        assert_eq!(config.output, defaults.output);
        assert_eq!(config.forces, vec!["leicestershire"]);
    }

    #[test]
    fn parses_partial_policy_and_date() {
        let config = PipelineConfig::parse(
            r#"
            failure_policy = "partial"
            date = "2024-03"
            "#,
        )
        .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Partial);
        assert_eq!(config.date.as_deref(), Some("2024-03"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            PipelineConfig::parse("tolerance = -1.0"),
            Err(PipelineError::Config { .. })
        ));
        assert!(matches!(
            PipelineConfig::parse("date = \"March 2024\""),
            Err(PipelineError::Config { .. })
        ));
        assert!(matches!(
            PipelineConfig::parse("failure_policy = \"retry\""),
            Err(PipelineError::Config { .. })
        ));
    }

    #[test]
    fn boundary_path_uses_force_id() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.boundary_path("leicestershire"),
            PathBuf::from("data/kml/leicestershire.kml")
        );
    }
}
