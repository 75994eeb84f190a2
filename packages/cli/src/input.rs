//! JSON request files accepted by the CLI.

use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use ward_insights_analysis_models::{
    AirQualityRecord, EnergyRecord, SchoolRecord, WardProfile, WardSeries,
};

/// Errors that can occur while reading a request file.
#[derive(Debug, Error)]
pub enum InputError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid JSON for the expected request.
    #[error("Invalid request in {path}: {source}")]
    Json {
        /// File that failed.
        path: String,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Paired series for the single-pair correlation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationRequest {
    /// Environment values (e.g. AQI).
    pub env_values: Vec<f64>,
    /// Education scores aligned with `env_values`.
    pub edu_scores: Vec<f64>,
}

/// Raw observation records for one ward.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardRequest {
    /// Ward name.
    pub ward: String,
    /// Air-quality observations.
    #[serde(default)]
    pub air_quality: Vec<AirQualityRecord>,
    /// School records.
    #[serde(default)]
    pub schools: Vec<SchoolRecord>,
    /// Energy-mix observations.
    #[serde(default)]
    pub energy: Vec<EnergyRecord>,
}

impl WardRequest {
    /// Converts the records into analysis series.
    #[must_use]
    pub fn series(&self) -> WardSeries {
        WardSeries::from_records(&self.air_quality, &self.schools, &self.energy)
    }
}

/// Ward profiles to cluster.
pub type ClusterRequest = Vec<WardProfile>;

/// Reads and deserializes a JSON request file.
///
/// # Errors
///
/// Returns [`InputError`] if the file cannot be read or parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let contents = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_json(&contents, path)
}

fn parse_json<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T, InputError> {
    serde_json::from_str(contents).map_err(|source| InputError::Json {
        path: path.display().to_string(),
        source,
    })
}
