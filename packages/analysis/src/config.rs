//! Analysis settings.
//!
//! Defaults are embedded from `config/analysis.toml` at compile time. A
//! deployment can supply its own TOML file and override individual values
//! through `AI_*` environment variables.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::clustering::{self, WardClusterer};
use crate::correlation::{self, CorrelationAnalyzer};

const DEFAULT_CONFIG_TOML: &str = include_str!("../config/analysis.toml");

/// Environment variable overriding [`AnalysisConfig::correlation_threshold`].
pub const ENV_CORRELATION_THRESHOLD: &str = "AI_CORRELATION_THRESHOLD";
/// Environment variable overriding [`AnalysisConfig::cluster_count`].
pub const ENV_CLUSTER_COUNT: &str = "AI_CLUSTER_COUNT";
/// Environment variable overriding [`AnalysisConfig::cluster_seed`].
pub const ENV_CLUSTER_SEED: &str = "AI_CLUSTER_SEED";

/// Errors that can occur while loading analysis settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid TOML or has wrong types.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or an environment override is malformed.
    #[error("Invalid config value for {key}: {message}")]
    Invalid {
        /// Setting or environment variable name.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Tunable parameters of the analysis services.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Minimum `|r|` between environment and education before the combined
    /// environment/education action is considered.
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,
    /// Cluster count when the caller does not request one.
    #[serde(default = "default_cluster_count")]
    pub cluster_count: usize,
    /// Seed for k-means initialization.
    #[serde(default = "default_cluster_seed")]
    pub cluster_seed: u64,
    /// Independent k-means initializations.
    #[serde(default = "default_cluster_restarts")]
    pub cluster_restarts: usize,
    /// Lloyd iteration cap per initialization.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

const fn default_correlation_threshold() -> f64 {
    correlation::DEFAULT_CORRELATION_THRESHOLD
}

const fn default_cluster_count() -> usize {
    clustering::DEFAULT_CLUSTER_COUNT
}

const fn default_cluster_seed() -> u64 {
    clustering::DEFAULT_SEED
}

const fn default_cluster_restarts() -> usize {
    clustering::DEFAULT_RESTARTS
}

const fn default_max_iterations() -> usize {
    clustering::DEFAULT_MAX_ITERATIONS
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: default_correlation_threshold(),
            cluster_count: default_cluster_count(),
            cluster_seed: default_cluster_seed(),
            cluster_restarts: default_cluster_restarts(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl AnalysisConfig {
    /// The embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded TOML is malformed.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
    }

    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is out of
    /// range.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading analysis config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Applies `AI_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but cannot be
    /// parsed, or the resulting value is out of range.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = parse_override(&lookup, ENV_CORRELATION_THRESHOLD)? {
            self.correlation_threshold = value;
        }
        if let Some(value) = parse_override(&lookup, ENV_CLUSTER_COUNT)? {
            self.cluster_count = value;
        }
        if let Some(value) = parse_override(&lookup, ENV_CLUSTER_SEED)? {
            self.cluster_seed = value;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return Err(ConfigError::Invalid {
                key: "correlation_threshold",
                message: format!("{} is not in [0, 1]", self.correlation_threshold),
            });
        }
        if self.cluster_count == 0 {
            return Err(ConfigError::Invalid {
                key: "cluster_count",
                message: "must be at least 1".to_string(),
            });
        }
        if self.cluster_restarts == 0 {
            return Err(ConfigError::Invalid {
                key: "cluster_restarts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                key: "max_iterations",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Builds a [`CorrelationAnalyzer`] from these settings.
    #[must_use]
    pub const fn correlation_analyzer(&self) -> CorrelationAnalyzer {
        CorrelationAnalyzer::new(self.correlation_threshold)
    }

    /// Builds a [`WardClusterer`] from these settings.
    #[must_use]
    pub const fn ward_clusterer(&self) -> WardClusterer {
        WardClusterer::new(self.cluster_count)
            .with_seed(self.cluster_seed)
            .with_restarts(self.cluster_restarts)
            .with_max_iterations(self.max_iterations)
    }
}

fn parse_override<T>(
    lookup: &impl Fn(&'static str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value = raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        message: format!("'{raw}': {e}"),
    })?;
    log::debug!("Config override from {key}");
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: BTreeMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn embedded_config_matches_defaults() {
        assert_eq!(AnalysisConfig::embedded().unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config = AnalysisConfig::from_toml_str("cluster_count = 3").unwrap();
        assert_eq!(config.cluster_count, 3);
        assert!((config.correlation_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.cluster_seed, 42);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("correlation_threshold = 1.5"),
            Err(ConfigError::Invalid {
                key: "correlation_threshold",
                ..
            })
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("cluster_count = 0"),
            Err(ConfigError::Invalid {
                key: "cluster_count",
                ..
            })
        ));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("clusters = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let config = AnalysisConfig::default()
            .with_overrides(env(&[
                (ENV_CORRELATION_THRESHOLD, "0.3"),
                (ENV_CLUSTER_COUNT, " 7 "),
            ]))
            .unwrap();
        assert!((config.correlation_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.cluster_count, 7);
        assert_eq!(config.cluster_seed, 42);
    }

    #[test]
    fn malformed_env_override_is_an_error() {
        let err = AnalysisConfig::default()
            .with_overrides(env(&[(ENV_CLUSTER_COUNT, "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: ENV_CLUSTER_COUNT,
                ..
            }
        ));
    }

    #[test]
    fn builds_configured_services() {
        let config = AnalysisConfig::from_toml_str(
            "correlation_threshold = 0.6\ncluster_count = 2\ncluster_seed = 7",
        )
        .unwrap();
        assert!((config.correlation_analyzer().correlation_threshold() - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.ward_clusterer().cluster_count(), 2);
        assert_eq!(
            config.ward_clusterer(),
            WardClusterer::new(2).with_seed(7)
        );
    }
}
