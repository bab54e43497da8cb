//! Engine configuration.
//!
//! Pins the two policies the graph itself cannot express: what a SEED reads
//! in the first month of the horizon, and what a METRIC forecasts when it
//! does not use its calculated subtree. Loadable from TOML:
//!
//! ```toml
//! seed_bootstrap = "prior_historical"
//! metric_fallback = "budget"
//! include_node_results = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Value a SEED node yields in the first month of the range, where the
/// source metric has no computed previous month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedBootstrap {
    /// The seed is missing, so everything depending on it is missing for that month.
    #[default]
    Null,
    /// The source metric's historical variable at the month before the range start.
    PriorHistorical,
}

/// Forecast of a METRIC whose `useCalculated` is false, or which has no input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFallback {
    /// The metric's budget value for the same month.
    #[default]
    Budget,
    /// The metric's historical value for the same month.
    Historical,
    /// No forecast.
    Null,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed_bootstrap: SeedBootstrap,
    pub metric_fallback: MetricFallback,
    /// Emit per-node results alongside metric results.
    pub include_node_results: bool,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid engine config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.seed_bootstrap, SeedBootstrap::Null);
        assert_eq!(cfg.metric_fallback, MetricFallback::Budget);
        assert!(!cfg.include_node_results);
    }

    #[test]
    fn test_partial_config() {
        let cfg = EngineConfig::from_toml_str("seed_bootstrap = \"prior_historical\"").unwrap();
        assert_eq!(cfg.seed_bootstrap, SeedBootstrap::PriorHistorical);
        assert_eq!(cfg.metric_fallback, MetricFallback::Budget);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = EngineConfig::from_toml_str("metric_fallback = \"zero\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "metric_fallback = \"historical\"\ninclude_node_results = true").unwrap();
        let cfg = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.metric_fallback, MetricFallback::Historical);
        assert!(cfg.include_node_results);
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
