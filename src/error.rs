//! Error types surfaced to callers of the forecast calculator.

use crate::compute::ledger::ComputationError;
use crate::compute::tree::BuildError;
use chrono::NaiveDate;
use thiserror::Error;

/// A reference that resolved when the graph was saved but not at calculation
/// time: the graph is well-formed, the data is out of sync.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Variable '{variable_id}' referenced by node '{node_id}' was not found")]
    VariableNotFound { variable_id: String, node_id: String },
    #[error("Metric '{metric_id}' referenced by seed node '{node_id}' was not found")]
    MetricNotFound { metric_id: String, node_id: String },
}

/// How the surrounding layer should report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request or graph is malformed (400-equivalent).
    BadRequest,
    /// The graph references data that no longer exists.
    DataOutOfSync,
    /// An internal invariant failed. Log it and return a generic failure.
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Graph validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },
    #[error("Forecast start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("Node evaluation failed: {0}")]
    Computation(#[from] ComputationError),
}

impl ForecastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ForecastError::Validation { .. }
            | ForecastError::InvalidRange { .. }
            | ForecastError::Build(_) => ErrorCategory::BadRequest,
            ForecastError::Data(_) => ErrorCategory::DataOutOfSync,
            ForecastError::Computation(_) => ErrorCategory::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let validation =
            ForecastError::Validation { errors: vec!["Cycle detected: a -> b -> a".into()] };
        assert_eq!(validation.category(), ErrorCategory::BadRequest);
        assert!(validation.to_string().contains("a -> b -> a"));

        let data: ForecastError =
            DataError::VariableNotFound { variable_id: "v9".into(), node_id: "d1".into() }.into();
        assert_eq!(data.category(), ErrorCategory::DataOutOfSync);
        assert_eq!(data.to_string(), "Variable 'v9' referenced by node 'd1' was not found");

        let internal: ForecastError = ComputationError::Mismatch { msg: "bad".into() }.into();
        assert_eq!(internal.category(), ErrorCategory::Internal);
    }
}
