//! Defines the issue and report types for the validation module.
use serde::{Deserialize, Serialize};

/// The specific category of a validation finding.
///
// This enum allows for programmatic inspection of findings, which is more
// robust than string matching on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorType {
    /// The graph has no METRIC node.
    MissingMetric,
    /// Two nodes share the same id.
    DuplicateNode,
    /// An edge names a node that does not exist.
    DanglingEdge,
    /// Edges form a cycle.
    Cycle,
    /// An OPERATOR's `inputOrder` disagrees with its incoming edges.
    OperatorInputMismatch,
    /// A node has more or fewer inputs than its kind allows.
    InputArity,
    /// A SEED references a METRIC that does not exist.
    OrphanedSeed,
    /// A node cannot reach any METRIC and is ignored by evaluation.
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A structured finding from the graph validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// The id of the node (or edge) where the issue was detected, if any.
    pub node_id: Option<String>,
    pub error_type: ValidationErrorType,
    pub severity: Severity,
    /// A human-readable message explaining the issue.
    pub message: String,
}

impl ValidationIssue {
    pub fn error(node_id: Option<&str>, error_type: ValidationErrorType, message: String) -> Self {
        Self {
            node_id: node_id.map(str::to_string),
            error_type,
            severity: Severity::Error,
            message,
        }
    }

    pub fn warning(
        node_id: Option<&str>,
        error_type: ValidationErrorType,
        message: String,
    ) -> Self {
        Self {
            node_id: node_id.map(str::to_string),
            error_type,
            severity: Severity::Warning,
            message,
        }
    }
}

/// The validation contract handed back to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub issues: Vec<ValidationIssue>,
}

impl GraphValidationResult {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let errors: Vec<String> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.message.clone())
            .collect();
        let warnings = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .map(|i| i.message.clone())
            .collect();
        Self { is_valid: errors.is_empty(), errors, warnings, issues }
    }

    pub fn has_error(&self, error_type: ValidationErrorType) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == Severity::Error && i.error_type == error_type)
    }
}
