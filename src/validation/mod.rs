//! Structural validation of a forecast graph.
//!
//! The `Validator` runs a series of checks against the nodes and edges
//! *before* any computation is performed, so an invalid graph is rejected as
//! a whole and never partially evaluated.

pub use self::error::{GraphValidationResult, Severity, ValidationErrorType, ValidationIssue};
pub use self::validator::{validate_graph, Validator};

// --- MODULE DECLARATIONS ---
mod error;
mod validator;
mod rules {
    pub mod connectivity;
    pub mod inputs;
    pub mod references;
}
