//! Validation rule for the number and identity of each node's inputs.

use crate::store::{NodeId, NodeKind, Registry};
use crate::validation::error::{ValidationErrorType, ValidationIssue};
use std::collections::BTreeSet;

/// Checks a node's incoming edges against what its kind expects.
///
/// - DATA, CONSTANT and SEED are leaves and take no inputs.
/// - METRIC takes at most one input; none means it relies on budget/historical.
/// - OPERATOR's `inputOrder` must list exactly the sources of its incoming edges.
pub(crate) fn validate_inputs(registry: &Registry, node_id: NodeId) -> Vec<ValidationIssue> {
    let key = registry.key(node_id);
    let parents = registry.get_parents(node_id);
    let mut issues = Vec::new();

    let kind = registry.kind(node_id);
    if kind.is_leaf() {
        if !parents.is_empty() {
            issues.push(ValidationIssue::error(
                Some(key),
                ValidationErrorType::InputArity,
                format!(
                    "{} node '{}' cannot have inputs but has {}",
                    kind.node_type(),
                    key,
                    parents.len()
                ),
            ));
        }
        return issues;
    }

    match kind {
        NodeKind::Data(_) | NodeKind::Constant(_) | NodeKind::Seed(_) => {}
        NodeKind::Metric(attrs) => match parents.len() {
            0 => issues.push(ValidationIssue::warning(
                Some(key),
                ValidationErrorType::InputArity,
                format!(
                    "Metric '{}' ({}) has no inputs; its forecast falls back to \
                     budget/historical data",
                    attrs.label, key
                ),
            )),
            1 => {}
            n => issues.push(ValidationIssue::error(
                Some(key),
                ValidationErrorType::InputArity,
                format!(
                    "Metric '{}' ({}) has {} inputs; at most one is allowed",
                    attrs.label, key, n
                ),
            )),
        },
        NodeKind::Operator(attrs) => {
            let declared: BTreeSet<&str> = attrs.input_order.iter().map(String::as_str).collect();
            let wired: BTreeSet<&str> = parents.iter().map(|&p| registry.key(p)).collect();

            if declared.len() != attrs.input_order.len() {
                issues.push(ValidationIssue::error(
                    Some(key),
                    ValidationErrorType::OperatorInputMismatch,
                    format!(
                        "Operator node '{}' lists an input more than once in its inputOrder",
                        key
                    ),
                ));
            }
            if parents.len() != wired.len() {
                issues.push(ValidationIssue::error(
                    Some(key),
                    ValidationErrorType::OperatorInputMismatch,
                    format!("Operator node '{}' has more than one edge from the same input", key),
                ));
            }
            if declared != wired {
                let missing: Vec<&str> = declared.difference(&wired).copied().collect();
                let unexpected: Vec<&str> = wired.difference(&declared).copied().collect();
                issues.push(ValidationIssue::error(
                    Some(key),
                    ValidationErrorType::OperatorInputMismatch,
                    format!(
                        "Operator node '{}' inputOrder does not match its incoming edges \
                         (not wired: {:?}, not listed: {:?})",
                        key, missing, unexpected
                    ),
                ));
            }

            match parents.len() {
                0 => issues.push(ValidationIssue::error(
                    Some(key),
                    ValidationErrorType::InputArity,
                    format!("Operator node '{}' ({}) has no inputs", key, attrs.op.symbol()),
                )),
                1 => issues.push(ValidationIssue::warning(
                    Some(key),
                    ValidationErrorType::InputArity,
                    format!(
                        "Operator node '{}' ({}) has a single input and passes it through",
                        key,
                        attrs.op.symbol()
                    ),
                )),
                _ => {}
            }
        }
    }

    issues
}
