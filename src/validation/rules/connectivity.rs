//! Validation rules over the whole graph: metric roots, cycles, unreachable nodes.

use crate::analysis::topology;
use crate::store::Registry;
use crate::validation::error::{ValidationErrorType, ValidationIssue};

pub(crate) fn validate_has_metric(registry: &Registry) -> Option<ValidationIssue> {
    if registry.metrics().is_empty() {
        return Some(ValidationIssue::error(
            None,
            ValidationErrorType::MissingMetric,
            "Graph has no METRIC node to evaluate".to_string(),
        ));
    }
    None
}

/// Edges must not loop. SEED references are temporal and are not edges.
pub(crate) fn validate_acyclic(registry: &Registry) -> Vec<ValidationIssue> {
    topology::find_cycles(registry)
        .into_iter()
        .map(|cycle| {
            let path: Vec<&str> = cycle.iter().map(|&id| registry.key(id)).collect();
            ValidationIssue::error(
                Some(path[0]),
                ValidationErrorType::Cycle,
                format!("Cycle detected: {}", path.join(" -> ")),
            )
        })
        .collect()
}

/// Nodes that feed no METRIC are never evaluated.
pub(crate) fn validate_connected(registry: &Registry) -> Vec<ValidationIssue> {
    let metrics = registry.metrics();
    if metrics.is_empty() {
        return Vec::new();
    }
    let reachable = topology::upstream_from(registry, &metrics);
    registry
        .ids()
        .filter(|id| !reachable.contains(id))
        .map(|id| {
            let key = registry.key(id);
            ValidationIssue::warning(
                Some(key),
                ValidationErrorType::Disconnected,
                format!(
                    "{} node '{}' is not connected to any metric and will be ignored",
                    registry.kind(id).node_type(),
                    key
                ),
            )
        })
        .collect()
}
