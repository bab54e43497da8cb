//! Validation rules for id references: duplicate nodes, dangling edges, orphaned seeds.

use crate::store::{Edge, Node, NodeId, NodeKind, Registry};
use crate::validation::error::{ValidationErrorType, ValidationIssue};
use std::collections::HashSet;

/// Every node id must be unique within a forecast.
pub(crate) fn validate_unique_ids(nodes: &[Node]) -> Vec<ValidationIssue> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut issues = Vec::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) && reported.insert(node.id.as_str()) {
            issues.push(ValidationIssue::error(
                Some(&node.id),
                ValidationErrorType::DuplicateNode,
                format!("Duplicate node id '{}'", node.id),
            ));
        }
    }
    issues
}

/// Both ends of every edge must exist in the node set.
pub(crate) fn validate_edges(nodes: &[Node], edges: &[Edge]) -> Vec<ValidationIssue> {
    let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut issues = Vec::new();
    for edge in edges {
        for (end, id) in [("source", &edge.source_node_id), ("target", &edge.target_node_id)] {
            if !known.contains(id.as_str()) {
                issues.push(ValidationIssue::error(
                    Some(&edge.id),
                    ValidationErrorType::DanglingEdge,
                    format!("Edge '{}' references missing {} node '{}'", edge.id, end, id),
                ));
            }
        }
    }
    issues
}

/// "The Orphaned Seed Rule": a SEED must point at a METRIC that exists in this graph.
///
/// A dangling reference means the client and server disagree about the graph,
/// so it is an error rather than a warning.
pub(crate) fn validate_seed(registry: &Registry, node_id: NodeId) -> Option<ValidationIssue> {
    let NodeKind::Seed(attrs) = registry.kind(node_id) else {
        return None;
    };
    let key = registry.key(node_id);
    match registry.lookup(&attrs.source_metric_id).map(|id| registry.kind(id)) {
        Some(NodeKind::Metric(_)) => None,
        Some(other) => Some(ValidationIssue::error(
            Some(key),
            ValidationErrorType::OrphanedSeed,
            format!(
                "Seed node '{}' references '{}', which is a {} node, not a METRIC",
                key,
                attrs.source_metric_id,
                other.node_type()
            ),
        )),
        None => Some(ValidationIssue::error(
            Some(key),
            ValidationErrorType::OrphanedSeed,
            format!(
                "Seed node '{}' references metric '{}', which does not exist",
                key, attrs.source_metric_id
            ),
        )),
    }
}
