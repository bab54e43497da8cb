//! The central validator that orchestrates the execution of all validation rules.
use super::error::GraphValidationResult;
use super::rules::{connectivity, inputs, references};
use crate::store::{Edge, Node, Registry};

/// The orchestrator for structural graph checks.
///
/// This struct holds the raw nodes and edges and runs every rule against
/// them, collecting all problems before any evaluation is attempted. It is
/// a pure function of its inputs.
pub struct Validator<'a> {
    nodes: &'a [Node],
    edges: &'a [Edge],
}

impl<'a> Validator<'a> {
    /// Creates a new validator for one forecast's graph.
    pub fn new(nodes: &'a [Node], edges: &'a [Edge]) -> Self {
        Self { nodes, edges }
    }

    /// Executes all registered validation rules against the graph.
    pub fn validate(&self) -> GraphValidationResult {
        let mut issues = references::validate_unique_ids(self.nodes);
        issues.extend(references::validate_edges(self.nodes, self.edges));

        let registry = Registry::from_graph(self.nodes, self.edges);
        issues.extend(connectivity::validate_has_metric(&registry));
        issues.extend(connectivity::validate_acyclic(&registry));

        // Per-node rules are local to a node and its direct inputs.
        for node_id in registry.ids() {
            issues.extend(inputs::validate_inputs(&registry, node_id));
            issues.extend(references::validate_seed(&registry, node_id));
        }

        issues.extend(connectivity::validate_connected(&registry));

        GraphValidationResult::from_issues(issues)
    }
}

/// Validates a forecast graph. See [`Validator`].
pub fn validate_graph(nodes: &[Node], edges: &[Edge]) -> GraphValidationResult {
    Validator::new(nodes, edges).validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Operation;
    use crate::validation::ValidationErrorType;
    use rstest::rstest;

    fn revenue_graph() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            Node::data("units", "Units", "v_units", 0),
            Node::constant("price", "Price", 25.0),
            Node::operator("mul", Operation::Multiply, &["units", "price"]),
            Node::metric("rev", "Revenue", Some("v_budget"), Some("v_actual"), true),
        ];
        let edges = vec![
            Edge::new("e1", "units", "mul"),
            Edge::new("e2", "price", "mul"),
            Edge::new("e3", "mul", "rev"),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_valid_graph_passes() {
        let (nodes, edges) = revenue_graph();
        let result = validate_graph(&nodes, &edges);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    }

    #[test]
    fn test_operator_cycle_rejected() {
        let nodes = vec![
            Node::constant("c", "C", 1.0),
            Node::operator("a", Operation::Add, &["c", "b"]),
            Node::operator("b", Operation::Add, &["a"]),
            Node::metric("m", "M", None, None, true),
        ];
        let edges = vec![
            Edge::new("e1", "c", "a"),
            Edge::new("e2", "b", "a"),
            Edge::new("e3", "a", "b"),
            Edge::new("e4", "b", "m"),
        ];
        let result = validate_graph(&nodes, &edges);
        assert!(!result.is_valid);
        assert!(result.has_error(ValidationErrorType::Cycle));
        let cycle_msg = result.errors.iter().find(|e| e.starts_with("Cycle detected")).unwrap();
        assert!(cycle_msg.contains('a') && cycle_msg.contains('b'), "{}", cycle_msg);
    }

    #[test]
    fn test_orphaned_seed_rejected() {
        let nodes = vec![
            Node::seed("s", "ghost_metric"),
            Node::constant("k", "K", 10.0),
            Node::operator("add", Operation::Add, &["s", "k"]),
            Node::metric("m", "M", None, None, true),
        ];
        let edges = vec![
            Edge::new("e1", "s", "add"),
            Edge::new("e2", "k", "add"),
            Edge::new("e3", "add", "m"),
        ];
        let result = validate_graph(&nodes, &edges);
        assert!(!result.is_valid);
        assert!(result.has_error(ValidationErrorType::OrphanedSeed));
        assert!(result.errors.iter().any(|e| e.contains("ghost_metric")));
    }

    #[test]
    fn test_self_seed_is_not_a_cycle() {
        let nodes = vec![
            Node::seed("s", "m"),
            Node::constant("k", "K", 10.0),
            Node::operator("add", Operation::Add, &["s", "k"]),
            Node::metric("m", "M", None, None, true),
        ];
        let edges = vec![
            Edge::new("e1", "s", "add"),
            Edge::new("e2", "k", "add"),
            Edge::new("e3", "add", "m"),
        ];
        let result = validate_graph(&nodes, &edges);
        assert!(result.is_valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_no_metric_is_an_error() {
        let nodes = vec![Node::constant("c", "C", 1.0)];
        let result = validate_graph(&nodes, &[]);
        assert!(!result.is_valid);
        assert!(result.has_error(ValidationErrorType::MissingMetric));
    }

    #[test]
    fn test_metric_without_inputs_only_warns() {
        let nodes = vec![Node::metric("m", "Headcount", Some("v_budget"), None, false)];
        let result = validate_graph(&nodes, &[]);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Headcount"));
    }

    #[rstest]
    #[case::unlisted_edge(&["units"], "not listed: [\"price\"]")]
    #[case::unwired_input(&["units", "price", "extra"], "not wired: [\"extra\"]")]
    fn test_operator_input_order_mismatch(#[case] order: &[&str], #[case] fragment: &str) {
        let (mut nodes, edges) = revenue_graph();
        nodes[2] = Node::operator("mul", Operation::Multiply, order);
        let result = validate_graph(&nodes, &edges);
        assert!(!result.is_valid);
        assert!(result.has_error(ValidationErrorType::OperatorInputMismatch));
        assert!(
            result.errors.iter().any(|e| e.contains("'mul'") && e.contains(fragment)),
            "{:?}",
            result.errors
        );
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let (nodes, mut edges) = revenue_graph();
        edges.push(Edge::new("e9", "nowhere", "rev"));
        let result = validate_graph(&nodes, &edges);
        assert!(result.has_error(ValidationErrorType::DanglingEdge));
        assert!(result.errors.iter().any(|e| e.contains("'e9'") && e.contains("nowhere")));
    }

    #[test]
    fn test_leaf_with_input_rejected() {
        let (nodes, mut edges) = revenue_graph();
        edges.push(Edge::new("e9", "price", "units"));
        let result = validate_graph(&nodes, &edges);
        assert!(result.has_error(ValidationErrorType::InputArity));
        let msg = "DATA node 'units' cannot have inputs but has 1";
        assert!(result.errors.iter().any(|e| e == msg), "{:?}", result.errors);
    }

    #[test]
    fn test_disconnected_node_warns() {
        let (mut nodes, edges) = revenue_graph();
        nodes.push(Node::constant("stray", "Stray", 3.0));
        let result = validate_graph(&nodes, &edges);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("'stray'")));
    }
}
