use crate::store::{NodeId, Registry};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use std::collections::{HashSet, VecDeque};

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    None,
    Visiting, // Used for cycle detection
    Visited,
}

/// Finds every cycle reachable through edges, using DFS with a recursion stack.
///
/// Each cycle is returned in edge direction and closed, e.g. `[a, c, b, a]`
/// for the edges `a -> c -> b -> a`. SEED references are not edges, so
/// temporal recurrence never shows up here.
pub fn find_cycles(registry: &Registry) -> Vec<Vec<NodeId>> {
    let count = registry.count();
    let mut state = vec![VisitState::None; count];
    let mut stack = Vec::new();
    let mut cycles = Vec::new();

    // Iterate 0..count so disconnected components are checked too.
    for i in 0..count {
        if state[i] == VisitState::None {
            visit(NodeId::new(i), registry, &mut state, &mut stack, &mut cycles);
        }
    }
    cycles
}

fn visit(
    node: NodeId,
    registry: &Registry,
    state: &mut Vec<VisitState>,
    stack: &mut Vec<NodeId>,
    cycles: &mut Vec<Vec<NodeId>>,
) {
    state[node.index()] = VisitState::Visiting;
    stack.push(node);

    for child in registry.get_children(node) {
        match state[child.index()] {
            VisitState::None => visit(child, registry, state, stack, cycles),
            VisitState::Visiting => {
                let start = stack.iter().position(|&n| n == child).unwrap_or(0);
                let mut cycle: Vec<NodeId> = stack[start..].to_vec();
                cycle.push(child);
                cycles.push(cycle);
            }
            VisitState::Visited => {}
        }
    }

    stack.pop();
    state[node.index()] = VisitState::Visited;
}

/// Every node from which one of `targets` can be reached (targets included).
pub fn upstream_from(registry: &Registry, targets: &[NodeId]) -> HashSet<NodeId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from(targets.to_vec());

    while let Some(node) = queue.pop_front() {
        if visited.insert(node) {
            for &parent in registry.get_parents(node) {
                queue.push_back(parent);
            }
        }
    }
    visited
}

/// Orders metrics so that each one comes after the metrics it depends on.
///
/// `dependencies` holds `(source, dependent)` pairs. Self-dependencies are a
/// legal recurrence and are ignored. On failure the members of one cycle are
/// returned, sorted by node id.
pub fn metric_order(
    metrics: &[NodeId],
    dependencies: &[(NodeId, NodeId)],
) -> Result<Vec<NodeId>, Vec<NodeId>> {
    let mut graph: DiGraphMap<NodeId, ()> =
        DiGraphMap::with_capacity(metrics.len(), dependencies.len());
    for &metric in metrics {
        graph.add_node(metric);
    }
    for &(source, dependent) in dependencies {
        if source != dependent {
            graph.add_edge(source, dependent, ());
        }
    }

    toposort(&graph, None).map_err(|cycle| {
        let culprit = cycle.node_id();
        let mut members = tarjan_scc(&graph)
            .into_iter()
            .find(|component| component.contains(&culprit))
            .unwrap_or_else(|| vec![culprit]);
        members.sort();
        members
    })
}
