use super::types::*;
use std::collections::HashMap;
use tracing::warn;

/// Flat arena over one forecast's graph: string ids are resolved to dense
/// `NodeId`s once, and every later pass works on indices.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    // Columnar Arrays
    pub keys: Vec<String>,
    pub kinds: Vec<NodeKind>,

    // Topology (CSR-ish + Adjacency)
    pub parents_flat: Vec<NodeId>,
    pub parents_ranges: Vec<(u32, u32)>, // (start, count)

    // Downstream traversal helpers
    pub first_child: Vec<u32>,
    pub child_targets: Vec<NodeId>,
    pub next_child: Vec<u32>,

    index: HashMap<String, NodeId>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.kinds.len() }

    /// Builds the arena from raw nodes and edges.
    ///
    /// Duplicate node ids keep their first occurrence and edges naming an
    /// unknown node are skipped; the validator reports both. Node and edge
    /// counts are capped at the `u32` index range.
    pub fn from_graph(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut reg = Self::new();
        for node in nodes {
            if reg.index.contains_key(&node.id) {
                continue;
            }
            let Some(id) = NodeId::try_new(reg.kinds.len()) else {
                warn!(nodes = nodes.len(), "graph exceeds the NodeId range; extra nodes ignored");
                break;
            };
            reg.index.insert(node.id.clone(), id);
            reg.keys.push(node.id.clone());
            reg.kinds.push(node.kind.clone());
            reg.first_child.push(u32::MAX);
        }

        // Incoming sources per target, in edge discovery order.
        let mut incoming: Vec<Vec<NodeId>> = vec![Vec::new(); reg.count()];
        for edge in edges {
            let source = reg.lookup(&edge.source_node_id);
            let target = reg.lookup(&edge.target_node_id);
            let (Some(source), Some(target)) = (source, target) else {
                continue;
            };
            // u32::MAX terminates the child lists.
            let next = u32::try_from(reg.child_targets.len()).ok().filter(|&e| e != u32::MAX);
            let Some(new_edge) = next else {
                warn!(
                    edges = edges.len(),
                    "graph exceeds the edge index range; extra edges ignored"
                );
                break;
            };
            incoming[target.index()].push(source);

            // Register Children (Adjacency list for downstream lookups)
            let head = reg.first_child[source.index()];
            reg.child_targets.push(target);
            reg.next_child.push(head);
            reg.first_child[source.index()] = new_edge;
        }

        for parents in incoming {
            let start = reg.parents_flat.len() as u32;
            reg.parents_flat.extend_from_slice(&parents);
            reg.parents_ranges.push((start, parents.len() as u32));
        }

        reg
    }

    #[inline]
    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    #[inline(always)]
    pub fn key(&self, id: NodeId) -> &str { &self.keys[id.index()] }

    #[inline(always)]
    pub fn kind(&self, id: NodeId) -> &NodeKind { &self.kinds[id.index()] }

    /// Sources of the edges targeting `id`, in edge order.
    #[inline(always)]
    pub fn get_parents(&self, id: NodeId) -> &[NodeId] {
        let (start, count) = self.parents_ranges[id.index()];
        &self.parents_flat[start as usize..(start + count) as usize]
    }

    /// Targets of the edges leaving `id`.
    pub fn get_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut edge_idx = self.first_child[id.index()];
        while edge_idx != u32::MAX {
            out.push(self.child_targets[edge_idx as usize]);
            edge_idx = self.next_child[edge_idx as usize];
        }
        out
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.count()).map(NodeId::new)
    }

    /// METRIC nodes in node-list order.
    pub fn metrics(&self) -> Vec<NodeId> {
        self.ids().filter(|&id| matches!(self.kind(id), NodeKind::Metric(_))).collect()
    }

    pub fn metric_attributes(&self, id: NodeId) -> Option<&MetricAttributes> {
        match self.kind(id) {
            NodeKind::Metric(attrs) => Some(attrs),
            _ => None,
        }
    }
}
