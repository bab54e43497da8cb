use crate::analysis::topology;
use crate::store::{NodeId, NodeKind, NodeType, Registry};
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Operator node '{operator}' is missing input '{input}' listed in its inputOrder")]
    MissingInput { operator: String, input: String },
    #[error(
        "Metrics depend on each other in a cycle through seed or metric references: {}",
        metrics.join(", ")
    )]
    SeedCycle { metrics: Vec<String> },
    #[error("Cycle detected while building the tree of metric '{metric}' at node '{node}'")]
    Cycle { metric: String, node: String },
    #[error("Node '{0}' is not a metric")]
    NotAMetric(String),
}

/// One arena slot of a calculation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub node: NodeId,
    /// Arena indices of the inputs, in evaluation order.
    pub children: SmallVec<[usize; 4]>,
}

/// The evaluation tree of one METRIC.
///
/// Nodes are stored in post-order: every child precedes its parent and the
/// metric root is the last slot, so a single forward pass evaluates the tree.
/// A node shared by several branches gets a single slot that every parent
/// points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationTree {
    pub root_metric: NodeId,
    pub nodes: Vec<TreeNode>,
}

impl CalculationTree {
    pub fn root_index(&self) -> usize { self.nodes.len().saturating_sub(1) }

    /// Metrics this tree reads: SEED sources (previous month) and metric
    /// references (same month). May include the root itself for a self-seed.
    pub fn metric_dependencies(&self, registry: &Registry) -> Vec<NodeId> {
        let root = self.root_index();
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, tn)| match registry.kind(tn.node) {
                NodeKind::Seed(attrs) => registry.lookup(&attrs.source_metric_id),
                NodeKind::Metric(_) if i != root => Some(tn.node),
                _ => None,
            })
            .collect()
    }

    /// Nested view of the tree, for inspection and serialization. A shared
    /// slot is expanded under each of its parents.
    pub fn to_nested(&self, registry: &Registry) -> CalculationTreeNode {
        self.nested_at(self.root_index(), registry)
    }

    fn nested_at(&self, idx: usize, registry: &Registry) -> CalculationTreeNode {
        let tn = &self.nodes[idx];
        let input_order = match registry.kind(tn.node) {
            NodeKind::Operator(attrs) => Some(attrs.input_order.clone()),
            _ => None,
        };
        CalculationTreeNode {
            node_id: registry.key(tn.node).to_string(),
            node_type: registry.kind(tn.node).node_type(),
            children: tn.children.iter().map(|&c| self.nested_at(c, registry)).collect(),
            input_order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationTreeNode {
    pub node_id: String,
    pub node_type: NodeType,
    pub children: Vec<CalculationTreeNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_order: Option<Vec<String>>,
}

/// Converts a validated graph into one tree per METRIC.
pub struct TreeBuilder<'a> {
    registry: &'a Registry,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Builds every metric tree and returns them in evaluation order: a tree
    /// comes after every metric it seeds from or references.
    pub fn build_all(&self) -> Result<Vec<CalculationTree>, BuildError> {
        let metrics = self.registry.metrics();
        let mut trees = Vec::with_capacity(metrics.len());
        for &metric in &metrics {
            trees.push(self.build(metric)?);
        }

        let dependencies: Vec<(NodeId, NodeId)> = trees
            .iter()
            .flat_map(|tree| {
                tree.metric_dependencies(self.registry)
                    .into_iter()
                    .map(move |source| (source, tree.root_metric))
            })
            .collect();

        let order =
            topology::metric_order(&metrics, &dependencies).map_err(|cycle| BuildError::SeedCycle {
                metrics: cycle.iter().map(|&id| self.registry.key(id).to_string()).collect(),
            })?;

        let mut slots: Vec<Option<CalculationTree>> = trees.into_iter().map(Some).collect();
        Ok(order
            .iter()
            .filter_map(|id| metrics.iter().position(|m| m == id))
            .filter_map(|pos| slots[pos].take())
            .collect())
    }

    /// Builds the tree rooted at one METRIC node.
    pub fn build(&self, metric: NodeId) -> Result<CalculationTree, BuildError> {
        if !matches!(self.registry.kind(metric), NodeKind::Metric(_)) {
            return Err(BuildError::NotAMetric(self.registry.key(metric).to_string()));
        }
        let mut tree = CalculationTree { root_metric: metric, nodes: Vec::new() };
        let mut visiting = vec![false; self.registry.count()];
        let mut placed = vec![None; self.registry.count()];
        self.visit(metric, true, &mut tree, &mut visiting, &mut placed)?;
        Ok(tree)
    }

    fn visit(
        &self,
        node: NodeId,
        is_root: bool,
        tree: &mut CalculationTree,
        visiting: &mut [bool],
        placed: &mut [Option<usize>],
    ) -> Result<usize, BuildError> {
        if let Some(slot) = placed[node.index()] {
            return Ok(slot);
        }
        if visiting[node.index()] {
            return Err(BuildError::Cycle {
                metric: self.registry.key(tree.root_metric).to_string(),
                node: self.registry.key(node).to_string(),
            });
        }
        visiting[node.index()] = true;

        let inputs = self.inputs_of(node, is_root)?;
        let mut children = SmallVec::with_capacity(inputs.len());
        for input in inputs {
            children.push(self.visit(input, false, tree, visiting, placed)?);
        }

        visiting[node.index()] = false;
        tree.nodes.push(TreeNode { node, children });
        let slot = tree.nodes.len() - 1;
        placed[node.index()] = Some(slot);
        Ok(slot)
    }

    /// Ordered inputs of a node inside a tree.
    fn inputs_of(&self, node: NodeId, is_root: bool) -> Result<Vec<NodeId>, BuildError> {
        let parents = self.registry.get_parents(node);
        match self.registry.kind(node) {
            NodeKind::Operator(attrs) => attrs
                .input_order
                .iter()
                .map(|input| {
                    self.registry
                        .lookup(input)
                        .filter(|id| parents.contains(id))
                        .ok_or_else(|| BuildError::MissingInput {
                            operator: self.registry.key(node).to_string(),
                            input: input.clone(),
                        })
                })
                .collect(),
            NodeKind::Metric(_) if is_root => Ok(parents.to_vec()),
            // A metric inside another tree is read from the ledger, not re-expanded.
            NodeKind::Metric(_) => Ok(Vec::new()),
            NodeKind::Data(_) | NodeKind::Constant(_) | NodeKind::Seed(_) => Ok(Vec::new()),
        }
    }
}
