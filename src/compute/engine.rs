//! A synchronous, single-threaded evaluator for metric trees.
use crate::compute::kernel;
use crate::compute::ledger::{ComputationError, Ledger, Slot};
use crate::compute::lookup::VariableLookup;
use crate::compute::tree::{CalculationTree, TreeNode};
use crate::config::{EngineConfig, MetricFallback, SeedBootstrap};
use crate::error::DataError;
use crate::store::{MetricAttributes, NodeId, NodeKind, Registry, SeedAttributes};
use chrono::NaiveDate;
use tracing::{debug, trace};

pub struct Engine<'a> {
    registry: &'a Registry,
    lookup: &'a VariableLookup,
    config: &'a EngineConfig,
}

impl<'a> Engine<'a> {
    pub fn new(
        registry: &'a Registry,
        lookup: &'a VariableLookup,
        config: &'a EngineConfig,
    ) -> Self {
        Self { registry, lookup, config }
    }

    /// Resolves every variable and metric reference before any month is
    /// evaluated, so a run never fails halfway through.
    pub fn check_references(&self, trees: &[CalculationTree]) -> Result<(), DataError> {
        for tree in trees {
            for tn in &tree.nodes {
                let key = self.registry.key(tn.node);
                match self.registry.kind(tn.node) {
                    NodeKind::Data(attrs) => self.require_variable(&attrs.variable_id, key)?,
                    NodeKind::Metric(attrs) => {
                        let referenced = [&attrs.budget_variable_id, &attrs.historical_variable_id];
                        for id in referenced.into_iter().flatten() {
                            self.require_variable(id, key)?;
                        }
                    }
                    NodeKind::Seed(attrs) => {
                        let source = self.registry.lookup(&attrs.source_metric_id);
                        if source.and_then(|id| self.registry.metric_attributes(id)).is_none() {
                            return Err(DataError::MetricNotFound {
                                metric_id: attrs.source_metric_id.clone(),
                                node_id: key.to_string(),
                            });
                        }
                    }
                    NodeKind::Constant(_) | NodeKind::Operator(_) => {}
                }
            }
        }
        Ok(())
    }

    fn require_variable(&self, variable_id: &str, node_id: &str) -> Result<(), DataError> {
        if self.lookup.contains(variable_id) {
            Ok(())
        } else {
            Err(DataError::VariableNotFound {
                variable_id: variable_id.to_string(),
                node_id: node_id.to_string(),
            })
        }
    }

    /// Evaluates every tree for every month.
    ///
    /// Months are the outer loop and trees are visited in the order given,
    /// which must be the tree builder's topological order. By the time a
    /// SEED reads month M-1 of its source, that month is complete for every
    /// metric.
    pub fn run(
        &self,
        trees: &[CalculationTree],
        months: Vec<NaiveDate>,
    ) -> Result<Ledger, ComputationError> {
        let mut ledger = Ledger::new(self.registry.count(), months);
        let mut scratch = Vec::new();

        for m in 0..ledger.model_len() {
            for tree in trees {
                self.evaluate_tree(tree, m, &mut ledger, &mut scratch)?;
            }
            trace!(month = %ledger.months()[m], "month evaluated");
        }

        debug!(trees = trees.len(), months = ledger.model_len(), "evaluation complete");
        Ok(ledger)
    }

    /// One forward pass over the post-ordered arena.
    fn evaluate_tree(
        &self,
        tree: &CalculationTree,
        m: usize,
        ledger: &mut Ledger,
        scratch: &mut Vec<Option<f64>>,
    ) -> Result<(), ComputationError> {
        scratch.clear();
        let root = tree.root_index();

        for (i, tn) in tree.nodes.iter().enumerate() {
            if tn.children.iter().any(|&c| c >= i) {
                return Err(ComputationError::Mismatch {
                    msg: format!(
                        "tree of metric '{}' is not in post-order at node '{}'",
                        self.registry.key(tree.root_metric),
                        self.registry.key(tn.node)
                    ),
                });
            }

            let value = match self.registry.kind(tn.node) {
                NodeKind::Data(attrs) => {
                    let month = ledger.months()[m];
                    self.lookup.value_at(&attrs.variable_id, month, attrs.offset_months)
                }
                NodeKind::Constant(attrs) => kernel::finite(attrs.value),
                NodeKind::Operator(attrs) => {
                    if tn.children.is_empty() {
                        return Err(ComputationError::InvalidNode {
                            node: self.registry.key(tn.node).to_string(),
                            reason: "operator has no inputs".to_string(),
                        });
                    }
                    kernel::fold(attrs.op, tn.children.iter().map(|&c| scratch[c]))
                }
                NodeKind::Seed(attrs) => self.seed_value(tn.node, attrs, m, ledger)?,
                NodeKind::Metric(attrs) if i == root => {
                    self.metric_forecast(attrs, tn, scratch, ledger.months()[m])
                }
                // Metric referenced from another tree: its value for this month is already final.
                NodeKind::Metric(_) => self.read_metric(tree.root_metric, tn.node, m, ledger)?,
            };

            scratch.push(value);
            ledger.insert(tn.node, m, value);
        }
        Ok(())
    }

    /// The source metric's forecast for the previous month.
    fn seed_value(
        &self,
        seed: NodeId,
        attrs: &SeedAttributes,
        m: usize,
        ledger: &Ledger,
    ) -> Result<Option<f64>, ComputationError> {
        let source = self
            .registry
            .lookup(&attrs.source_metric_id)
            .ok_or_else(|| ComputationError::InvalidNode {
                node: self.registry.key(seed).to_string(),
                reason: format!("unknown source metric '{}'", attrs.source_metric_id),
            })?;

        if m == 0 {
            return Ok(self.bootstrap(source, ledger.months()[0]));
        }
        self.read_metric(seed, source, m - 1, ledger)
    }

    fn bootstrap(&self, source: NodeId, first_month: NaiveDate) -> Option<f64> {
        match self.config.seed_bootstrap {
            SeedBootstrap::Null => None,
            SeedBootstrap::PriorHistorical => self
                .registry
                .metric_attributes(source)
                .and_then(|attrs| attrs.historical_variable_id.as_deref())
                .and_then(|id| self.lookup.value_at(id, first_month, -1)),
        }
    }

    fn read_metric(
        &self,
        reader: NodeId,
        metric: NodeId,
        m: usize,
        ledger: &Ledger,
    ) -> Result<Option<f64>, ComputationError> {
        match ledger.get(metric, m) {
            Slot::Ready(value) => Ok(value),
            Slot::Pending => Err(ComputationError::CycleDetected {
                node: self.registry.key(reader).to_string(),
                metric: self.registry.key(metric).to_string(),
                month: ledger.months().get(m).copied().unwrap_or_default(),
            }),
        }
    }

    fn metric_forecast(
        &self,
        attrs: &MetricAttributes,
        tn: &TreeNode,
        scratch: &[Option<f64>],
        month: NaiveDate,
    ) -> Option<f64> {
        match tn.children.first() {
            Some(&child) if attrs.use_calculated => scratch[child],
            _ => match self.config.metric_fallback {
                MetricFallback::Budget => {
                    self.variable_value(attrs.budget_variable_id.as_deref(), month)
                }
                MetricFallback::Historical => {
                    self.variable_value(attrs.historical_variable_id.as_deref(), month)
                }
                MetricFallback::Null => None,
            },
        }
    }

    pub(crate) fn variable_value(
        &self,
        variable_id: Option<&str>,
        month: NaiveDate,
    ) -> Option<f64> {
        variable_id.and_then(|id| self.lookup.value_at(id, month, 0))
    }
}
