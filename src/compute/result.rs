//! Output contract of a calculation run, and its assembly from the ledger.

use crate::compute::ledger::Ledger;
use crate::compute::lookup::VariableLookup;
use crate::compute::tree::CalculationTree;
use crate::store::{NodeId, NodeType, Registry};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyForecastValue {
    pub date: NaiveDate,
    pub forecast: Option<f64>,
    pub budget: Option<f64>,
    pub historical: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyNodeValue {
    pub date: NaiveDate,
    pub calculated: Option<f64>,
    pub forecast: Option<f64>,
    pub budget: Option<f64>,
    pub historical: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCalculationResult {
    pub metric_node_id: String,
    pub label: String,
    pub values: Vec<MonthlyForecastValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCalculationResult {
    pub node_id: String,
    pub node_type: NodeType,
    /// The metric whose forecast/budget/historical columns accompany this node.
    pub metric_node_id: String,
    pub values: Vec<MonthlyNodeValue>,
}

/// One immutable calculation-run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastCalculationResult {
    pub forecast_id: String,
    pub calculated_at: DateTime<Utc>,
    pub metrics: Vec<MetricCalculationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_nodes: Option<Vec<NodeCalculationResult>>,
}

impl ForecastCalculationResult {
    pub fn metric(&self, metric_node_id: &str) -> Option<&MetricCalculationResult> {
        self.metrics.iter().find(|m| m.metric_node_id == metric_node_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&NodeCalculationResult> {
        self.all_nodes.as_ref()?.iter().find(|n| n.node_id == node_id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Turns an evaluated ledger into the output contract.
pub struct ResultAssembler<'a> {
    registry: &'a Registry,
    lookup: &'a VariableLookup,
    ledger: &'a Ledger,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(registry: &'a Registry, lookup: &'a VariableLookup, ledger: &'a Ledger) -> Self {
        Self { registry, lookup, ledger }
    }

    /// Metrics are reported in node-list order regardless of evaluation order.
    pub fn assemble(
        &self,
        forecast_id: &str,
        calculated_at: DateTime<Utc>,
        trees: &[CalculationTree],
        include_nodes: bool,
    ) -> ForecastCalculationResult {
        let mut ordered: Vec<&CalculationTree> = trees.iter().collect();
        ordered.sort_by_key(|t| t.root_metric);

        let metrics: Vec<MetricCalculationResult> =
            ordered.iter().map(|t| self.metric_result(t.root_metric)).collect();

        let all_nodes = include_nodes.then(|| {
            let mut seen = vec![false; self.registry.count()];
            let mut out = Vec::new();
            for (tree, metric) in ordered.iter().zip(&metrics) {
                for tn in &tree.nodes {
                    if std::mem::replace(&mut seen[tn.node.index()], true) {
                        continue;
                    }
                    // A metric read inside another tree still reports its own columns.
                    let owner = ordered
                        .iter()
                        .position(|t| t.root_metric == tn.node)
                        .map_or(metric, |pos| &metrics[pos]);
                    out.push(self.node_result(tn.node, owner));
                }
            }
            out
        });

        ForecastCalculationResult {
            forecast_id: forecast_id.to_string(),
            calculated_at,
            metrics,
            all_nodes,
        }
    }

    fn metric_result(&self, metric: NodeId) -> MetricCalculationResult {
        let attrs = self.registry.metric_attributes(metric);
        let series =
            |id: Option<&str>, date: NaiveDate| id.and_then(|id| self.lookup.value_at(id, date, 0));

        let values = self
            .ledger
            .months()
            .iter()
            .enumerate()
            .map(|(m, &date)| MonthlyForecastValue {
                date,
                forecast: self.ledger.value(metric, m),
                budget: series(attrs.and_then(|a| a.budget_variable_id.as_deref()), date),
                historical: series(attrs.and_then(|a| a.historical_variable_id.as_deref()), date),
            })
            .collect();

        MetricCalculationResult {
            metric_node_id: self.registry.key(metric).to_string(),
            label: self.registry.kind(metric).label(),
            values,
        }
    }

    fn node_result(&self, node: NodeId, metric: &MetricCalculationResult) -> NodeCalculationResult {
        let values = metric
            .values
            .iter()
            .zip(self.ledger.row(node))
            .map(|(mv, calculated)| MonthlyNodeValue {
                date: mv.date,
                calculated,
                forecast: mv.forecast,
                budget: mv.budget,
                historical: mv.historical,
            })
            .collect();

        NodeCalculationResult {
            node_id: self.registry.key(node).to_string(),
            node_type: self.registry.kind(node).node_type(),
            metric_node_id: metric.metric_node_id.clone(),
            values,
        }
    }
}
