//! Plain data contract shared with the persistence and web layers.
//! Field names serialize in camelCase to match the JSON bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense arena index of a node inside a `Registry`. Not part of the JSON contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    /// Indices must fit in a `u32`; arenas are built through `try_new`.
    pub fn new(idx: usize) -> Self {
        debug_assert!(u32::try_from(idx).is_ok(), "node index {} overflows NodeId", idx);
        Self(idx as u32)
    }

    pub fn try_new(idx: usize) -> Option<Self> {
        u32::try_from(idx).ok().map(Self)
    }
}

// --- Variables ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableType {
    Actual,
    Budget,
    Input,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// An organization-scoped monthly series. Read-only during a calculation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub variable_type: VariableType,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub time_series: Vec<TimeSeriesPoint>,
}

impl Variable {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        variable_type: VariableType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            variable_type,
            organization_id: String::new(),
            time_series: Vec::new(),
        }
    }

    pub fn with_point(mut self, date: NaiveDate, value: Option<f64>) -> Self {
        self.time_series.push(TimeSeriesPoint { date, value });
        self
    }
}

// --- Nodes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "^")]
    Power,
}

impl Operation {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Power => "^",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAttributes {
    pub name: String,
    pub variable_id: String,
    #[serde(default)]
    pub offset_months: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantAttributes {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorAttributes {
    pub op: Operation,
    /// Evaluation order of the inputs. Must match the incoming edge sources exactly.
    #[serde(default)]
    pub input_order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAttributes {
    pub label: String,
    #[serde(default)]
    pub budget_variable_id: Option<String>,
    #[serde(default)]
    pub historical_variable_id: Option<String>,
    #[serde(default = "default_use_calculated")]
    pub use_calculated: bool,
}

fn default_use_calculated() -> bool { true }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAttributes {
    pub source_metric_id: String,
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "attributes", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Data(DataAttributes),
    Constant(ConstantAttributes),
    Operator(OperatorAttributes),
    Metric(MetricAttributes),
    Seed(SeedAttributes),
}

/// Discriminant of `NodeKind`, used in results and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Data,
    Constant,
    Operator,
    Metric,
    Seed,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeType::Data => "DATA",
            NodeType::Constant => "CONSTANT",
            NodeType::Operator => "OPERATOR",
            NodeType::Metric => "METRIC",
            NodeType::Seed => "SEED",
        };
        f.write_str(s)
    }
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Data(_) => NodeType::Data,
            NodeKind::Constant(_) => NodeType::Constant,
            NodeKind::Operator(_) => NodeType::Operator,
            NodeKind::Metric(_) => NodeType::Metric,
            NodeKind::Seed(_) => NodeType::Seed,
        }
    }

    /// Leaves take no incoming edges.
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Data(_) | NodeKind::Constant(_) | NodeKind::Seed(_))
    }

    /// A short human-readable name.
    pub fn label(&self) -> String {
        match self {
            NodeKind::Data(a) => a.name.clone(),
            NodeKind::Constant(a) => a.name.clone(),
            NodeKind::Operator(a) => a.op.symbol().to_string(),
            NodeKind::Metric(a) => a.label.clone(),
            NodeKind::Seed(a) => format!("seed({})", a.source_metric_id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self { id: id.into(), kind, position: None }
    }

    pub fn data(
        id: impl Into<String>,
        name: impl Into<String>,
        variable_id: impl Into<String>,
        offset_months: i32,
    ) -> Self {
        Self::new(id, NodeKind::Data(DataAttributes {
            name: name.into(),
            variable_id: variable_id.into(),
            offset_months,
        }))
    }

    pub fn constant(id: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self::new(id, NodeKind::Constant(ConstantAttributes { name: name.into(), value }))
    }

    pub fn operator(id: impl Into<String>, op: Operation, input_order: &[&str]) -> Self {
        Self::new(id, NodeKind::Operator(OperatorAttributes {
            op,
            input_order: input_order.iter().map(|s| s.to_string()).collect(),
        }))
    }

    pub fn metric(
        id: impl Into<String>,
        label: impl Into<String>,
        budget_variable_id: Option<&str>,
        historical_variable_id: Option<&str>,
        use_calculated: bool,
    ) -> Self {
        Self::new(id, NodeKind::Metric(MetricAttributes {
            label: label.into(),
            budget_variable_id: budget_variable_id.map(str::to_string),
            historical_variable_id: historical_variable_id.map(str::to_string),
            use_calculated,
        }))
    }

    pub fn seed(id: impl Into<String>, source_metric_id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Seed(SeedAttributes { source_metric_id: source_metric_id.into() }))
    }

    pub fn node_type(&self) -> NodeType { self.kind.node_type() }
}

// --- Edges ---

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source_node_id: String,
    pub target_node_id: String,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), source_node_id: source.into(), target_node_id: target.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_id_rejects_out_of_range_index() {
        assert_eq!(NodeId::try_new(5), Some(NodeId(5)));
        assert_eq!(NodeId::try_new(u32::MAX as usize), Some(NodeId(u32::MAX)));
        assert_eq!(NodeId::try_new(u32::MAX as usize + 1), None);
    }

    #[test]
    fn test_node_json_shape() {
        let raw = json!({
            "id": "op1",
            "kind": "OPERATOR",
            "attributes": { "op": "/", "inputOrder": ["a", "b"] },
            "position": { "x": 10.0, "y": 20.0 }
        });
        let node: Node = serde_json::from_value(raw).unwrap();
        assert_eq!(node.node_type(), NodeType::Operator);
        match &node.kind {
            NodeKind::Operator(attrs) => {
                assert_eq!(attrs.op, Operation::Divide);
                assert_eq!(attrs.input_order, vec!["a", "b"]);
            }
            other => panic!("unexpected kind {:?}", other),
        }

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["kind"], "OPERATOR");
        assert_eq!(back["attributes"]["op"], "/");
    }

    #[test]
    fn test_metric_defaults() {
        let raw = json!({ "id": "m1", "kind": "METRIC", "attributes": { "label": "Revenue" } });
        let node: Node = serde_json::from_value(raw).unwrap();
        match node.kind {
            NodeKind::Metric(attrs) => {
                assert!(attrs.use_calculated);
                assert!(attrs.budget_variable_id.is_none());
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_variable_json_shape() {
        let raw = json!({
            "id": "v1", "name": "Sales", "type": "ACTUAL", "organizationId": "org",
            "timeSeries": [
                { "date": "2024-01-01", "value": 5.0 },
                { "date": "2024-02-01", "value": null }
            ]
        });
        let var: Variable = serde_json::from_value(raw).unwrap();
        assert_eq!(var.variable_type, VariableType::Actual);
        assert_eq!(var.time_series[1].value, None);
    }
}
