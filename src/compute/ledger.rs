//! ledger.rs
//! Dense `node x month` table of evaluated values.

use crate::store::NodeId;
use chrono::NaiveDate;
use thiserror::Error;

/// Internal failures of a calculation run. None of these should be reachable
/// for a graph that passed validation and tree building.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputationError {
    #[error("Cycle detected: metric '{metric}' was read by node '{node}' for {month} before it was computed")]
    CycleDetected { node: String, metric: String, month: NaiveDate },
    #[error("Node '{node}' cannot be evaluated: {reason}")]
    InvalidNode { node: String, reason: String },
    #[error("Structural mismatch: {msg}")]
    Mismatch { msg: String },
}

/// One cell of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Slot {
    /// Not evaluated yet for this month.
    #[default]
    Pending,
    /// Evaluated; `None` means missing data.
    Ready(Option<f64>),
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    months: Vec<NaiveDate>,
    // Row-major: row = node, column = month.
    values: Vec<Slot>,
}

impl Ledger {
    pub fn new(node_count: usize, months: Vec<NaiveDate>) -> Self {
        let values = vec![Slot::Pending; node_count * months.len()];
        Self { months, values }
    }

    pub fn months(&self) -> &[NaiveDate] { &self.months }
    pub fn model_len(&self) -> usize { self.months.len() }

    #[inline(always)]
    fn offset(&self, node_id: NodeId, month_idx: usize) -> usize {
        node_id.index() * self.months.len() + month_idx
    }

    #[inline(always)]
    pub fn get(&self, node_id: NodeId, month_idx: usize) -> Slot {
        if month_idx >= self.months.len() {
            return Slot::Pending;
        }
        self.values.get(self.offset(node_id, month_idx)).copied().unwrap_or_default()
    }

    /// The evaluated value, flattening `Pending` into `None`.
    #[inline(always)]
    pub fn value(&self, node_id: NodeId, month_idx: usize) -> Option<f64> {
        match self.get(node_id, month_idx) {
            Slot::Ready(v) => v,
            Slot::Pending => None,
        }
    }

    #[inline(always)]
    pub fn insert(&mut self, node_id: NodeId, month_idx: usize, value: Option<f64>) {
        let idx = self.offset(node_id, month_idx);
        if month_idx < self.months.len() {
            if let Some(slot) = self.values.get_mut(idx) {
                *slot = Slot::Ready(value);
            }
        }
    }

    /// All monthly values of one node, in month order.
    pub fn row(&self, node_id: NodeId) -> Vec<Option<f64>> {
        (0..self.months.len()).map(|m| self.value(node_id, m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_until_inserted() {
        let months = vec![
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        ];
        let mut ledger = Ledger::new(2, months);
        let node = NodeId(1);

        assert_eq!(ledger.get(node, 0), Slot::Pending);
        ledger.insert(node, 0, Some(4.0));
        ledger.insert(node, 1, None);

        assert_eq!(ledger.get(node, 0), Slot::Ready(Some(4.0)));
        assert_eq!(ledger.get(node, 1), Slot::Ready(None));
        assert_eq!(ledger.value(NodeId(0), 0), None);
        assert_eq!(ledger.row(node), vec![Some(4.0), None]);
    }

    #[test]
    fn test_out_of_range_reads_are_pending() {
        let ledger = Ledger::new(1, vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()]);
        assert_eq!(ledger.get(NodeId(0), 5), Slot::Pending);
        assert_eq!(ledger.get(NodeId(3), 0), Slot::Pending);
    }
}
