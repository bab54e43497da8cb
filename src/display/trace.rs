use crate::compute::ledger::{Ledger, Slot};
use crate::compute::tree::CalculationTree;
use crate::store::{NodeId, NodeKind, Registry};
use std::collections::HashMap;
use std::fmt::Write;

/// Renders how one metric's value for one month was reached, node by node.
pub fn format_trace(
    registry: &Registry,
    ledger: &Ledger,
    tree: &CalculationTree,
    month_idx: usize,
) -> String {
    let mut tracer = Tracer {
        registry,
        ledger,
        tree,
        month_idx,
        visited_at_level: HashMap::new(),
        output: String::new(),
    };

    match ledger.months().get(month_idx) {
        Some(month) => {
            let name = registry.kind(tree.root_metric).label();
            let header = month.format("%Y-%m");
            let _ = writeln!(tracer.output, "AUDIT TRACE for metric '{}' @ {}:", name, header);
            let _ = writeln!(tracer.output, "--------------------------------------------------");
            tracer.trace_node(tree.root_index(), 1, "");
        }
        None => {
            let _ = writeln!(
                tracer.output,
                "Error: month index {} is outside the forecast range",
                month_idx
            );
        }
    }
    tracer.output
}

struct Tracer<'a> {
    registry: &'a Registry,
    ledger: &'a Ledger,
    tree: &'a CalculationTree,
    month_idx: usize,
    visited_at_level: HashMap<NodeId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, slot: usize, level: usize, prefix: &str) {
        let tn = &self.tree.nodes[slot];
        if let Some(&first_seen) = self.visited_at_level.get(&tn.node) {
            let key = self.registry.key(tn.node);
            let _ = writeln!(self.output, "{}{} -> (Ref to L{})", prefix, key, first_seen);
            return;
        }
        self.visited_at_level.insert(tn.node, level);

        let line_header =
            format!("[L{}] {}{}", level, self.registry.key(tn.node), self.format_value(tn.node));

        match self.registry.kind(tn.node) {
            NodeKind::Data(attrs) => {
                let shift = match attrs.offset_months {
                    0 => String::new(),
                    n => format!(", offset {:+}", n),
                };
                let _ = writeln!(
                    self.output,
                    "{}{} -> Data({}{})",
                    prefix, line_header, attrs.variable_id, shift
                );
            }
            NodeKind::Constant(attrs) => {
                let _ =
                    writeln!(self.output, "{}{} -> Const({:.3})", prefix, line_header, attrs.value);
            }
            NodeKind::Seed(attrs) => {
                let source = &attrs.source_metric_id;
                let _ = writeln!(self.output, "{}{} -> {}.prev()", prefix, line_header, source);
            }
            NodeKind::Operator(attrs) => {
                let operands: Vec<String> =
                    tn.children.iter().map(|&c| self.format_child_ref(c)).collect();
                let formula = operands.join(&format!(" {} ", attrs.op.symbol()));
                let _ = writeln!(self.output, "{}{} = {}", prefix, line_header, formula);
                self.recurse_children(prefix, slot, level);
            }
            NodeKind::Metric(attrs) => {
                if slot != self.tree.root_index() {
                    let _ = writeln!(
                        self.output,
                        "{}{} -> Metric({})",
                        prefix, line_header, attrs.label
                    );
                } else if attrs.use_calculated && !tn.children.is_empty() {
                    let _ = writeln!(self.output, "{}{} = {}", prefix, line_header, attrs.label);
                    self.recurse_children(prefix, slot, level);
                } else {
                    let _ = writeln!(
                        self.output,
                        "{}{} = {} [FALLBACK]",
                        prefix, line_header, attrs.label
                    );
                }
            }
        }
    }

    fn recurse_children(&mut self, prefix: &str, slot: usize, level: usize) {
        let stem = self.build_child_stem(prefix);
        let children = self.tree.nodes[slot].children.clone();
        for (i, &child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`--" } else { "|--" };
            let full_prefix = format!("{}{}", stem, connector);
            self.trace_node(child, level + 1, &full_prefix);
        }
    }

    fn format_child_ref(&self, slot: usize) -> String {
        let node = self.tree.nodes[slot].node;
        format!("{}{}", self.registry.key(node), self.format_value(node))
    }

    fn format_value(&self, id: NodeId) -> String {
        match self.ledger.get(id, self.month_idx) {
            Slot::Ready(Some(v)) => format!("[{:.3}]", v),
            Slot::Ready(None) => "[null]".to_string(),
            Slot::Pending => "[?]".to_string(),
        }
    }

    fn build_child_stem(&self, current_prefix: &str) -> String {
        current_prefix.replace("`--", "   ").replace("|--", "|  ")
    }
}
