//! Converts validated graphs into trees and evaluates them month by month.
pub mod engine;
pub mod kernel;
pub mod ledger;
pub mod lookup;
pub mod result;
pub mod tree;

pub use engine::Engine;
pub use ledger::{ComputationError, Ledger, Slot};
pub use lookup::VariableLookup;
pub use result::{
    ForecastCalculationResult, MetricCalculationResult, MonthlyForecastValue, MonthlyNodeValue,
    NodeCalculationResult, ResultAssembler,
};
pub use tree::{BuildError, CalculationTree, CalculationTreeNode, TreeBuilder, TreeNode};
