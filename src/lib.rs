// Crate Facade: the main entry point for host services.
// Re-exports the calculator, its input/output contracts and the
// standalone graph validator.

// --- Module Declarations ---
pub mod analysis;
pub mod calendar;
pub mod compute;
pub mod config;
pub mod display;
pub mod error;
pub mod forecast;
pub mod store;
pub mod validation;

// --- Public Surface ---
pub use compute::{
    ForecastCalculationResult, MetricCalculationResult, MonthlyForecastValue, MonthlyNodeValue,
    NodeCalculationResult,
};
pub use config::{ConfigError, EngineConfig, MetricFallback, SeedBootstrap};
pub use error::{DataError, ErrorCategory, ForecastError};
pub use forecast::{calculate_forecast, ForecastCalculator, ForecastInput};
pub use store::{Edge, Node, NodeKind, NodeType, Operation, TimeSeriesPoint, Variable, VariableType};
pub use validation::{validate_graph, GraphValidationResult};
