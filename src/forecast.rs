//! The public entry point: validate, build trees, evaluate and assemble.

use crate::calendar;
use crate::compute::{
    CalculationTree, Engine, ForecastCalculationResult, ResultAssembler, TreeBuilder,
    VariableLookup,
};
use crate::config::EngineConfig;
use crate::display::format_trace;
use crate::error::ForecastError;
use crate::store::{Edge, Node, Registry, Variable};
use crate::validation::validate_graph;
use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Everything a single calculation run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastInput {
    pub forecast_id: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    pub forecast_start_date: NaiveDate,
    pub forecast_end_date: NaiveDate,
    /// Overrides `EngineConfig::include_node_results` for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_node_results: Option<bool>,
}

impl ForecastInput {
    /// Parses a request body in the camelCase JSON contract.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// A graph that passed validation, with its trees in evaluation order.
struct Prepared {
    registry: Registry,
    trees: Vec<CalculationTree>,
    lookup: VariableLookup,
    months: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ForecastCalculator {
    config: EngineConfig,
}

impl ForecastCalculator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[tracing::instrument(skip_all, fields(forecast_id = %input.forecast_id))]
    pub fn calculate(
        &self,
        input: &ForecastInput,
    ) -> Result<ForecastCalculationResult, ForecastError> {
        self.calculate_at(input, Utc::now())
    }

    /// Same as `calculate`, stamping the result with `calculated_at`.
    /// Two calls with the same input and timestamp return equal results.
    pub fn calculate_at(
        &self,
        input: &ForecastInput,
        calculated_at: DateTime<Utc>,
    ) -> Result<ForecastCalculationResult, ForecastError> {
        let prepared = self.prepare(input)?;
        let engine = Engine::new(&prepared.registry, &prepared.lookup, &self.config);

        debug!(months = prepared.months.len(), "evaluating trees");
        let ledger = engine.run(&prepared.trees, prepared.months)?;

        let include_nodes = input.include_node_results.unwrap_or(self.config.include_node_results);
        let result = ResultAssembler::new(&prepared.registry, &prepared.lookup, &ledger).assemble(
            &input.forecast_id,
            calculated_at,
            &prepared.trees,
            include_nodes,
        );

        info!(
            metrics = result.metrics.len(),
            months = ledger.model_len(),
            "forecast calculation complete"
        );
        Ok(result)
    }

    /// Calculates independent forecasts in parallel. Results keep input order.
    pub fn calculate_batch(
        &self,
        inputs: &[ForecastInput],
    ) -> Vec<Result<ForecastCalculationResult, ForecastError>> {
        let calculated_at = Utc::now();
        inputs.par_iter().map(|input| self.calculate_at(input, calculated_at)).collect()
    }

    /// Renders the audit trace of one metric for one month of the range.
    /// Returns `Ok(None)` when `metric_id` is not a metric of the graph or
    /// `month` falls outside the forecast range.
    pub fn trace(
        &self,
        input: &ForecastInput,
        metric_id: &str,
        month: NaiveDate,
    ) -> Result<Option<String>, ForecastError> {
        let prepared = self.prepare(input)?;
        let Some(tree) = prepared
            .registry
            .lookup(metric_id)
            .and_then(|id| prepared.trees.iter().find(|t| t.root_metric == id))
        else {
            return Ok(None);
        };

        let month = calendar::first_of_month(month);
        let Some(month_idx) = prepared.months.iter().position(|&m| m == month) else {
            return Ok(None);
        };

        let engine = Engine::new(&prepared.registry, &prepared.lookup, &self.config);
        let ledger = engine.run(&prepared.trees, prepared.months.clone())?;
        Ok(Some(format_trace(&prepared.registry, &ledger, tree, month_idx)))
    }

    fn prepare(&self, input: &ForecastInput) -> Result<Prepared, ForecastError> {
        let start = calendar::first_of_month(input.forecast_start_date);
        let end = calendar::first_of_month(input.forecast_end_date);
        if start > end {
            return Err(ForecastError::InvalidRange { start, end });
        }

        debug!(nodes = input.nodes.len(), edges = input.edges.len(), "validating graph");
        let validation = validate_graph(&input.nodes, &input.edges);
        for warning in &validation.warnings {
            warn!(forecast_id = %input.forecast_id, "{}", warning);
        }
        if !validation.is_valid {
            return Err(ForecastError::Validation { errors: validation.errors });
        }

        let registry = Registry::from_graph(&input.nodes, &input.edges);
        let trees = TreeBuilder::new(&registry).build_all()?;
        debug!(trees = trees.len(), "built calculation trees");

        let lookup = VariableLookup::new(&input.variables);
        Engine::new(&registry, &lookup, &self.config).check_references(&trees)?;

        Ok(Prepared { registry, trees, lookup, months: calendar::month_range(start, end) })
    }
}

/// Calculates a forecast with the default configuration.
pub fn calculate_forecast(
    input: &ForecastInput,
) -> Result<ForecastCalculationResult, ForecastError> {
    ForecastCalculator::default().calculate(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::store::{Operation, VariableType};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn revenue_input() -> ForecastInput {
        ForecastInput {
            forecast_id: "f1".into(),
            nodes: vec![
                Node::data("units", "Units", "v_units", 0),
                Node::constant("price", "Price", 10.0),
                Node::operator("mul", Operation::Multiply, &["units", "price"]),
                Node::metric("rev", "Revenue", None, None, true),
            ],
            edges: vec![
                Edge::new("e1", "units", "mul"),
                Edge::new("e2", "price", "mul"),
                Edge::new("e3", "mul", "rev"),
            ],
            variables: vec![Variable::new("v_units", "Units", VariableType::Input)
                .with_point(ymd(2024, 1, 1), Some(5.0))
                .with_point(ymd(2024, 2, 1), Some(7.0))],
            forecast_start_date: ymd(2024, 1, 15),
            forecast_end_date: ymd(2024, 2, 3),
            include_node_results: None,
        }
    }

    #[test]
    fn test_calculate_normalizes_range() {
        let result = ForecastCalculator::default().calculate(&revenue_input()).unwrap();
        let rev = result.metric("rev").unwrap();
        let dates: Vec<NaiveDate> = rev.values.iter().map(|v| v.date).collect();
        assert_eq!(dates, vec![ymd(2024, 1, 1), ymd(2024, 2, 1)]);
        assert_eq!(rev.values[0].forecast, Some(50.0));
        assert_eq!(rev.values[1].forecast, Some(70.0));
        assert!(result.all_nodes.is_none());
    }

    #[test]
    fn test_input_from_json() {
        let raw = r#"{
            "forecastId": "f9",
            "nodes": [{ "id": "m", "kind": "METRIC", "attributes": { "label": "Empty" } }],
            "edges": [],
            "forecastStartDate": "2024-03-01",
            "forecastEndDate": "2024-04-01",
            "includeNodeResults": true
        }"#;
        let input = ForecastInput::from_json(raw).unwrap();
        assert!(input.variables.is_empty());
        assert_eq!(input.include_node_results, Some(true));
        assert!(ForecastInput::from_json("{}").is_err());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let mut input = revenue_input();
        input.forecast_start_date = ymd(2024, 6, 1);
        let err = ForecastCalculator::default().calculate(&input).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidRange { .. }));
        assert_eq!(err.category(), ErrorCategory::BadRequest);
    }

    #[test]
    fn test_request_overrides_extended_mode() {
        let mut input = revenue_input();
        input.include_node_results = Some(true);
        let result = ForecastCalculator::default().calculate(&input).unwrap();
        let mul = result.node("mul").unwrap();
        assert_eq!(mul.metric_node_id, "rev");
        assert_eq!(mul.values[1].calculated, Some(70.0));
    }

    #[test]
    fn test_trace_for_metric() {
        let calc = ForecastCalculator::default();
        let out = calc.trace(&revenue_input(), "rev", ymd(2024, 2, 20)).unwrap().unwrap();
        assert!(out.contains("AUDIT TRACE for metric 'Revenue' @ 2024-02"), "{}", out);
        assert!(out.contains("mul[70.000] = units[7.000] * price[10.000]"), "{}", out);

        assert!(calc.trace(&revenue_input(), "mul", ymd(2024, 2, 1)).unwrap().is_none());
        assert!(calc.trace(&revenue_input(), "rev", ymd(2025, 1, 1)).unwrap().is_none());
    }
}
