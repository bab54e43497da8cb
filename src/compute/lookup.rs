//! lookup.rs
//! Month-indexed access to variable time series.

use crate::calendar;
use crate::store::Variable;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Read-only index over the variables of one calculation run.
///
/// Intake rules: dates are normalized to the first of the month, a later
/// entry for the same month replaces an earlier one, and non-finite values
/// are stored as missing.
#[derive(Debug, Clone, Default)]
pub struct VariableLookup {
    series: HashMap<String, BTreeMap<NaiveDate, Option<f64>>>,
}

impl VariableLookup {
    pub fn new(variables: &[Variable]) -> Self {
        let mut series = HashMap::with_capacity(variables.len());
        for var in variables {
            let mut points = BTreeMap::new();
            for p in &var.time_series {
                points.insert(calendar::first_of_month(p.date), p.value.filter(|v| v.is_finite()));
            }
            series.insert(var.id.clone(), points);
        }
        Self { series }
    }

    pub fn contains(&self, variable_id: &str) -> bool {
        self.series.contains_key(variable_id)
    }

    /// Value recorded for `target_month` shifted by `offset_months`.
    ///
    /// `None` covers an unknown variable, a month with no entry and an entry
    /// whose value is null. Never fails.
    pub fn value_at(
        &self,
        variable_id: &str,
        target_month: NaiveDate,
        offset_months: i32,
    ) -> Option<f64> {
        let month = calendar::shift_months(target_month, offset_months)?;
        self.series.get(variable_id)?.get(&month).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VariableType;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sales() -> Variable {
        Variable::new("v1", "Sales", VariableType::Actual)
            .with_point(d(2024, 1, 15), Some(100.0))
            .with_point(d(2024, 2, 1), Some(110.0))
            .with_point(d(2024, 3, 1), None)
            .with_point(d(2024, 4, 1), Some(f64::NAN))
    }

    #[rstest]
    #[case(d(2024, 1, 1), 0, Some(100.0))]
    #[case(d(2024, 1, 31), 0, Some(100.0))]
    #[case(d(2024, 3, 9), -1, Some(110.0))]
    #[case(d(2023, 12, 1), 1, Some(100.0))]
    #[case(d(2024, 3, 1), 0, None)]
    #[case(d(2024, 4, 1), 0, None)]
    #[case(d(2024, 5, 1), 0, None)]
    fn test_value_at(#[case] month: NaiveDate, #[case] offset: i32, #[case] expected: Option<f64>) {
        let lookup = VariableLookup::new(&[sales()]);
        assert_eq!(lookup.value_at("v1", month, offset), expected);
    }

    #[test]
    fn test_unknown_variable_is_none() {
        let lookup = VariableLookup::new(&[sales()]);
        assert!(!lookup.contains("v2"));
        assert_eq!(lookup.value_at("v2", d(2024, 1, 1), 0), None);
    }

    #[test]
    fn test_later_entry_wins_within_month() {
        let var = Variable::new("v1", "Sales", VariableType::Input)
            .with_point(d(2024, 1, 1), Some(1.0))
            .with_point(d(2024, 1, 20), Some(2.0));
        let lookup = VariableLookup::new(&[var]);
        assert_eq!(lookup.value_at("v1", d(2024, 1, 1), 0), Some(2.0));
    }
}
