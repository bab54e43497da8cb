use crate::store::Operation;

/// Drops non-finite values; the engine never carries `NaN` or infinities.
#[inline(always)]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Applies one binary step. Division by zero and non-finite results are `None`.
#[inline(always)]
pub fn execute_instruction(op: Operation, lhs: f64, rhs: f64) -> Option<f64> {
    let out = match op {
        Operation::Add => lhs + rhs,
        Operation::Subtract => lhs - rhs,
        Operation::Multiply => lhs * rhs,
        Operation::Divide => {
            if rhs == 0.0 {
                return None;
            }
            lhs / rhs
        }
        Operation::Power => lhs.powf(rhs),
    };
    finite(out)
}

/// Folds ordered input values left to right: `((a op b) op c) ...`.
///
/// Any missing input makes the whole result missing for that month, and so
/// does an operator with no inputs at all.
pub fn fold(op: Operation, inputs: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let mut iter = inputs.into_iter();
    let mut acc = finite(iter.next()??)?;
    for value in iter {
        acc = execute_instruction(op, acc, finite(value?)?)?;
    }
    Some(acc)
}
