/*!
# Core evaluation data types

- [`Value`] - the runtime value model of the interpreter: a scalar or a
  column vector of `f64`, with broadcasting arithmetic
- [`ResultValue`] - the portable result shape returned to callers
- [`ExecutionResult`] - evaluation outcome with timing and status

All numeric data is `f64`. Binary operations broadcast a scalar against a
vector element-wise; two vectors must have equal lengths. Division by zero
and domain errors follow IEEE semantics (infinities and NaN propagate as
values, not errors), matching how numeric arrays behave in the data layer
that feeds this engine.
*/

use crate::datacharts::expr::ast::BinaryOperator;
use crate::datacharts::expr::error::ExprError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// A runtime value during expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Zero-dimensional numeric value
    Scalar(f64),
    /// One-dimensional numeric column
    Vector(Vec<f64>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(v) => write!(f, "{}", v),
            Value::Vector(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Value {
    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Vector(_) => "vector",
        }
    }

    /// View the value as a slice of floats; a scalar becomes a
    /// single-element slice. Used by reduction and filter functions that
    /// accept either shape.
    pub fn as_slice(&self) -> Cow<'_, [f64]> {
        match self {
            Value::Scalar(v) => Cow::Owned(vec![*v]),
            Value::Vector(values) => Cow::Borrowed(values.as_slice()),
        }
    }

    /// The single float of a scalar value, or an error naming `context`.
    pub fn expect_scalar(&self, context: &str) -> Result<f64, ExprError> {
        match self {
            Value::Scalar(v) => Ok(*v),
            other => Err(ExprError::runtime(format!(
                "{} expects a scalar argument, got a {}",
                context,
                other.type_name()
            ))),
        }
    }

    /// Apply a unary float function element-wise, preserving shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(v) => Value::Scalar(f(*v)),
            Value::Vector(values) => Value::Vector(values.iter().map(|&v| f(v)).collect()),
        }
    }

    /// Apply a binary float function with scalar↔vector broadcasting.
    ///
    /// Scalar-scalar yields a scalar; a scalar broadcasts across a vector;
    /// two vectors must have equal lengths or the operation fails.
    fn broadcast(
        &self,
        other: &Value,
        op: BinaryOperator,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Value, ExprError> {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(f(*a, *b))),
            (Value::Scalar(a), Value::Vector(b)) => {
                Ok(Value::Vector(b.iter().map(|&v| f(*a, v)).collect()))
            }
            (Value::Vector(a), Value::Scalar(b)) => {
                Ok(Value::Vector(a.iter().map(|&v| f(v, *b)).collect()))
            }
            (Value::Vector(a), Value::Vector(b)) => {
                if a.len() != b.len() {
                    return Err(ExprError::runtime(format!(
                        "vector length mismatch for '{}': {} vs {}",
                        op.symbol(),
                        a.len(),
                        b.len()
                    )));
                }
                Ok(Value::Vector(
                    a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect(),
                ))
            }
        }
    }

    /// Evaluate `self op other` with broadcasting.
    pub fn binary_op(&self, op: BinaryOperator, other: &Value) -> Result<Value, ExprError> {
        match op {
            BinaryOperator::Add => self.broadcast(other, op, |a, b| a + b),
            BinaryOperator::Subtract => self.broadcast(other, op, |a, b| a - b),
            BinaryOperator::Multiply => self.broadcast(other, op, |a, b| a * b),
            BinaryOperator::Divide => self.broadcast(other, op, |a, b| a / b),
            BinaryOperator::Modulo => self.broadcast(other, op, |a, b| a % b),
            BinaryOperator::Power => self.broadcast(other, op, |a, b| a.powf(b)),
        }
    }

    /// Arithmetic negation, preserving shape.
    pub fn negate(&self) -> Value {
        self.map(|v| -v)
    }
}

/// Portable result shapes returned to the caller after coercion.
///
/// A `Vector` whose length equals the source row count is row-aligned and
/// may be reinterpreted by the caller as a new column; other lengths are
/// plain sequences. `Table` carries composite results as flattened records
/// of stringified cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ResultValue {
    Scalar(f64),
    Vector(Vec<f64>),
    Table(Vec<BTreeMap<String, String>>),
}

/// Evaluation status of an [`ExecutionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Error,
}

/// Outcome of one evaluation cycle.
///
/// Always returned by value - the engine retains nothing. A failed
/// evaluation carries `status: Error` and a human-readable message; no
/// error ever propagates past the evaluator boundary as a panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The coerced result; `None` on error.
    pub value: Option<ResultValue>,
    /// Wall-clock evaluation time in seconds.
    pub elapsed_seconds: f64,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
}

impl ExecutionResult {
    /// Create a successful result.
    pub fn success(value: ResultValue, elapsed_seconds: f64) -> Self {
        ExecutionResult {
            value: Some(value),
            elapsed_seconds,
            status: ExecutionStatus::Success,
            error_message: None,
        }
    }

    /// Create a failed result from any engine error.
    pub fn failure(error: &ExprError, elapsed_seconds: f64) -> Self {
        ExecutionResult {
            value: None,
            elapsed_seconds,
            status: ExecutionStatus::Error,
            error_message: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_vector_broadcast() {
        let left = Value::Scalar(10.0);
        let right = Value::Vector(vec![1.0, 2.0, 3.0]);
        let result = left.binary_op(BinaryOperator::Add, &right).unwrap();
        assert_eq!(result, Value::Vector(vec![11.0, 12.0, 13.0]));
    }

    #[test]
    fn test_vector_vector_elementwise() {
        let left = Value::Vector(vec![1.0, 2.0, 3.0]);
        let right = Value::Vector(vec![2.0, 4.0, 6.0]);
        let result = left.binary_op(BinaryOperator::Add, &right).unwrap();
        assert_eq!(result, Value::Vector(vec![3.0, 6.0, 9.0]));
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let left = Value::Vector(vec![1.0, 2.0]);
        let right = Value::Vector(vec![1.0, 2.0, 3.0]);
        let err = left.binary_op(BinaryOperator::Multiply, &right).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        let result = Value::Scalar(1.0)
            .binary_op(BinaryOperator::Divide, &Value::Scalar(0.0))
            .unwrap();
        assert_eq!(result, Value::Scalar(f64::INFINITY));
    }

    #[test]
    fn test_power() {
        let result = Value::Vector(vec![2.0, 3.0])
            .binary_op(BinaryOperator::Power, &Value::Scalar(2.0))
            .unwrap();
        assert_eq!(result, Value::Vector(vec![4.0, 9.0]));
    }

    #[test]
    fn test_as_slice_promotes_scalar() {
        assert_eq!(Value::Scalar(5.0).as_slice().as_ref(), &[5.0]);
    }
}
