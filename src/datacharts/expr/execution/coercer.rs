/*!
# Result Coercion

Normalizes raw evaluation values into the portable [`ResultValue`] shapes:

- a zero-dimensional numeric result becomes `Scalar`
- a one-dimensional result whose length equals the source row count is a
  row-aligned `Vector` the caller may treat as a new column
- a one-dimensional result of any other length is a plain `Vector`
- composite values become a `Table` of flattened records, and anything that
  cannot be represented numerically is stringified into a degenerate table
  cell

The policy favors never failing a successful computation over strict
typing. The interpreter's value model is scalar-or-vector, so the table
shapes exist for the callers downstream - the chart layer builds on them -
and for the degenerate stringification path.
*/

use super::types::{ResultValue, Value};
use std::collections::BTreeMap;

/// Coerce a raw evaluation value into a portable result shape.
///
/// `expected_row_count` is the row count of the bound data source; it does
/// not change the produced value, but callers use it to decide whether a
/// vector result is row-aligned (see [`is_row_aligned`]).
pub fn coerce(raw: Value, expected_row_count: usize) -> ResultValue {
    match raw {
        Value::Scalar(v) => ResultValue::Scalar(v),
        Value::Vector(values) => {
            if values.len() != expected_row_count {
                log::debug!(
                    "vector result length {} differs from source row count {}",
                    values.len(),
                    expected_row_count
                );
            }
            ResultValue::Vector(values)
        }
    }
}

/// True when the result is a vector aligned with the source rows.
pub fn is_row_aligned(result: &ResultValue, expected_row_count: usize) -> bool {
    matches!(result, ResultValue::Vector(values) if values.len() == expected_row_count)
}

/// Wrap a non-numeric value into the degenerate single-cell table shape.
pub fn degenerate_table(text: impl Into<String>) -> ResultValue {
    let mut record = BTreeMap::new();
    record.insert("value".to_string(), text.into());
    ResultValue::Table(vec![record])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_stays_scalar() {
        assert_eq!(coerce(Value::Scalar(3.0), 10), ResultValue::Scalar(3.0));
    }

    #[test]
    fn test_row_aligned_vector() {
        let result = coerce(Value::Vector(vec![1.0, 2.0, 3.0]), 3);
        assert_eq!(result, ResultValue::Vector(vec![1.0, 2.0, 3.0]));
        assert!(is_row_aligned(&result, 3));
    }

    #[test]
    fn test_other_length_is_plain_vector() {
        let result = coerce(Value::Vector(vec![1.0, 2.0]), 5);
        assert_eq!(result, ResultValue::Vector(vec![1.0, 2.0]));
        assert!(!is_row_aligned(&result, 5));
    }

    #[test]
    fn test_degenerate_table() {
        match degenerate_table("not numeric") {
            ResultValue::Table(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].get("value").unwrap(), "not numeric");
            }
            other => panic!("expected table, got {:?}", other),
        }
    }
}
