//! Statistical reductions over a data vector.
//!
//! Every entry reduces its input to a scalar. A scalar argument is treated
//! as a one-element vector, the way numeric-array reductions accept either
//! shape. `std` and `var` are population forms;
//! `quantile` uses linear interpolation between order statistics.

use super::metadata::{FunctionCategory, FunctionDef};
use crate::datacharts::expr::error::ExprError;
use crate::datacharts::expr::execution::types::Value;

fn data_arg<'a>(args: &'a [Value], name: &str, expected: usize) -> Result<&'a Value, ExprError> {
    if args.len() != expected {
        return Err(ExprError::runtime(format!(
            "{} requires exactly {} argument{}",
            name,
            expected,
            if expected == 1 { "" } else { "s" }
        )));
    }
    Ok(&args[0])
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (ddof = 0).
fn variance_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mean = mean_of(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

fn median_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Linear-interpolation quantile over the sorted data, `q` in [0, 1].
fn quantile_of(values: &[f64], q: f64) -> Result<f64, ExprError> {
    if !(0.0..=1.0).contains(&q) {
        return Err(ExprError::runtime(format!(
            "quantile level must be between 0 and 1, got {}",
            q
        )));
    }
    if values.is_empty() {
        return Err(ExprError::runtime("quantile of an empty vector"));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        Ok(sorted[lower])
    } else {
        let weight = pos - lower as f64;
        Ok(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
    }
}

fn mean_fn(args: &[Value]) -> Result<Value, ExprError> {
    let data = data_arg(args, "mean", 1)?.as_slice();
    Ok(Value::Scalar(mean_of(&data)))
}

fn std_fn(args: &[Value]) -> Result<Value, ExprError> {
    let data = data_arg(args, "std", 1)?.as_slice();
    Ok(Value::Scalar(variance_of(&data).sqrt()))
}

fn var_fn(args: &[Value]) -> Result<Value, ExprError> {
    let data = data_arg(args, "var", 1)?.as_slice();
    Ok(Value::Scalar(variance_of(&data)))
}

fn median_fn(args: &[Value]) -> Result<Value, ExprError> {
    let data = data_arg(args, "median", 1)?.as_slice();
    Ok(Value::Scalar(median_of(&data)))
}

fn min_fn(args: &[Value]) -> Result<Value, ExprError> {
    let data = data_arg(args, "min", 1)?.as_slice();
    data.iter()
        .copied()
        .reduce(f64::min)
        .map(Value::Scalar)
        .ok_or_else(|| ExprError::runtime("min of an empty vector"))
}

fn max_fn(args: &[Value]) -> Result<Value, ExprError> {
    let data = data_arg(args, "max", 1)?.as_slice();
    data.iter()
        .copied()
        .reduce(f64::max)
        .map(Value::Scalar)
        .ok_or_else(|| ExprError::runtime("max of an empty vector"))
}

fn sum_fn(args: &[Value]) -> Result<Value, ExprError> {
    let data = data_arg(args, "sum", 1)?.as_slice();
    Ok(Value::Scalar(data.iter().sum()))
}

fn count_fn(args: &[Value]) -> Result<Value, ExprError> {
    match data_arg(args, "count", 1)? {
        Value::Vector(values) => Ok(Value::Scalar(values.len() as f64)),
        Value::Scalar(_) => Err(ExprError::runtime("count requires a data vector")),
    }
}

fn quantile_fn(args: &[Value]) -> Result<Value, ExprError> {
    if args.len() != 2 {
        return Err(ExprError::runtime(
            "quantile requires a data vector and a level, e.g. quantile(y, 0.5)",
        ));
    }
    let data = args[0].as_slice();
    let q = args[1].expect_scalar("quantile level")?;
    Ok(Value::Scalar(quantile_of(&data, q)?))
}

/// Statistical category table.
pub static STATISTICAL_FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        name: "mean",
        aliases: &["avg", "average"],
        category: FunctionCategory::Statistical,
        min_args: 1,
        documentation: "Arithmetic mean of a data vector",
        handler: mean_fn,
    },
    FunctionDef {
        name: "std",
        aliases: &["stdev"],
        category: FunctionCategory::Statistical,
        min_args: 1,
        documentation: "Population standard deviation of a data vector",
        handler: std_fn,
    },
    FunctionDef {
        name: "var",
        aliases: &["variance"],
        category: FunctionCategory::Statistical,
        min_args: 1,
        documentation: "Population variance of a data vector",
        handler: var_fn,
    },
    FunctionDef {
        name: "median",
        aliases: &[],
        category: FunctionCategory::Statistical,
        min_args: 1,
        documentation: "Median of a data vector",
        handler: median_fn,
    },
    FunctionDef {
        name: "min",
        aliases: &[],
        category: FunctionCategory::Statistical,
        min_args: 1,
        documentation: "Smallest element of a data vector",
        handler: min_fn,
    },
    FunctionDef {
        name: "max",
        aliases: &[],
        category: FunctionCategory::Statistical,
        min_args: 1,
        documentation: "Largest element of a data vector",
        handler: max_fn,
    },
    FunctionDef {
        name: "sum",
        aliases: &[],
        category: FunctionCategory::Statistical,
        min_args: 1,
        documentation: "Sum of a data vector",
        handler: sum_fn,
    },
    FunctionDef {
        name: "count",
        aliases: &["len"],
        category: FunctionCategory::Statistical,
        min_args: 1,
        documentation: "Number of elements in a data vector",
        handler: count_fn,
    },
    FunctionDef {
        name: "quantile",
        aliases: &["percentile"],
        category: FunctionCategory::Statistical,
        min_args: 1,
        documentation: "Linear-interpolation quantile: quantile(x, q) with q in [0, 1]",
        handler: quantile_fn,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: &[f64]) -> Value {
        Value::Vector(values.to_vec())
    }

    #[test]
    fn test_mean() {
        let result = mean_fn(&[vector(&[1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        assert_eq!(result, Value::Scalar(3.0));
    }

    #[test]
    fn test_mean_of_scalar_is_identity() {
        assert_eq!(mean_fn(&[Value::Scalar(7.0)]).unwrap(), Value::Scalar(7.0));
    }

    #[test]
    fn test_population_std_and_var() {
        let data = vector(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(var_fn(&[data.clone()]).unwrap(), Value::Scalar(4.0));
        assert_eq!(std_fn(&[data]).unwrap(), Value::Scalar(2.0));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(
            median_fn(&[vector(&[3.0, 1.0, 2.0])]).unwrap(),
            Value::Scalar(2.0)
        );
        assert_eq!(
            median_fn(&[vector(&[4.0, 1.0, 3.0, 2.0])]).unwrap(),
            Value::Scalar(2.5)
        );
    }

    #[test]
    fn test_quantile_interpolates() {
        let data = vector(&[0.0, 10.0]);
        assert_eq!(
            quantile_fn(&[data.clone(), Value::Scalar(0.25)]).unwrap(),
            Value::Scalar(2.5)
        );
        assert_eq!(
            quantile_fn(&[data, Value::Scalar(1.0)]).unwrap(),
            Value::Scalar(10.0)
        );
    }

    #[test]
    fn test_quantile_level_out_of_range() {
        let err = quantile_fn(&[vector(&[1.0]), Value::Scalar(1.5)]).unwrap_err();
        assert!(err.to_string().contains("between 0 and 1"));
    }

    #[test]
    fn test_min_max_sum_count() {
        let data = vector(&[5.0, -1.0, 3.0]);
        assert_eq!(min_fn(&[data.clone()]).unwrap(), Value::Scalar(-1.0));
        assert_eq!(max_fn(&[data.clone()]).unwrap(), Value::Scalar(5.0));
        assert_eq!(sum_fn(&[data.clone()]).unwrap(), Value::Scalar(7.0));
        assert_eq!(count_fn(&[data]).unwrap(), Value::Scalar(3.0));
    }

    #[test]
    fn test_count_of_scalar_is_error() {
        assert!(count_fn(&[Value::Scalar(1.0)]).is_err());
    }

    #[test]
    fn test_min_of_empty_vector_is_error() {
        assert!(min_fn(&[vector(&[])]).is_err());
    }
}
