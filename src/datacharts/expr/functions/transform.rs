//! Shape-preserving data transforms.
//!
//! Each entry maps a data vector to a vector of the same length. The
//! degenerate cases are deliberate policy: `normalize` and `standardize`
//! return their input unchanged when the spread is zero, and
//! `log_transform` maps non-positive elements to zero rather than
//! producing NaN.

use super::metadata::{FunctionCategory, FunctionDef};
use crate::datacharts::expr::error::ExprError;
use crate::datacharts::expr::execution::types::Value;

/// Rebuild the output in the shape of the input value.
fn with_input_shape(input: &Value, output: Vec<f64>) -> Value {
    match input {
        Value::Scalar(_) => Value::Scalar(output[0]),
        Value::Vector(_) => Value::Vector(output),
    }
}

/// Optional scalar parameter in `args[index]`, defaulting to `default`.
fn optional_param(
    args: &[Value],
    index: usize,
    name: &str,
    default: f64,
) -> Result<f64, ExprError> {
    match args.get(index) {
        Some(value) => value.expect_scalar(name),
        None => Ok(default),
    }
}

fn check_args(args: &[Value], name: &str, min: usize, max: usize) -> Result<(), ExprError> {
    if args.len() < min || args.len() > max {
        return Err(ExprError::runtime(format!(
            "{} accepts {} to {} arguments, got {}",
            name,
            min,
            max,
            args.len()
        )));
    }
    Ok(())
}

/// Min-max scaling to [0, 1]; identity on constant data.
fn normalize_fn(args: &[Value]) -> Result<Value, ExprError> {
    check_args(args, "normalize", 1, 1)?;
    let data = args[0].as_slice();
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let output = if data.is_empty() || max == min {
        data.to_vec()
    } else {
        data.iter().map(|v| (v - min) / (max - min)).collect()
    };
    Ok(with_input_shape(&args[0], output))
}

/// Z-score standardization; identity when the deviation is zero.
fn standardize_fn(args: &[Value]) -> Result<Value, ExprError> {
    check_args(args, "standardize", 1, 1)?;
    let data = args[0].as_slice();
    if data.is_empty() {
        return Ok(args[0].clone());
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    let std =
        (data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / data.len() as f64).sqrt();

    let output = if std == 0.0 {
        data.to_vec()
    } else {
        data.iter().map(|v| (v - mean) / std).collect()
    };
    Ok(with_input_shape(&args[0], output))
}

fn scale_fn(args: &[Value]) -> Result<Value, ExprError> {
    check_args(args, "scale", 1, 2)?;
    let factor = optional_param(args, 1, "scale factor", 1.0)?;
    Ok(args[0].map(|v| v * factor))
}

fn log_transform_fn(args: &[Value]) -> Result<Value, ExprError> {
    check_args(args, "log_transform", 1, 1)?;
    Ok(args[0].map(|v| if v > 0.0 { v.ln() } else { 0.0 }))
}

fn power_transform_fn(args: &[Value]) -> Result<Value, ExprError> {
    check_args(args, "power_transform", 1, 2)?;
    let power = optional_param(args, 1, "power", 2.0)?;
    Ok(args[0].map(|v| v.powf(power)))
}

/// Transform category table.
pub static TRANSFORM_FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        name: "normalize",
        aliases: &[],
        category: FunctionCategory::Transform,
        min_args: 1,
        documentation: "Min-max scale a data vector to [0, 1]",
        handler: normalize_fn,
    },
    FunctionDef {
        name: "standardize",
        aliases: &["zscore"],
        category: FunctionCategory::Transform,
        min_args: 1,
        documentation: "Z-score standardize a data vector",
        handler: standardize_fn,
    },
    FunctionDef {
        name: "scale",
        aliases: &[],
        category: FunctionCategory::Transform,
        min_args: 1,
        documentation: "Multiply a data vector by a factor: scale(x, factor=1)",
        handler: scale_fn,
    },
    FunctionDef {
        name: "log_transform",
        aliases: &[],
        category: FunctionCategory::Transform,
        min_args: 1,
        documentation: "Natural log of positive elements; non-positive elements become 0",
        handler: log_transform_fn,
    },
    FunctionDef {
        name: "power_transform",
        aliases: &[],
        category: FunctionCategory::Transform,
        min_args: 1,
        documentation: "Raise each element to a power: power_transform(x, power=2)",
        handler: power_transform_fn,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: &[f64]) -> Value {
        Value::Vector(values.to_vec())
    }

    #[test]
    fn test_normalize() {
        let result = normalize_fn(&[vector(&[0.0, 5.0, 10.0])]).unwrap();
        assert_eq!(result, Value::Vector(vec![0.0, 0.5, 1.0]));
    }

    #[test]
    fn test_normalize_constant_is_identity() {
        let result = normalize_fn(&[vector(&[4.0, 4.0, 4.0])]).unwrap();
        assert_eq!(result, Value::Vector(vec![4.0, 4.0, 4.0]));
    }

    #[test]
    fn test_standardize_zero_mean_unit_std() {
        let result = standardize_fn(&[vector(&[1.0, 2.0, 3.0])]).unwrap();
        match result {
            Value::Vector(v) => {
                let mean: f64 = v.iter().sum::<f64>() / v.len() as f64;
                assert!(mean.abs() < 1e-12);
                assert!((v[2] - 1.224_744_871_391_589).abs() < 1e-12);
            }
            _ => panic!("expected vector"),
        }
    }

    #[test]
    fn test_scale_default_factor() {
        let result = scale_fn(&[vector(&[1.0, 2.0])]).unwrap();
        assert_eq!(result, Value::Vector(vec![1.0, 2.0]));

        let result = scale_fn(&[vector(&[1.0, 2.0]), Value::Scalar(3.0)]).unwrap();
        assert_eq!(result, Value::Vector(vec![3.0, 6.0]));
    }

    #[test]
    fn test_log_transform_clamps_non_positive() {
        let result = log_transform_fn(&[vector(&[-1.0, 0.0, std::f64::consts::E])]).unwrap();
        match result {
            Value::Vector(v) => {
                assert_eq!(v[0], 0.0);
                assert_eq!(v[1], 0.0);
                assert!((v[2] - 1.0).abs() < 1e-12);
            }
            _ => panic!("expected vector"),
        }
    }

    #[test]
    fn test_power_transform_default_square() {
        let result = power_transform_fn(&[vector(&[2.0, 3.0])]).unwrap();
        assert_eq!(result, Value::Vector(vec![4.0, 9.0]));
    }

    #[test]
    fn test_vector_parameter_rejected() {
        let err = scale_fn(&[vector(&[1.0]), vector(&[2.0])]).unwrap_err();
        assert!(err.to_string().contains("scalar"));
    }
}
