//! Element-wise math functions.
//!
//! Every entry takes exactly one argument and preserves its shape: a scalar
//! yields a scalar, a vector yields a vector of the same length. Domain
//! errors follow IEEE semantics (`log(-1)` is NaN, not an error).

use super::metadata::{FunctionCategory, FunctionDef};
use crate::datacharts::expr::error::ExprError;
use crate::datacharts::expr::execution::types::Value;

fn unary(args: &[Value], name: &str, f: fn(f64) -> f64) -> Result<Value, ExprError> {
    if args.len() != 1 {
        return Err(ExprError::runtime(format!(
            "{} requires exactly one argument",
            name
        )));
    }
    Ok(args[0].map(f))
}

/// Round half to even, matching the numeric-array convention the data
/// layer uses (2.5 rounds to 2, 3.5 rounds to 4).
fn round_half_to_even(v: f64) -> f64 {
    if !v.is_finite() {
        return v;
    }
    let fract = v - v.trunc();
    if fract.abs() == 0.5 {
        let floor = v.floor();
        if floor % 2.0 == 0.0 { floor } else { floor + 1.0 }
    } else {
        v.round()
    }
}

fn sin_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "sin", f64::sin)
}

fn cos_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "cos", f64::cos)
}

fn tan_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "tan", f64::tan)
}

fn log_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "log", f64::ln)
}

fn exp_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "exp", f64::exp)
}

fn sqrt_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "sqrt", f64::sqrt)
}

fn abs_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "abs", f64::abs)
}

fn floor_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "floor", f64::floor)
}

fn ceil_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "ceil", f64::ceil)
}

fn round_fn(args: &[Value]) -> Result<Value, ExprError> {
    unary(args, "round", round_half_to_even)
}

/// Math category table.
pub static MATH_FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        name: "sin",
        aliases: &[],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "Sine of each element (radians)",
        handler: sin_fn,
    },
    FunctionDef {
        name: "cos",
        aliases: &[],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "Cosine of each element (radians)",
        handler: cos_fn,
    },
    FunctionDef {
        name: "tan",
        aliases: &[],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "Tangent of each element (radians)",
        handler: tan_fn,
    },
    FunctionDef {
        name: "log",
        aliases: &["ln"],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "Natural logarithm of each element",
        handler: log_fn,
    },
    FunctionDef {
        name: "exp",
        aliases: &[],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "e raised to each element",
        handler: exp_fn,
    },
    FunctionDef {
        name: "sqrt",
        aliases: &[],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "Square root of each element",
        handler: sqrt_fn,
    },
    FunctionDef {
        name: "abs",
        aliases: &[],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "Absolute value of each element",
        handler: abs_fn,
    },
    FunctionDef {
        name: "floor",
        aliases: &[],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "Largest integer not above each element",
        handler: floor_fn,
    },
    FunctionDef {
        name: "ceil",
        aliases: &["ceiling"],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "Smallest integer not below each element",
        handler: ceil_fn,
    },
    FunctionDef {
        name: "round",
        aliases: &[],
        category: FunctionCategory::Math,
        min_args: 1,
        documentation: "Round each element half-to-even",
        handler: round_fn,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sin_preserves_shape() {
        let scalar = sin_fn(&[Value::Scalar(0.0)]).unwrap();
        assert_eq!(scalar, Value::Scalar(0.0));

        let vector = sin_fn(&[Value::Vector(vec![0.0, std::f64::consts::FRAC_PI_2])]).unwrap();
        match vector {
            Value::Vector(v) => {
                assert!((v[0] - 0.0).abs() < 1e-12);
                assert!((v[1] - 1.0).abs() < 1e-12);
            }
            _ => panic!("expected vector"),
        }
    }

    #[test]
    fn test_log_of_negative_is_nan() {
        match log_fn(&[Value::Scalar(-1.0)]).unwrap() {
            Value::Scalar(v) => assert!(v.is_nan()),
            _ => panic!("expected scalar"),
        }
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round_half_to_even(2.5), 2.0);
        assert_eq!(round_half_to_even(3.5), 4.0);
        assert_eq!(round_half_to_even(-2.5), -2.0);
        assert_eq!(round_half_to_even(2.4), 2.0);
        assert_eq!(round_half_to_even(2.6), 3.0);
    }

    #[test]
    fn test_arity_is_enforced() {
        let err = sqrt_fn(&[Value::Scalar(1.0), Value::Scalar(2.0)]).unwrap_err();
        assert!(err.to_string().contains("exactly one argument"));
    }
}
