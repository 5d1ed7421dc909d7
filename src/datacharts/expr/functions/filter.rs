//! Smoothing and windowed filter functions.
//!
//! Each entry takes a data vector plus optional numeric parameters and
//! returns a vector of the same length. Edge-handling conventions:
//! `moving_average` fills incomplete edge windows by
//! back/forward propagation, `gaussian_filter` and `median_filter` reflect
//! the signal at its boundaries, and `rolling_sum` zero-fills positions
//! that do not yet have a full trailing window.

use super::metadata::{FunctionCategory, FunctionDef};
use crate::datacharts::expr::error::ExprError;
use crate::datacharts::expr::execution::types::Value;

/// Positive-integer window parameter in `args[index]`, defaulting to
/// `default` when absent.
fn window_param(
    args: &[Value],
    index: usize,
    name: &str,
    default: usize,
) -> Result<usize, ExprError> {
    let raw = match args.get(index) {
        Some(value) => value.expect_scalar(name)?,
        None => return Ok(default),
    };
    if raw < 1.0 || (raw - raw.round()).abs() > 1e-9 {
        return Err(ExprError::runtime(format!(
            "{} must be a positive integer, got {}",
            name, raw
        )));
    }
    Ok(raw.round() as usize)
}

fn check_args(args: &[Value], name: &str, max: usize) -> Result<(), ExprError> {
    if args.is_empty() || args.len() > max {
        return Err(ExprError::runtime(format!(
            "{} requires a data vector and accepts at most {} parameter",
            name,
            max - 1
        )));
    }
    Ok(())
}

/// Reflect an out-of-range index into [0, n), mirroring about the edges
/// (…, x[1], x[0] | x[0], x[1], … , x[n-1] | x[n-1], x[n-2], …).
fn reflect_index(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - 1 - i;
        } else {
            return i as usize;
        }
    }
}

/// Centered moving average. Positions without a complete window are marked,
/// then leading gaps are backfilled from the first complete value and
/// trailing gaps forward-filled from the last.
fn moving_average_fn(args: &[Value]) -> Result<Value, ExprError> {
    check_args(args, "moving_average", 2)?;
    let data = args[0].as_slice();
    let window = window_param(args, 1, "moving_average window", 5)?;
    let n = data.len();

    let half_before = (window - 1) / 2;
    let mut output = vec![f64::NAN; n];
    for i in 0..n {
        let start = i as isize - half_before as isize;
        let end = start + window as isize - 1;
        if start >= 0 && (end as usize) < n {
            let slice = &data[start as usize..=end as usize];
            output[i] = slice.iter().sum::<f64>() / window as f64;
        }
    }

    // Backfill leading edge, forward-fill trailing edge
    if let Some(first_valid) = output.iter().position(|v| !v.is_nan()) {
        let fill = output[first_valid];
        for v in output.iter_mut().take(first_valid) {
            *v = fill;
        }
        let mut last = fill;
        for v in output.iter_mut().skip(first_valid) {
            if v.is_nan() {
                *v = last;
            } else {
                last = *v;
            }
        }
    }

    Ok(Value::Vector(output))
}

/// 1-D gaussian smoothing with reflected edges. The kernel radius follows
/// the common truncation of four standard deviations.
fn gaussian_filter_fn(args: &[Value]) -> Result<Value, ExprError> {
    check_args(args, "gaussian_filter", 2)?;
    let data = args[0].as_slice();
    let sigma = match args.get(1) {
        Some(value) => value.expect_scalar("gaussian_filter sigma")?,
        None => 1.0,
    };
    if sigma <= 0.0 {
        return Err(ExprError::runtime(format!(
            "gaussian_filter sigma must be positive, got {}",
            sigma
        )));
    }
    let n = data.len();
    if n == 0 {
        return Ok(Value::Vector(Vec::new()));
    }

    let radius = (4.0 * sigma + 0.5) as usize;
    let mut weights = Vec::with_capacity(2 * radius + 1);
    for k in -(radius as isize)..=(radius as isize) {
        let k = k as f64;
        weights.push((-k * k / (2.0 * sigma * sigma)).exp());
    }
    let total: f64 = weights.iter().sum();
    for w in weights.iter_mut() {
        *w /= total;
    }

    let mut output = vec![0.0; n];
    for i in 0..n {
        let mut acc = 0.0;
        for (j, w) in weights.iter().enumerate() {
            let idx = i as isize + j as isize - radius as isize;
            acc += w * data[reflect_index(idx, n)];
        }
        output[i] = acc;
    }

    Ok(Value::Vector(output))
}

/// Sliding-window median with reflected edges.
fn median_filter_fn(args: &[Value]) -> Result<Value, ExprError> {
    check_args(args, "median_filter", 2)?;
    let data = args[0].as_slice();
    let size = window_param(args, 1, "median_filter size", 3)?;
    let n = data.len();
    if n == 0 {
        return Ok(Value::Vector(Vec::new()));
    }

    let left = size / 2;
    let mut output = vec![0.0; n];
    let mut window = vec![0.0; size];
    for i in 0..n {
        for (j, slot) in window.iter_mut().enumerate() {
            let idx = i as isize + j as isize - left as isize;
            *slot = data[reflect_index(idx, n)];
        }
        window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = size / 2;
        output[i] = if size % 2 == 1 {
            window[mid]
        } else {
            (window[mid - 1] + window[mid]) / 2.0
        };
    }

    Ok(Value::Vector(output))
}

/// Trailing rolling sum; positions without a full window are zero.
fn rolling_sum_fn(args: &[Value]) -> Result<Value, ExprError> {
    check_args(args, "rolling_sum", 2)?;
    let data = args[0].as_slice();
    let window = window_param(args, 1, "rolling_sum window", 5)?;
    let n = data.len();

    let mut output = vec![0.0; n];
    for i in 0..n {
        if i + 1 >= window {
            output[i] = data[i + 1 - window..=i].iter().sum();
        }
    }

    Ok(Value::Vector(output))
}

/// Filter category table.
pub static FILTER_FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        name: "moving_average",
        aliases: &[],
        category: FunctionCategory::Filter,
        min_args: 1,
        documentation: "Centered moving average: moving_average(x, window=5)",
        handler: moving_average_fn,
    },
    FunctionDef {
        name: "gaussian_filter",
        aliases: &[],
        category: FunctionCategory::Filter,
        min_args: 1,
        documentation: "1-D gaussian smoothing: gaussian_filter(x, sigma=1)",
        handler: gaussian_filter_fn,
    },
    FunctionDef {
        name: "median_filter",
        aliases: &[],
        category: FunctionCategory::Filter,
        min_args: 1,
        documentation: "Sliding-window median: median_filter(x, size=3)",
        handler: median_filter_fn,
    },
    FunctionDef {
        name: "rolling_sum",
        aliases: &[],
        category: FunctionCategory::Filter,
        min_args: 1,
        documentation: "Trailing rolling sum: rolling_sum(x, window=5)",
        handler: rolling_sum_fn,
    },
];
