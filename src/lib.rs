//! # datacharts-engine
//!
//! A safe expression engine for evaluating user-submitted mathematical and
//! statistical formulas against tabular data, without granting general code
//! execution. Untrusted text is parsed into a closed AST, validated against
//! a fixed function registry, bound to data columns, and interpreted inside
//! a capability-limited namespace under a wall-clock deadline.
//!
//! ## Features
//!
//! - **Closed expression grammar**: literals, identifiers, arithmetic
//!   operators, and registered function calls - no control flow, no I/O,
//!   no introspection
//! - **Safety gates**: length and nesting limits plus a dangerous-pattern
//!   denylist, applied before parsing
//! - **Immutable function registry**: math, statistical, transform, and
//!   filter functions with aliases and per-function metadata, shared
//!   lock-free across concurrent evaluations
//! - **Permissive data binding**: columns by name, the row `index`, and
//!   positional `col_N` access, with a synthetic index fallback
//! - **Deadline-bounded evaluation**: cooperative wall-clock checks inside
//!   the interpreter loop; every failure folds into an error result
//!
//! ## Quick Start
//!
//! ```rust
//! use datacharts_engine::datacharts::expr::{ExpressionEngine, ResultValue, TableData};
//!
//! let engine = ExpressionEngine::new();
//! let table = TableData::from_columns(vec![
//!     ("x".to_string(), vec![1.0, 2.0, 3.0]),
//!     ("y".to_string(), vec![2.0, 4.0, 6.0]),
//! ])
//! .unwrap();
//!
//! let expression = engine.parse_expression("x + y").unwrap();
//! let result = engine.apply_function(&table, &expression);
//! assert_eq!(result.value, Some(ResultValue::Vector(vec![3.0, 6.0, 9.0])));
//! ```

pub mod datacharts;

// Re-export the primary API at the crate root
pub use datacharts::expr::{
    ExecutionLimits, ExecutionResult, ExecutionStatus, ExprError, Expression, ExpressionEngine,
    ExpressionParser, FunctionInfo, ResultValue, RiskLevel, SafetyReport, TableData,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Feature summary for the discovery surface.
pub const FEATURES: &[&str] = &[
    "expression_parsing",    // closed-grammar parser with safety gates
    "math_functions",        // sin, cos, tan, log, exp, sqrt, abs, floor, ceil, round
    "statistical_functions", // mean, std, var, median, min, max, sum, count, quantile
    "transform_functions",   // normalize, standardize, scale, log_transform, power_transform
    "filter_functions",      // moving_average, gaussian_filter, median_filter, rolling_sum
    "sandboxed_evaluation",  // namespace-restricted interpretation under a deadline
    "data_binding",          // columns by name, index, col_N, synthetic fallback
];
