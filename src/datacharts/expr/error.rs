/*!
# Expression Engine Error Handling

This module provides error handling for the expression engine. All parsing,
binding, and evaluation operations return well-structured errors with the
context needed for user feedback.

## Error Categories

- **Parse Errors**: syntax errors in expression text with position information
- **Safety Errors**: expressions rejected by the length, nesting, or pattern gates
- **Function Errors**: references to functions outside the registry
- **Binding Errors**: variable names that cannot be resolved against a data source
- **Execution Errors**: runtime failures during sandboxed evaluation, including
  deadline expiry

Parse-time failures are returned synchronously as typed errors. Everything
that happens inside the evaluator is caught at the evaluator boundary and
converted into an error `ExecutionResult` - no error from this module ever
crosses the engine boundary as a panic.
*/

use std::fmt;

/// Error type for all expression parsing, binding, and evaluation operations.
///
/// Each variant carries the context relevant to its failure mode, enabling
/// detailed error reporting without string matching at call sites.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    /// Syntax error during tokenization or parsing, with the character
    /// position where the error occurred when known.
    Syntax {
        message: String,
        position: Option<usize>,
    },

    /// Expression text exceeds the maximum accepted length.
    TooLong { length: usize, limit: usize },

    /// Parenthesis nesting exceeds the maximum accepted depth.
    TooDeep { depth: usize, limit: usize },

    /// Expression text matched an entry of the dangerous-pattern denylist.
    UnsafePattern { pattern: String },

    /// One or more function names are not in the registry. `supported`
    /// carries the full registry listing for user guidance.
    UnsupportedFunction {
        names: Vec<String>,
        supported: Vec<String>,
    },

    /// A variable could not be resolved against the data source. Only
    /// produced by the strict validation surface; the default binding
    /// policy substitutes a synthetic index sequence instead.
    ColumnNotFound { variable: String },

    /// An identifier had no entry in the evaluation namespace.
    UnresolvedVariable { name: String },

    /// Evaluation exceeded the configured deadline.
    Timeout { limit_secs: f64 },

    /// Any other runtime failure during evaluation (arity mismatch, shape
    /// mismatch, domain error, ...).
    Runtime { message: String },
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::Syntax { message, position } => {
                if let Some(pos) = position {
                    write!(f, "syntax error at position {}: {}", pos, message)
                } else {
                    write!(f, "syntax error: {}", message)
                }
            }
            ExprError::TooLong { length, limit } => {
                write!(
                    f,
                    "expression too long: {} characters (limit {})",
                    length, limit
                )
            }
            ExprError::TooDeep { depth, limit } => {
                write!(
                    f,
                    "expression nesting too deep: depth {} (limit {})",
                    depth, limit
                )
            }
            ExprError::UnsafePattern { pattern } => {
                write!(f, "expression contains unsafe operation: {}", pattern)
            }
            ExprError::UnsupportedFunction { names, supported } => {
                write!(
                    f,
                    "unsupported function(s): {}. Supported functions: {}",
                    names.join(", "),
                    supported.join(", ")
                )
            }
            ExprError::ColumnNotFound { variable } => {
                write!(f, "no column found for variable '{}'", variable)
            }
            ExprError::UnresolvedVariable { name } => {
                write!(f, "unresolved identifier '{}' in evaluation namespace", name)
            }
            ExprError::Timeout { limit_secs } => {
                write!(f, "execution timed out after {} seconds", limit_secs)
            }
            ExprError::Runtime { message } => {
                write!(f, "execution error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExprError {}

impl ExprError {
    /// Create a syntax error with optional position.
    pub fn syntax(message: impl Into<String>, position: Option<usize>) -> Self {
        ExprError::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Create a runtime execution error.
    pub fn runtime(message: impl Into<String>) -> Self {
        ExprError::Runtime {
            message: message.into(),
        }
    }

    /// Create an unresolved-identifier error.
    pub fn unresolved(name: impl Into<String>) -> Self {
        ExprError::UnresolvedVariable { name: name.into() }
    }

    /// True for the variants produced by the pre-parse safety gates.
    pub fn is_safety_rejection(&self) -> bool {
        matches!(
            self,
            ExprError::TooLong { .. } | ExprError::TooDeep { .. } | ExprError::UnsafePattern { .. }
        )
    }
}

/// Result type for expression operations.
pub type ExprResult<T> = Result<T, ExprError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position() {
        let err = ExprError::syntax("unexpected character '#'", Some(4));
        assert_eq!(
            err.to_string(),
            "syntax error at position 4: unexpected character '#'"
        );
    }

    #[test]
    fn test_unsupported_function_lists_registry() {
        let err = ExprError::UnsupportedFunction {
            names: vec!["sinh".to_string()],
            supported: vec!["sin".to_string(), "cos".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("sinh"));
        assert!(text.contains("sin, cos"));
    }

    #[test]
    fn test_safety_rejection_classification() {
        assert!(
            ExprError::TooLong {
                length: 2000,
                limit: 1000
            }
            .is_safety_rejection()
        );
        assert!(!ExprError::runtime("boom").is_safety_rejection());
    }
}
