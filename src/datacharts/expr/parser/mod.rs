/*!
# Expression Parser

Converts untrusted expression text into a validated [`Expression`]. The
pipeline is fail-closed - any stage aborts with a typed error and no
partial expression is ever returned:

1. **Safety gate** - length limit, nesting limit, dangerous-pattern
   denylist ([`safety`])
2. **Tokenization** - [`lexer`]
3. **Structural parse** - recursive descent over the closed grammar
   ([`expressions`])
4. **Variable extraction** - free identifiers minus reserved constants and
   registry names, sorted
5. **Function extraction** - call names canonicalized through the registry
   alias table
6. **Function-support validation** - unknown names are rejected with the
   full registry listing for guidance
7. **Literal extraction** - numeric literals recorded positionally as
   informational parameters

[`validate_syntax`](ExpressionParser::validate_syntax) is the boolean form
of `parse`; [`analyze`](ExpressionParser::analyze) produces the advisory
complexity report and never gates execution.
*/

pub mod analysis;
pub mod expressions;
pub mod lexer;
pub mod safety;

pub use analysis::{ComplexityMetrics, ExpressionAnalysis};
pub use safety::{RiskLevel, SafetyReport};

use crate::datacharts::expr::ast::{ExprNode, Expression};
use crate::datacharts::expr::error::ExprError;
use crate::datacharts::expr::functions;
use expressions::TokenParser;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// Names that are evaluation constants, never data variables. `I` is the
/// imaginary unit, accepted as an identifier and rejected at evaluation
/// time since the engine is real-valued.
const RESERVED_CONSTANTS: &[&str] = &["pi", "e", "I"];

static NUMERIC_LITERAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\.?\d*\b").expect("fixed pattern must compile"));

/// Parser for user-submitted mathematical expressions.
///
/// Stateless apart from the shared, immutable function registry; a single
/// instance may serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct ExpressionParser;

impl ExpressionParser {
    pub fn new() -> Self {
        ExpressionParser
    }

    /// Parse expression text into a validated [`Expression`].
    pub fn parse(&self, text: &str) -> Result<Expression, ExprError> {
        safety::check_expression_safety(text)?;

        let tokens = lexer::tokenize(text)?;
        let mut ast = TokenParser::new(tokens).parse_complete()?;

        canonicalize_calls(&mut ast);

        let variables = extract_variables(&ast);
        let functions_used = extract_functions(&ast)?;
        let parameters = extract_parameters(text);

        log::debug!(
            "parsed expression with {} variable(s), {} function(s)",
            variables.len(),
            functions_used.len()
        );

        Ok(Expression {
            raw_text: text.to_string(),
            ast,
            variables,
            functions_used,
            parameters,
        })
    }

    /// True when `parse` would succeed.
    pub fn validate_syntax(&self, text: &str) -> bool {
        self.parse(text).is_ok()
    }

    /// Advisory complexity analysis; works on text `parse` would reject.
    pub fn analyze(&self, text: &str) -> ExpressionAnalysis {
        analysis::analyze(text)
    }
}

/// Rewrite call names to their canonical registry form (alias table).
/// Unknown names are left as-is for `extract_functions` to reject.
fn canonicalize_calls(node: &mut ExprNode) {
    match node {
        ExprNode::Call { name, args } => {
            if let Some(def) = functions::find_function(name) {
                *name = def.name.to_string();
            }
            for arg in args {
                canonicalize_calls(arg);
            }
        }
        ExprNode::BinaryOp { left, right, .. } => {
            canonicalize_calls(left);
            canonicalize_calls(right);
        }
        ExprNode::UnaryOp { expr, .. } => canonicalize_calls(expr),
        ExprNode::Number(_) | ExprNode::Identifier(_) => {}
    }
}

/// Collect free identifiers, excluding reserved constants and registry
/// names; sorted and deduplicated.
fn extract_variables(ast: &ExprNode) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ast.walk(&mut |node| {
        if let ExprNode::Identifier(name) = node {
            if !RESERVED_CONSTANTS.contains(&name.as_str()) && !functions::is_supported(name) {
                seen.insert(name.clone());
            }
        }
    });
    seen.into_iter().collect()
}

/// Collect canonical names of all called functions; any name missing from
/// the registry fails validation with the full supported list.
fn extract_functions(ast: &ExprNode) -> Result<BTreeSet<String>, ExprError> {
    let mut used = BTreeSet::new();
    let mut unsupported = BTreeSet::new();

    ast.walk(&mut |node| {
        if let ExprNode::Call { name, .. } = node {
            if functions::is_supported(name) {
                used.insert(name.clone());
            } else {
                unsupported.insert(name.clone());
            }
        }
    });

    if !unsupported.is_empty() {
        return Err(ExprError::UnsupportedFunction {
            names: unsupported.into_iter().collect(),
            supported: functions::supported_function_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        });
    }

    Ok(used)
}

/// Record numeric literals positionally as `const_0`, `const_1`, ... -
/// informational only, never used for binding.
fn extract_parameters(text: &str) -> BTreeMap<String, f64> {
    let mut parameters = BTreeMap::new();
    for (i, m) in NUMERIC_LITERAL_PATTERN.find_iter(text).enumerate() {
        if let Ok(value) = m.as_str().parse::<f64>() {
            parameters.insert(format!("const_{}", i), value);
        }
    }
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extracts_sorted_variables() {
        let parser = ExpressionParser::new();
        let expr = parser.parse("y + sin(x) + z * x").unwrap();
        assert_eq!(expr.variables, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_constants_and_function_names_are_not_variables() {
        let parser = ExpressionParser::new();
        let expr = parser.parse("pi * e + sin(x)").unwrap();
        assert_eq!(expr.variables, vec!["x"]);
    }

    #[test]
    fn test_function_extraction_canonicalizes_aliases() {
        let parser = ExpressionParser::new();
        let expr = parser.parse("avg(x) + ln(y)").unwrap();
        let used: Vec<&str> = expr.functions_used.iter().map(|s| s.as_str()).collect();
        assert_eq!(used, vec!["log", "mean"]);
    }

    #[test]
    fn test_unsupported_function_lists_registry() {
        let parser = ExpressionParser::new();
        match parser.parse("sinh(x)") {
            Err(ExprError::UnsupportedFunction { names, supported }) => {
                assert_eq!(names, vec!["sinh".to_string()]);
                assert!(supported.contains(&"sin".to_string()));
            }
            other => panic!("expected UnsupportedFunction, got {:?}", other),
        }
    }

    #[test]
    fn test_parameters_are_positional() {
        let parser = ExpressionParser::new();
        let expr = parser.parse("scale(x, 2.5) + 10").unwrap();
        assert_eq!(expr.parameters.get("const_0"), Some(&2.5));
        assert_eq!(expr.parameters.get("const_1"), Some(&10.0));
    }

    #[test]
    fn test_reparse_is_stable() {
        let parser = ExpressionParser::new();
        let first = parser.parse("sqrt(x**2 + y**2) + mean(z)").unwrap();
        let second = parser.parse(&first.raw_text).unwrap();
        assert_eq!(first.variables, second.variables);
        assert_eq!(first.functions_used, second.functions_used);
    }

    #[test]
    fn test_validate_syntax() {
        let parser = ExpressionParser::new();
        assert!(parser.validate_syntax("sqrt(x**2 + y**2)"));
        assert!(!parser.validate_syntax("x + y +"));
        assert!(!parser.validate_syntax("eval(x)"));
    }

    #[test]
    fn test_safety_gate_runs_before_structural_parse() {
        let parser = ExpressionParser::new();
        // Structurally broken AND unsafe: safety wins
        assert!(matches!(
            parser.parse("__import__('os"),
            Err(ExprError::UnsafePattern { .. })
        ));
    }
}
