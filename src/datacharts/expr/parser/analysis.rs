/*!
Advisory complexity analysis for expressions.

Produces size and shape metrics for an expression string, plus coarse
execution-time and memory estimates derived from a weighted score. The
analysis is purely informational - it never gates parsing or execution -
and works on raw text so it can describe expressions the parser rejects.
*/

use super::safety::nesting_depth;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

static FUNCTION_CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z_][a-zA-Z0-9_]*\s*\(").expect("fixed pattern must compile")
});

static OPERATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+\-*/^%]").expect("fixed pattern must compile"));

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]*\b").expect("fixed pattern must compile")
});

/// Shape metrics for an expression string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub length: usize,
    pub function_count: usize,
    pub operator_count: usize,
    pub nesting_depth: usize,
    /// Count of distinct identifiers, including function and constant names.
    pub identifier_count: usize,
}

/// Full advisory analysis of an expression string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionAnalysis {
    pub complexity: ComplexityMetrics,
    /// Coarse execution-time estimate, e.g. "fast (1-10ms)".
    pub estimated_execution_time: String,
    /// Coarse memory-use estimate.
    pub estimated_memory_usage: String,
    /// Human-readable simplification suggestions.
    pub recommendations: Vec<String>,
}

/// Compute shape metrics from raw expression text.
pub fn complexity_metrics(text: &str) -> ComplexityMetrics {
    let identifiers: HashSet<&str> = IDENTIFIER_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect();

    ComplexityMetrics {
        length: text.len(),
        function_count: FUNCTION_CALL_PATTERN.find_iter(text).count(),
        operator_count: OPERATOR_PATTERN.find_iter(text).count(),
        nesting_depth: nesting_depth(text),
        identifier_count: identifiers.len(),
    }
}

impl ComplexityMetrics {
    /// Weighted complexity score: functions weigh 2, nesting 3, operators
    /// and identifiers 1 each.
    pub fn score(&self) -> usize {
        self.function_count * 2
            + self.operator_count
            + self.nesting_depth * 3
            + self.identifier_count
    }
}

/// Analyze an expression string: metrics, estimates, and recommendations.
pub fn analyze(text: &str) -> ExpressionAnalysis {
    let complexity = complexity_metrics(text);
    let score = complexity.score();

    let estimated_execution_time = match score {
        0..=4 => "very fast (<1ms)",
        5..=19 => "fast (1-10ms)",
        20..=49 => "moderate (10-100ms)",
        _ => "slow (>100ms)",
    }
    .to_string();

    let memory_score = complexity.identifier_count + complexity.function_count;
    let estimated_memory_usage = match memory_score {
        0..=2 => "low memory use",
        3..=7 => "moderate memory use",
        _ => "high memory use",
    }
    .to_string();

    let mut recommendations = Vec::new();
    if complexity.function_count > 5 {
        recommendations
            .push("expression calls many functions; consider splitting it into steps".to_string());
    }
    if complexity.nesting_depth > 5 {
        recommendations.push("expression is deeply nested; consider simplifying".to_string());
    }
    if complexity.length > 200 {
        recommendations
            .push("expression is long; consider using intermediate columns".to_string());
    }

    ExpressionAnalysis {
        complexity,
        estimated_execution_time,
        estimated_memory_usage,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_for_simple_expression() {
        let metrics = complexity_metrics("sin(x) + mean(y)");
        assert_eq!(metrics.function_count, 2);
        assert_eq!(metrics.operator_count, 1);
        assert_eq!(metrics.nesting_depth, 1);
        // sin, x, mean, y
        assert_eq!(metrics.identifier_count, 4);
    }

    #[test]
    fn test_numbers_are_not_identifiers() {
        let metrics = complexity_metrics("x * 2 + 3.5");
        assert_eq!(metrics.identifier_count, 1);
    }

    #[test]
    fn test_simple_expression_is_fast() {
        let analysis = analyze("x + 1");
        assert_eq!(analysis.estimated_execution_time, "very fast (<1ms)");
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn test_heavy_expression_gets_recommendations() {
        let text = "sin(cos(tan(sqrt(exp(log(normalize(standardize(x))))))))";
        let analysis = analyze(text);
        assert!(analysis.complexity.function_count > 5);
        assert!(
            analysis
                .recommendations
                .iter()
                .any(|r| r.contains("many functions"))
        );
        assert!(
            analysis
                .recommendations
                .iter()
                .any(|r| r.contains("deeply nested"))
        );
    }
}
