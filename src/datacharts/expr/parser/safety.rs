/*!
# Expression Safety Gates

Pre-parse safety validation for untrusted expression text. Two surfaces:

- [`check_expression_safety`] - the fail-closed gate the parser runs before
  tokenizing. Any violation aborts parsing with a typed error.
- [`validate_expression_safety`] - the advisory scan exposed to callers,
  producing a [`SafetyReport`] with hard issues, soft warnings, and a coarse
  risk level. Independent of parsing: it runs on text the parser would
  reject.

The dangerous-pattern denylist is a fixed table of compiled regular
expressions. It targets textual shapes associated with code execution in
scripting environments - dunder identifiers, import statements, eval/exec
style calls, file and stream opens, interactive input. The AST interpreter
cannot execute any of these even if they slipped through; the denylist
exists so hostile input is rejected loudly and early instead of producing a
confusing downstream error.
*/

use crate::datacharts::expr::error::ExprError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Maximum accepted expression length, in characters.
pub const MAX_EXPRESSION_LENGTH: usize = 1000;

/// Maximum accepted parenthesis nesting depth.
pub const MAX_NESTING_DEPTH: usize = 10;

/// Length above which the advisory scan emits a performance warning.
const WARN_EXPRESSION_LENGTH: usize = 500;

/// Open-paren count above which the advisory scan emits a nesting warning.
const WARN_PAREN_COUNT: usize = 20;

/// The dangerous-pattern denylist: (compiled case-insensitive regex,
/// human-readable description). A match is a hard rejection.
static DANGEROUS_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"__\w+__", "double-underscore identifier"),
        (r"\bimport\s", "import statement"),
        (r"\beval\s*\(", "eval call"),
        (r"\bexec\s*\(", "exec call"),
        (r"\bcompile\s*\(", "compile call"),
        (r"\bopen\s*\(", "file open call"),
        (r"\bfile\s*\(", "file constructor call"),
        (r"\binput\s*\(", "interactive input call"),
        (r"\braw_input\s*\(", "interactive input call"),
    ]
    .into_iter()
    .map(|(pattern, description)| {
        let regex = Regex::new(&format!("(?i){}", pattern))
            .expect("denylist patterns are fixed and must compile");
        (regex, description)
    })
    .collect()
});

/// Iteration keywords flagged by the advisory scan. The grammar has no
/// loops, so these can only appear as stray identifiers, but their presence
/// signals an attempt at control flow.
static ITERATION_KEYWORDS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bwhile\b", "while loop keyword"),
        (r"\bfor\b", "for loop keyword"),
    ]
    .into_iter()
    .map(|(pattern, description)| {
        let regex = Regex::new(&format!("(?i){}", pattern))
            .expect("keyword patterns are fixed and must compile");
        (regex, description)
    })
    .collect()
});

/// Coarse safety classification for an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Result of the advisory safety scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyReport {
    pub is_safe: bool,
    /// Hard violations; non-empty means the expression must not run.
    pub issues: Vec<String>,
    /// Soft, performance-related findings.
    pub warnings: Vec<String>,
    pub risk_level: RiskLevel,
}

/// Maximum open-parenthesis depth, scanning left to right.
pub fn nesting_depth(text: &str) -> usize {
    let mut depth: usize = 0;
    let mut max_depth: usize = 0;

    for ch in text.chars() {
        match ch {
            '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    max_depth
}

/// Fail-closed gate run by the parser before tokenization.
///
/// Checks, in order: length limit, nesting limit, dangerous-pattern
/// denylist. The first violation aborts with the corresponding typed error.
pub fn check_expression_safety(text: &str) -> Result<(), ExprError> {
    if text.len() > MAX_EXPRESSION_LENGTH {
        return Err(ExprError::TooLong {
            length: text.len(),
            limit: MAX_EXPRESSION_LENGTH,
        });
    }

    let depth = nesting_depth(text);
    if depth > MAX_NESTING_DEPTH {
        return Err(ExprError::TooDeep {
            depth,
            limit: MAX_NESTING_DEPTH,
        });
    }

    for (regex, description) in DANGEROUS_PATTERNS.iter() {
        if regex.is_match(text) {
            log::warn!("rejected unsafe expression: {}", description);
            return Err(ExprError::UnsafePattern {
                pattern: (*description).to_string(),
            });
        }
    }

    Ok(())
}

/// Advisory safety scan, independent of parsing.
///
/// Hard issues: denylist matches and iteration keywords. Soft warnings:
/// length above 500 characters or more than 20 open parentheses. The risk
/// level is `High` when issues are present, `Medium` when only warnings
/// are, `Low` otherwise.
pub fn validate_expression_safety(text: &str) -> SafetyReport {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    for (regex, description) in DANGEROUS_PATTERNS.iter() {
        if regex.is_match(text) {
            issues.push(format!("contains {}", description));
        }
    }

    for (regex, description) in ITERATION_KEYWORDS.iter() {
        if regex.is_match(text) {
            issues.push(format!("contains {}", description));
        }
    }

    if text.len() > MAX_EXPRESSION_LENGTH {
        issues.push(format!(
            "expression exceeds maximum length of {} characters",
            MAX_EXPRESSION_LENGTH
        ));
    } else if text.len() > WARN_EXPRESSION_LENGTH {
        warnings.push("expression is long and may be slow to evaluate".to_string());
    }

    let open_parens = text.chars().filter(|&c| c == '(').count();
    if nesting_depth(text) > MAX_NESTING_DEPTH {
        issues.push(format!(
            "expression exceeds maximum nesting depth of {}",
            MAX_NESTING_DEPTH
        ));
    } else if open_parens > WARN_PAREN_COUNT {
        warnings.push("expression is deeply nested and may be slow to evaluate".to_string());
    }

    let risk_level = if !issues.is_empty() {
        RiskLevel::High
    } else if !warnings.is_empty() {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    SafetyReport {
        is_safe: issues.is_empty(),
        issues,
        warnings,
        risk_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_depth() {
        assert_eq!(nesting_depth("x + y"), 0);
        assert_eq!(nesting_depth("sin(cos(x))"), 2);
        assert_eq!(nesting_depth("(a)(b)(c)"), 1);
    }

    #[test]
    fn test_length_gate() {
        let long = "x+".repeat(501);
        match check_expression_safety(&long) {
            Err(ExprError::TooLong { length, limit }) => {
                assert_eq!(length, 1002);
                assert_eq!(limit, MAX_EXPRESSION_LENGTH);
            }
            other => panic!("expected TooLong, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_gate() {
        let deep = format!("{}x{}", "(".repeat(11), ")".repeat(11));
        assert!(matches!(
            check_expression_safety(&deep),
            Err(ExprError::TooDeep { depth: 11, .. })
        ));
    }

    #[test]
    fn test_denylist_gate() {
        for text in [
            "__import__('os')",
            "eval(x)",
            "EXEC(x)",
            "open('/etc/passwd')",
            "import os",
            "input()",
        ] {
            assert!(
                matches!(
                    check_expression_safety(text),
                    Err(ExprError::UnsafePattern { .. })
                ),
                "expected rejection of {:?}",
                text
            );
        }
    }

    #[test]
    fn test_benign_names_pass() {
        // Names merely containing a denylisted word must not be rejected
        for text in ["evaluate_x + 1", "file_size * 2", "important_value"] {
            assert!(check_expression_safety(text).is_ok(), "rejected {:?}", text);
        }
    }

    #[test]
    fn test_scan_risk_levels() {
        assert_eq!(validate_expression_safety("x + y").risk_level, RiskLevel::Low);

        let long = format!("x + {}", "1 + ".repeat(150));
        let report = validate_expression_safety(&long);
        assert_eq!(report.risk_level, RiskLevel::Medium);
        assert!(report.is_safe);

        let report = validate_expression_safety("eval(x)");
        assert_eq!(report.risk_level, RiskLevel::High);
        assert!(!report.is_safe);
        assert!(!report.issues.is_empty());
    }

    #[test]
    fn test_scan_flags_iteration_keywords() {
        let report = validate_expression_safety("for x in y");
        assert_eq!(report.risk_level, RiskLevel::High);
        assert!(report.issues.iter().any(|i| i.contains("for loop")));
    }
}
