/*!
# Expression Engine Facade

[`ExpressionEngine`] wires the parser, binder, evaluator, and coercer into
the surface the request-handling layer calls. Every operation is
synchronous and stateless across calls apart from the shared immutable
function registry; run each call on its own worker if one slow expression
must not block others. Evaluation failures of any kind come back as error
[`ExecutionResult`]s - nothing here is fatal to the process.
*/

use super::binder::{DataBinder, DataSource, TableData};
use super::evaluator::{ExecutionLimits, SandboxedEvaluator};
use super::types::ExecutionResult;
use crate::datacharts::expr::ast::Expression;
use crate::datacharts::expr::error::ExprError;
use crate::datacharts::expr::functions::{self, FunctionInfo};
use crate::datacharts::expr::parser::safety::{
    MAX_EXPRESSION_LENGTH, MAX_NESTING_DEPTH, SafetyReport,
};
use crate::datacharts::expr::parser::{ExpressionAnalysis, ExpressionParser};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of validating an expression against a concrete data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationReport {
    pub is_valid: bool,
    /// Variables that resolve against the data source (columns, `index`,
    /// in-range `col_N`).
    pub available_variables: Vec<String>,
    /// Variables that do not resolve and would fall back to the synthetic
    /// index sequence under the permissive binding policy.
    pub missing_variables: Vec<String>,
    /// Column names of the data source, in table order.
    pub data_columns: Vec<String>,
    /// Human-readable hints for each missing variable.
    pub suggestions: Vec<String>,
    /// Parse error message when the expression itself is invalid.
    pub error: Option<String>,
}

/// Combined advisory diagnostics for an expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionDiagnostics {
    pub is_valid: bool,
    /// Parse error message when invalid.
    pub error: Option<String>,
    pub analysis: ExpressionAnalysis,
    pub safety: SafetyReport,
}

/// Engine limits and registry statistics for the discovery surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    pub max_expression_length: usize,
    pub max_nesting_depth: usize,
    pub max_execution_time_secs: f64,
    pub max_memory_mb: u64,
    pub total_functions: usize,
    /// Category label → function count.
    pub functions_per_category: BTreeMap<String, usize>,
}

/// The core engine: parse, validate, bind, and evaluate expressions
/// against tabular data.
#[derive(Debug, Clone, Default)]
pub struct ExpressionEngine {
    parser: ExpressionParser,
    binder: DataBinder,
    evaluator: SandboxedEvaluator,
}

impl ExpressionEngine {
    pub fn new() -> Self {
        ExpressionEngine {
            parser: ExpressionParser::new(),
            binder: DataBinder::new(),
            evaluator: SandboxedEvaluator::new(),
        }
    }

    /// Engine with custom execution limits.
    pub fn with_limits(limits: ExecutionLimits) -> Self {
        ExpressionEngine {
            parser: ExpressionParser::new(),
            binder: DataBinder::new(),
            evaluator: SandboxedEvaluator::with_limits(limits),
        }
    }

    /// Parse expression text into a validated [`Expression`].
    pub fn parse_expression(&self, text: &str) -> Result<Expression, ExprError> {
        self.parser.parse(text)
    }

    /// True when `parse_expression` would succeed.
    pub fn validate_syntax(&self, text: &str) -> bool {
        self.parser.validate_syntax(text)
    }

    /// Bind an expression's variables against a data source and evaluate
    /// it under the configured limits.
    pub fn apply_function(
        &self,
        data: &dyn DataSource,
        expression: &Expression,
    ) -> ExecutionResult {
        let binding = self.binder.bind(&expression.variables, data);
        self.evaluator.evaluate(expression, &binding)
    }

    /// All canonical function names, sorted.
    pub fn get_supported_functions(&self) -> Vec<&'static str> {
        functions::supported_function_names()
    }

    /// Category label → sorted function names.
    pub fn get_function_categories(&self) -> BTreeMap<&'static str, Vec<&'static str>> {
        functions::function_categories()
    }

    /// Metadata for one function or alias, if registered.
    pub fn get_function_info(&self, name: &str) -> Option<FunctionInfo> {
        functions::function_info(name)
    }

    /// Advisory safety scan of raw expression text.
    pub fn validate_expression_safety(&self, text: &str) -> SafetyReport {
        self.evaluator.validate_expression_safety(text)
    }

    /// Validate that an expression's variables resolve against a concrete
    /// data source, with suggestions for the ones that do not.
    pub fn validate_function_with_data(
        &self,
        text: &str,
        data: &dyn DataSource,
    ) -> DataValidationReport {
        let data_columns: Vec<String> = data.column_names();

        let expression = match self.parser.parse(text) {
            Ok(expression) => expression,
            Err(error) => {
                return DataValidationReport {
                    is_valid: false,
                    available_variables: Vec::new(),
                    missing_variables: Vec::new(),
                    data_columns,
                    suggestions: Vec::new(),
                    error: Some(error.to_string()),
                };
            }
        };

        let mut available_variables = Vec::new();
        let mut missing_variables = Vec::new();
        for variable in &expression.variables {
            match self.binder.resolve(variable, data) {
                Ok(_) => available_variables.push(variable.clone()),
                Err(_) => missing_variables.push(variable.clone()),
            }
        }

        let suggestions = variable_suggestions(&missing_variables, &data_columns);

        DataValidationReport {
            is_valid: missing_variables.is_empty(),
            available_variables,
            missing_variables,
            data_columns,
            suggestions,
            error: None,
        }
    }

    /// Combined complexity analysis and safety scan. Advisory only - never
    /// gates execution.
    pub fn analyze_expression(&self, text: &str) -> ExpressionDiagnostics {
        let parse_outcome = self.parser.parse(text);
        ExpressionDiagnostics {
            is_valid: parse_outcome.is_ok(),
            error: parse_outcome.err().map(|e| e.to_string()),
            analysis: self.parser.analyze(text),
            safety: self.validate_expression_safety(text),
        }
    }

    /// Parser limits, executor limits, and registry statistics.
    pub fn environment_info(&self) -> EngineInfo {
        let functions_per_category = functions::function_categories()
            .into_iter()
            .map(|(label, names)| (label.to_string(), names.len()))
            .collect();

        EngineInfo {
            max_expression_length: MAX_EXPRESSION_LENGTH,
            max_nesting_depth: MAX_NESTING_DEPTH,
            max_execution_time_secs: self.evaluator.limits().max_execution_time.as_secs_f64(),
            max_memory_mb: self.evaluator.limits().max_memory_mb,
            total_functions: functions::supported_function_names().len(),
            functions_per_category,
        }
    }

    /// Parse and evaluate an expression against caller-supplied in-memory
    /// columns. Convenience for interactive "try it" flows; all failures
    /// fold into the returned result.
    pub fn test_expression(
        &self,
        text: &str,
        columns: Vec<(String, Vec<f64>)>,
    ) -> ExecutionResult {
        let table = match TableData::from_columns(columns) {
            Ok(table) => table,
            Err(error) => return ExecutionResult::failure(&error, 0.0),
        };
        match self.parse_expression(text) {
            Ok(expression) => self.apply_function(&table, &expression),
            Err(error) => ExecutionResult::failure(&error, 0.0),
        }
    }
}

/// For each missing variable, propose a similarly named column
/// (case-insensitive substring match either direction) or point at the
/// positional accessor.
fn variable_suggestions(missing: &[String], columns: &[String]) -> Vec<String> {
    let mut suggestions = Vec::new();

    for variable in missing {
        let variable_lower = variable.to_lowercase();
        let similar = columns.iter().find(|column| {
            let column_lower = column.to_lowercase();
            column_lower.contains(&variable_lower) || variable_lower.contains(&column_lower)
        });

        match similar {
            Some(column) => suggestions.push(format!(
                "variable '{}' not found; did you mean column '{}'?",
                variable, column
            )),
            None => suggestions.push(format!(
                "variable '{}' not found; check the column names or use 'col_N' to access a column by position",
                variable
            )),
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datacharts::expr::execution::types::{ExecutionStatus, ResultValue};

    fn sample_table() -> TableData {
        TableData::from_columns(vec![
            ("x".to_string(), vec![1.0, 2.0, 3.0]),
            ("temperature".to_string(), vec![20.0, 21.0, 19.5]),
        ])
        .unwrap()
    }

    #[test]
    fn test_apply_function_end_to_end() {
        let engine = ExpressionEngine::new();
        let expression = engine.parse_expression("x * 2").unwrap();
        let result = engine.apply_function(&sample_table(), &expression);
        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.value.unwrap(), ResultValue::Vector(vec![2.0, 4.0, 6.0]));
    }

    #[test]
    fn test_validate_with_data_reports_missing_and_suggests() {
        let engine = ExpressionEngine::new();
        let report = engine.validate_function_with_data("x + temp", &sample_table());
        assert!(!report.is_valid);
        assert_eq!(report.available_variables, vec!["x"]);
        assert_eq!(report.missing_variables, vec!["temp"]);
        assert!(report.suggestions[0].contains("temperature"));
    }

    #[test]
    fn test_validate_with_data_accepts_index_and_positional() {
        let engine = ExpressionEngine::new();
        let report = engine.validate_function_with_data("index + col_1", &sample_table());
        assert!(report.is_valid, "{:?}", report);
        assert_eq!(report.missing_variables.len(), 0);
    }

    #[test]
    fn test_validate_with_data_surfaces_parse_errors() {
        let engine = ExpressionEngine::new();
        let report = engine.validate_function_with_data("x + ", &sample_table());
        assert!(!report.is_valid);
        assert!(report.error.is_some());
    }

    #[test]
    fn test_environment_info_counts_registry() {
        let engine = ExpressionEngine::new();
        let info = engine.environment_info();
        assert_eq!(info.total_functions, 28);
        assert_eq!(info.functions_per_category.len(), 4);
        assert_eq!(info.max_expression_length, 1000);
        assert_eq!(info.max_execution_time_secs, 30.0);
    }

    #[test]
    fn test_test_expression_convenience() {
        let engine = ExpressionEngine::new();
        let result = engine.test_expression(
            "mean(v)",
            vec![("v".to_string(), vec![2.0, 4.0, 6.0])],
        );
        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.value.unwrap(), ResultValue::Scalar(4.0));
    }

    #[test]
    fn test_analyze_expression_combines_safety() {
        let engine = ExpressionEngine::new();
        let diagnostics = engine.analyze_expression("eval(x)");
        assert!(!diagnostics.is_valid);
        assert!(!diagnostics.safety.is_safe);
    }
}
