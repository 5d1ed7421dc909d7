/*!
# Data Binding

Maps expression variable names to concrete data vectors drawn from a
[`DataSource`]. Resolution order per variable:

1. exact column-name match → that column's values
2. the literal name `index` → the row index as a numeric sequence
3. `col_<N>` with `N` a valid zero-based column position → that column
4. otherwise → a synthetic ascending sequence `0..row_count`

Step 4 is deliberate permissiveness: an unresolved name silently becomes
the index sequence instead of failing, which keeps exploratory plotting
forgiving at the cost of masking typos. The strict companion view lives in
[`DataBinder::resolve`], which reports `ColumnNotFound` instead - the
engine's data-validation surface is built on it.
*/

use crate::datacharts::expr::error::ExprError;
use std::collections::HashMap;

/// A flat table of named float columns, as produced by the excluded
/// data-ingestion layer. Column order is observable (it backs the `col_N`
/// positional accessor).
pub trait DataSource {
    /// Column names in table order.
    fn column_names(&self) -> Vec<String>;
    /// Values of a named column, if present.
    fn column(&self, name: &str) -> Option<&[f64]>;
    /// Number of rows.
    fn row_count(&self) -> usize;
}

/// In-memory [`DataSource`] with ordered columns.
#[derive(Debug, Clone, Default)]
pub struct TableData {
    columns: Vec<(String, Vec<f64>)>,
}

impl TableData {
    pub fn new() -> Self {
        TableData {
            columns: Vec::new(),
        }
    }

    /// Build a table from ordered `(name, values)` pairs. All columns must
    /// have equal lengths.
    pub fn from_columns(
        columns: impl IntoIterator<Item = (String, Vec<f64>)>,
    ) -> Result<Self, ExprError> {
        let columns: Vec<(String, Vec<f64>)> = columns.into_iter().collect();
        if let Some(((first_name, first_values), rest)) = columns.split_first() {
            for (name, values) in rest {
                if values.len() != first_values.len() {
                    return Err(ExprError::runtime(format!(
                        "column length mismatch: '{}' has {} rows, '{}' has {}",
                        first_name,
                        first_values.len(),
                        name,
                        values.len()
                    )));
                }
            }
        }
        Ok(TableData { columns })
    }
}

impl DataSource for TableData {
    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(col_name, _)| col_name == name)
            .map(|(_, values)| values.as_slice())
    }

    fn row_count(&self) -> usize {
        self.columns
            .first()
            .map(|(_, values)| values.len())
            .unwrap_or(0)
    }
}

/// Resolved mapping from variable names to data vectors for one evaluation.
#[derive(Debug, Clone)]
pub struct DataBinding {
    values: HashMap<String, Vec<f64>>,
    row_count: usize,
}

impl DataBinding {
    /// Empty binding over a table of `row_count` rows.
    pub fn new(row_count: usize) -> Self {
        DataBinding {
            values: HashMap::new(),
            row_count,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.values.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(|v| v.as_slice())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }
}

/// Binds expression variables against a data source.
#[derive(Debug, Clone, Default)]
pub struct DataBinder;

impl DataBinder {
    pub fn new() -> Self {
        DataBinder
    }

    /// Strict resolution: steps 1–3 of the resolution order, with
    /// `ColumnNotFound` instead of the synthetic fallback.
    pub fn resolve(&self, variable: &str, source: &dyn DataSource) -> Result<Vec<f64>, ExprError> {
        if let Some(values) = source.column(variable) {
            return Ok(values.to_vec());
        }

        if variable == "index" {
            return Ok(index_sequence(source.row_count()));
        }

        if let Some(position) = variable.strip_prefix("col_") {
            if let Ok(position) = position.parse::<usize>() {
                let names = source.column_names();
                if let Some(name) = names.get(position) {
                    if let Some(values) = source.column(name) {
                        return Ok(values.to_vec());
                    }
                }
            }
        }

        Err(ExprError::ColumnNotFound {
            variable: variable.to_string(),
        })
    }

    /// Permissive binding: resolves each variable, substituting the
    /// synthetic `0..row_count` sequence for anything `resolve` rejects.
    pub fn bind(&self, variables: &[String], source: &dyn DataSource) -> DataBinding {
        let mut binding = DataBinding::new(source.row_count());

        for variable in variables {
            let values = match self.resolve(variable, source) {
                Ok(values) => values,
                Err(_) => {
                    log::debug!(
                        "variable '{}' not found in data source; binding synthetic index",
                        variable
                    );
                    index_sequence(source.row_count())
                }
            };
            binding.insert(variable.clone(), values);
        }

        binding
    }
}

fn index_sequence(row_count: usize) -> Vec<f64> {
    (0..row_count).map(|i| i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TableData {
        TableData::from_columns(vec![
            ("x".to_string(), vec![1.0, 2.0, 3.0]),
            ("y".to_string(), vec![2.0, 4.0, 6.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_match() {
        let binder = DataBinder::new();
        let binding = binder.bind(&["x".to_string()], &sample_table());
        assert_eq!(binding.get("x"), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(binding.row_count(), 3);
    }

    #[test]
    fn test_index_variable() {
        let binder = DataBinder::new();
        let binding = binder.bind(&["index".to_string()], &sample_table());
        assert_eq!(binding.get("index"), Some(&[0.0, 1.0, 2.0][..]));
    }

    #[test]
    fn test_positional_accessor() {
        let binder = DataBinder::new();
        let binding = binder.bind(&["col_1".to_string()], &sample_table());
        assert_eq!(binding.get("col_1"), Some(&[2.0, 4.0, 6.0][..]));
    }

    #[test]
    fn test_unresolved_variable_gets_synthetic_index() {
        let binder = DataBinder::new();
        let binding = binder.bind(&["missing".to_string()], &sample_table());
        assert_eq!(binding.get("missing"), Some(&[0.0, 1.0, 2.0][..]));
    }

    #[test]
    fn test_out_of_range_position_falls_back_to_synthetic() {
        let binder = DataBinder::new();
        let binding = binder.bind(&["col_9".to_string()], &sample_table());
        assert_eq!(binding.get("col_9"), Some(&[0.0, 1.0, 2.0][..]));
    }

    #[test]
    fn test_strict_resolve_reports_missing_column() {
        let binder = DataBinder::new();
        assert!(matches!(
            binder.resolve("missing", &sample_table()),
            Err(ExprError::ColumnNotFound { .. })
        ));
        assert!(binder.resolve("col_0", &sample_table()).is_ok());
        assert!(binder.resolve("col_9", &sample_table()).is_err());
    }

    #[test]
    fn test_mismatched_column_lengths_rejected() {
        let result = TableData::from_columns(vec![
            ("a".to_string(), vec![1.0]),
            ("b".to_string(), vec![1.0, 2.0]),
        ]);
        assert!(result.is_err());
    }
}
