/*!
Function metadata and the registry lookup cache.

Every callable operation available to expressions is described by a static
[`FunctionDef`] carrying its canonical name, aliases, category, minimum
arity, documentation, and handler. The four category tables (math,
statistical, transform, filter) are fixed at compile time; the registry is
the union of those tables exposed through a lazily initialized lookup map.

Immutability is the security contract: no function is added or removed
after initialization, which is what lets the evaluator treat registry
entries as trusted and share the registry across concurrent evaluations
without locking.
*/

use crate::datacharts::expr::error::ExprError;
use crate::datacharts::expr::execution::types::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Function handler signature. Handlers receive already-evaluated argument
/// values and return a value or a runtime error; they have no access to
/// anything outside their arguments.
pub type FunctionHandler = fn(&[Value]) -> Result<Value, ExprError>;

/// Categories of registered functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FunctionCategory {
    /// Element-wise math (sin, sqrt, abs, ...)
    Math,
    /// Reductions over a data vector (mean, std, quantile, ...)
    Statistical,
    /// Shape-preserving data transforms (normalize, scale, ...)
    Transform,
    /// Smoothing and windowed filters (moving_average, gaussian_filter, ...)
    Filter,
}

impl FunctionCategory {
    /// Display label used in category listings.
    pub fn label(&self) -> &'static str {
        match self {
            FunctionCategory::Math => "math",
            FunctionCategory::Statistical => "statistical",
            FunctionCategory::Transform => "transform",
            FunctionCategory::Filter => "filter",
        }
    }

    /// All categories in listing order.
    pub fn all() -> [FunctionCategory; 4] {
        [
            FunctionCategory::Math,
            FunctionCategory::Statistical,
            FunctionCategory::Transform,
            FunctionCategory::Filter,
        ]
    }
}

/// Registered function metadata.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// Canonical function name (lowercase)
    pub name: &'static str,
    /// Accepted synonyms, mapped to the canonical name during parsing
    pub aliases: &'static [&'static str],
    pub category: FunctionCategory,
    /// Minimum number of arguments the function accepts
    pub min_args: usize,
    /// One-line user-facing documentation
    pub documentation: &'static str,
    pub handler: FunctionHandler,
}

/// Cached registry lookup table for O(1) access.
///
/// Maps uppercase-normalized names (canonical names and all aliases) to
/// their definitions. Lazily initialized on first access and never mutated
/// afterwards.
static FUNCTION_LOOKUP_CACHE: LazyLock<HashMap<String, &'static FunctionDef>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();

        for func_def in all_registered_functions() {
            map.insert(func_def.name.to_uppercase(), func_def);
            for alias in func_def.aliases {
                map.insert(alias.to_uppercase(), func_def);
            }
        }

        map
    });

/// Iterate over every registered function, category tables in order.
pub fn all_registered_functions() -> impl Iterator<Item = &'static FunctionDef> {
    super::math::MATH_FUNCTIONS
        .iter()
        .chain(super::statistical::STATISTICAL_FUNCTIONS.iter())
        .chain(super::transform::TRANSFORM_FUNCTIONS.iter())
        .chain(super::filter::FILTER_FUNCTIONS.iter())
}

/// Find a function by name or alias (case-insensitive).
pub fn find_function(name: &str) -> Option<&'static FunctionDef> {
    FUNCTION_LOOKUP_CACHE.get(&name.to_uppercase()).copied()
}

/// All functions in a specific category.
pub fn functions_in_category(category: FunctionCategory) -> Vec<&'static FunctionDef> {
    all_registered_functions()
        .filter(|f| f.category == category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let upper = find_function("SIN").expect("sin registered");
        let lower = find_function("sin").expect("sin registered");
        assert_eq!(upper.name, lower.name);
    }

    #[test]
    fn test_alias_resolves_to_canonical() {
        let by_alias = find_function("ln").expect("ln alias registered");
        assert_eq!(by_alias.name, "log");
        let abs = find_function("Abs").expect("Abs resolves case-insensitively");
        assert_eq!(abs.name, "abs");
    }

    #[test]
    fn test_unknown_function_is_none() {
        assert!(find_function("definitely_not_registered").is_none());
    }

    #[test]
    fn test_every_category_is_populated() {
        for category in FunctionCategory::all() {
            assert!(
                !functions_in_category(category).is_empty(),
                "category {:?} has no functions",
                category
            );
        }
    }

    #[test]
    fn test_no_duplicate_names_across_tables() {
        let mut seen = std::collections::HashSet::new();
        for func in all_registered_functions() {
            assert!(seen.insert(func.name.to_uppercase()), "duplicate {}", func.name);
            for alias in func.aliases {
                assert!(seen.insert(alias.to_uppercase()), "duplicate alias {}", alias);
            }
        }
    }
}
