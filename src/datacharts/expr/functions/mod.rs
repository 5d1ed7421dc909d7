/*!
# Function Registry

The immutable catalog of operations available to expressions, grouped into
four categories: math, statistical, transform, and filter. Built once from
the fixed category tables and shared read-only across all concurrent
evaluations - see [`metadata`] for the lookup cache.

Introspection helpers here back the engine's discovery surface:
supported-name listings, category maps, per-function info, and the minimal
arity precondition check.
*/

pub mod filter;
pub mod math;
pub mod metadata;
pub mod statistical;
pub mod transform;

pub use metadata::{
    FunctionCategory, FunctionDef, FunctionHandler, all_registered_functions, find_function,
    functions_in_category,
};

use crate::datacharts::expr::error::ExprError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serializable per-function metadata for the discovery surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub category: String,
    pub aliases: Vec<String>,
    pub min_args: usize,
    pub documentation: String,
}

impl From<&'static FunctionDef> for FunctionInfo {
    fn from(def: &'static FunctionDef) -> Self {
        FunctionInfo {
            name: def.name.to_string(),
            category: def.category.label().to_string(),
            aliases: def.aliases.iter().map(|a| a.to_string()).collect(),
            min_args: def.min_args,
            documentation: def.documentation.to_string(),
        }
    }
}

/// All canonical function names, sorted. Aliases are not listed; they
/// resolve through [`find_function`].
pub fn supported_function_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = all_registered_functions().map(|f| f.name).collect();
    names.sort_unstable();
    names
}

/// Check whether a name (or alias) is registered, case-insensitively.
pub fn is_supported(name: &str) -> bool {
    find_function(name).is_some()
}

/// Category → sorted canonical names, in category listing order.
pub fn function_categories() -> BTreeMap<&'static str, Vec<&'static str>> {
    let mut categories = BTreeMap::new();
    for category in FunctionCategory::all() {
        let mut names: Vec<&'static str> = functions_in_category(category)
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort_unstable();
        categories.insert(category.label(), names);
    }
    categories
}

/// Metadata for one function (or alias), if registered.
pub fn function_info(name: &str) -> Option<FunctionInfo> {
    find_function(name).map(FunctionInfo::from)
}

/// Validate the minimal arity precondition for a call.
///
/// Every registered function requires at least one argument; filter-style
/// functions take exactly a data vector plus at most one numeric
/// parameter. Full arity checking happens in the handlers themselves.
pub fn validate_usage(name: &str, arg_count: usize) -> Result<(), ExprError> {
    let def = find_function(name).ok_or_else(|| ExprError::UnsupportedFunction {
        names: vec![name.to_string()],
        supported: supported_function_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
    })?;

    if arg_count < def.min_args {
        return Err(ExprError::runtime(format!(
            "{} requires at least {} argument{}",
            def.name,
            def.min_args,
            if def.min_args == 1 { "" } else { "s" }
        )));
    }

    if def.category == FunctionCategory::Filter && arg_count > 2 {
        return Err(ExprError::runtime(format!(
            "{} takes a data vector plus at most one numeric parameter",
            def.name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_names_are_sorted_and_complete() {
        let names = supported_function_names();
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        // 10 math + 9 statistical + 5 transform + 4 filter
        assert_eq!(names.len(), 28);
        assert!(names.contains(&"sin"));
        assert!(names.contains(&"quantile"));
        assert!(names.contains(&"moving_average"));
    }

    #[test]
    fn test_every_supported_name_has_info_with_category() {
        for name in supported_function_names() {
            let info = function_info(name).expect("registered name must have info");
            assert!(!info.category.is_empty());
            assert!(!info.documentation.is_empty());
        }
    }

    #[test]
    fn test_categories_partition_the_registry() {
        let categories = function_categories();
        assert_eq!(categories.len(), 4);
        let total: usize = categories.values().map(|v| v.len()).sum();
        assert_eq!(total, supported_function_names().len());
    }

    #[test]
    fn test_validate_usage() {
        assert!(validate_usage("mean", 1).is_ok());
        assert!(validate_usage("mean", 0).is_err());
        assert!(validate_usage("moving_average", 2).is_ok());
        assert!(validate_usage("moving_average", 3).is_err());
        assert!(matches!(
            validate_usage("nope", 1),
            Err(ExprError::UnsupportedFunction { .. })
        ));
    }

    #[test]
    fn test_alias_lookup_in_info() {
        let info = function_info("avg").expect("avg alias resolves");
        assert_eq!(info.name, "mean");
        assert_eq!(info.category, "statistical");
    }
}
