/*!
# Expression Abstract Syntax Tree

AST node definitions for user-submitted mathematical expressions. The node
set is deliberately closed - literal, identifier, binary operation, unary
operation, and function call - so the capability surface of an expression
is statically enumerable. There is no control flow, no indexing, no
attribute access, and no way to reference anything outside the evaluation
namespace assembled by the sandbox.

The AST is:
- **Immutable**: nodes are never rewritten after parsing
- **Composable**: complex formulas are built from the five node kinds
- **Type-safe**: all numeric values are `f64`
*/

use std::collections::{BTreeMap, BTreeSet};

/// A single node of a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// Numeric literal
    Number(f64),
    /// Free identifier: a data variable or a reserved constant
    Identifier(String),
    /// Binary operation: `expr op expr`
    BinaryOp {
        left: Box<ExprNode>,
        op: BinaryOperator,
        right: Box<ExprNode>,
    },
    /// Unary operation: `op expr`
    UnaryOp {
        op: UnaryOperator,
        expr: Box<ExprNode>,
    },
    /// Function call: `name(args...)`
    Call { name: String, args: Vec<ExprNode> },
}

/// Binary operators supported in expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// Exponentiation; written `^` or `**`
    Power,
}

/// Unary operators supported in expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

/// A parsed, validated expression together with the metadata the binder and
/// evaluator need.
///
/// Produced by [`ExpressionParser::parse`](super::parser::ExpressionParser::parse)
/// and immutable thereafter. Every name in `functions_used` is guaranteed to
/// exist in the function registry (canonical form), and `variables` excludes
/// reserved constants and registry names.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// The original expression text as submitted
    pub raw_text: String,
    /// Root of the parsed syntax tree
    pub ast: ExprNode,
    /// Free variable names, sorted and deduplicated
    pub variables: Vec<String>,
    /// Canonical registry names of every function the expression calls
    pub functions_used: BTreeSet<String>,
    /// Numeric literals recorded positionally as `const_0`, `const_1`, ...
    /// Informational only - never used for binding.
    pub parameters: BTreeMap<String, f64>,
}

impl ExprNode {
    /// Walk the tree in pre-order, invoking `visit` on every node.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ExprNode)) {
        visit(self);
        match self {
            ExprNode::BinaryOp { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            ExprNode::UnaryOp { expr, .. } => expr.walk(visit),
            ExprNode::Call { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            ExprNode::Number(_) | ExprNode::Identifier(_) => {}
        }
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }
}

impl BinaryOperator {
    /// Operator symbol as written in expression text.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ExprNode {
        // sin(x) + 2
        ExprNode::BinaryOp {
            left: Box::new(ExprNode::Call {
                name: "sin".to_string(),
                args: vec![ExprNode::Identifier("x".to_string())],
            }),
            op: BinaryOperator::Add,
            right: Box::new(ExprNode::Number(2.0)),
        }
    }

    #[test]
    fn test_walk_visits_all_nodes() {
        let tree = sample_tree();
        let mut names = Vec::new();
        tree.walk(&mut |node| {
            if let ExprNode::Identifier(name) = node {
                names.push(name.clone());
            }
        });
        assert_eq!(names, vec!["x"]);
        assert_eq!(tree.node_count(), 4);
    }
}
