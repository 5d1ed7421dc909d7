/*!
# Sandboxed Evaluation

Interprets a parsed expression against a capability-limited namespace under
a wall-clock deadline. The namespace is assembled per evaluation by merging,
in this precedence (later overrides earlier):

1. a minimal allowlist of safe primitive operations (absolute value,
   rounding, min/max, length)
2. every function registry entry
3. the fixed numeric constants (`pi`, `e`, `inf`, `nan`)
4. the caller-supplied data bindings

Nothing else is visible during evaluation - no code loading, no I/O, no
introspection. Any identifier outside the merged namespace is an execution
failure, never a crash.

The deadline is enforced cooperatively: the interpreter counts nodes and
checks the clock periodically inside its step loop, and a final wall-clock
check brackets the whole call. Registered functions are themselves bounded
in the size of their inputs, so overshoot past the deadline is bounded too.
This is the portable strategy - no signals, no alarm, nothing
platform-specific. No error or panic ever propagates past
[`SandboxedEvaluator::evaluate`]; every failure becomes an error
[`ExecutionResult`].
*/

use super::binder::DataBinding;
use super::coercer;
use super::types::{ExecutionResult, Value};
use crate::datacharts::expr::ast::{ExprNode, Expression, UnaryOperator};
use crate::datacharts::expr::error::ExprError;
use crate::datacharts::expr::functions::{self, FunctionDef};
use crate::datacharts::expr::parser::safety::{self, SafetyReport};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How many interpreter steps run between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

/// Resource limits for one evaluation.
#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    /// Wall-clock deadline for a single evaluation.
    pub max_execution_time: Duration,
    /// Advisory memory budget reported by the environment info surface;
    /// not enforced in-process.
    pub max_memory_mb: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        ExecutionLimits {
            max_execution_time: Duration::from_secs(30),
            max_memory_mb: 256,
        }
    }
}

impl ExecutionLimits {
    pub fn with_max_execution_time(mut self, limit: Duration) -> Self {
        self.max_execution_time = limit;
        self
    }
}

/// One entry of the merged evaluation namespace.
enum NamespaceEntry {
    Constant(f64),
    Function(&'static FunctionDef),
    Data(Vec<f64>),
}

/// Executes parsed expressions in a restricted namespace under a deadline.
///
/// Stateless across calls apart from the shared immutable function
/// registry; one evaluator may serve concurrent callers, each call on its
/// own worker if isolation from slow expressions is needed.
#[derive(Debug, Clone, Default)]
pub struct SandboxedEvaluator {
    limits: ExecutionLimits,
}

impl SandboxedEvaluator {
    pub fn new() -> Self {
        SandboxedEvaluator {
            limits: ExecutionLimits::default(),
        }
    }

    pub fn with_limits(limits: ExecutionLimits) -> Self {
        SandboxedEvaluator { limits }
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    /// Evaluate an expression against bound data, returning a fully shaped
    /// [`ExecutionResult`]. Never panics and never returns an `Err` - all
    /// failures are folded into the result.
    pub fn evaluate(&self, expression: &Expression, binding: &DataBinding) -> ExecutionResult {
        let started = Instant::now();

        let outcome = self.evaluate_value(expression, binding);
        let elapsed = started.elapsed();

        // Best-effort bracket: a call that returns after the deadline is
        // still a timeout, even though it could not be interrupted.
        let outcome = if elapsed >= self.limits.max_execution_time {
            Err(self.timeout_error())
        } else {
            outcome
        };

        match outcome {
            Ok(value) => {
                let coerced = coercer::coerce(value, binding.row_count());
                ExecutionResult::success(coerced, elapsed.as_secs_f64())
            }
            Err(error) => {
                if matches!(error, ExprError::Timeout { .. }) {
                    log::warn!(
                        "expression evaluation timed out after {:?}",
                        self.limits.max_execution_time
                    );
                }
                ExecutionResult::failure(&error, elapsed.as_secs_f64())
            }
        }
    }

    /// Evaluate to a raw runtime [`Value`]. Exposed for callers that
    /// compose their own result shaping; `evaluate` is the boundary that
    /// never fails.
    pub fn evaluate_value(
        &self,
        expression: &Expression,
        binding: &DataBinding,
    ) -> Result<Value, ExprError> {
        let namespace = self.build_namespace(binding);
        let mut context = EvalContext {
            namespace,
            // An unrepresentable deadline means effectively unbounded; the
            // bracketing check in `evaluate` still applies.
            deadline: Instant::now().checked_add(self.limits.max_execution_time),
            limit_secs: self.limits.max_execution_time.as_secs_f64(),
            steps: 0,
        };
        context.eval(&expression.ast)
    }

    /// Advisory safety scan; see [`safety::validate_expression_safety`].
    pub fn validate_expression_safety(&self, text: &str) -> SafetyReport {
        safety::validate_expression_safety(text)
    }

    /// Assemble the merged namespace for one evaluation.
    fn build_namespace(&self, binding: &DataBinding) -> HashMap<String, NamespaceEntry> {
        let mut namespace = HashMap::new();

        // (1) Safe primitive allowlist. These are registry handlers too;
        // the layer exists so the primitive names stay available even for
        // ASTs that never went through parser canonicalization.
        for (name, target) in [
            ("abs", "abs"),
            ("round", "round"),
            ("min", "min"),
            ("max", "max"),
            ("len", "count"),
        ] {
            if let Some(def) = functions::find_function(target) {
                namespace.insert(name.to_string(), NamespaceEntry::Function(def));
            }
        }

        // (2) Every registry entry, by canonical name.
        for def in functions::all_registered_functions() {
            namespace.insert(def.name.to_string(), NamespaceEntry::Function(def));
        }

        // (3) Fixed constants.
        namespace.insert("pi".to_string(), NamespaceEntry::Constant(std::f64::consts::PI));
        namespace.insert("e".to_string(), NamespaceEntry::Constant(std::f64::consts::E));
        namespace.insert("inf".to_string(), NamespaceEntry::Constant(f64::INFINITY));
        namespace.insert("nan".to_string(), NamespaceEntry::Constant(f64::NAN));

        // (4) Caller-supplied data bindings override everything.
        for name in binding.variable_names() {
            if let Some(values) = binding.get(name) {
                namespace.insert(name.to_string(), NamespaceEntry::Data(values.to_vec()));
            }
        }

        namespace
    }

    fn timeout_error(&self) -> ExprError {
        ExprError::Timeout {
            limit_secs: self.limits.max_execution_time.as_secs_f64(),
        }
    }
}

/// Per-evaluation interpreter state: the merged namespace plus deadline
/// accounting.
struct EvalContext {
    namespace: HashMap<String, NamespaceEntry>,
    deadline: Option<Instant>,
    limit_secs: f64,
    steps: u64,
}

impl EvalContext {
    /// Count an interpreter step, checking the deadline periodically.
    fn tick(&mut self) -> Result<(), ExprError> {
        self.steps += 1;
        if self.steps % DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(ExprError::Timeout {
                        limit_secs: self.limit_secs,
                    });
                }
            }
        }
        Ok(())
    }

    fn eval(&mut self, node: &ExprNode) -> Result<Value, ExprError> {
        self.tick()?;

        match node {
            ExprNode::Number(n) => Ok(Value::Scalar(*n)),

            ExprNode::Identifier(name) => match self.namespace.get(name) {
                Some(NamespaceEntry::Constant(c)) => Ok(Value::Scalar(*c)),
                Some(NamespaceEntry::Data(values)) => Ok(Value::Vector(values.clone())),
                Some(NamespaceEntry::Function(def)) => Err(ExprError::runtime(format!(
                    "function '{}' used as a value; call it with arguments",
                    def.name
                ))),
                None => Err(ExprError::unresolved(name)),
            },

            ExprNode::BinaryOp { left, op, right } => {
                let left_val = self.eval(left)?;
                let right_val = self.eval(right)?;
                left_val.binary_op(*op, &right_val)
            }

            ExprNode::UnaryOp { op, expr } => {
                let value = self.eval(expr)?;
                Ok(match op {
                    UnaryOperator::Plus => value,
                    UnaryOperator::Minus => value.negate(),
                })
            }

            ExprNode::Call { name, args } => {
                let def = match self.namespace.get(name) {
                    Some(NamespaceEntry::Function(def)) => *def,
                    Some(_) => {
                        return Err(ExprError::runtime(format!("'{}' is not callable", name)));
                    }
                    None => {
                        // Yields UnsupportedFunction with the registry
                        // listing, or confirms a registry/namespace skew
                        // that cannot normally happen.
                        functions::validate_usage(name, args.len())?;
                        return Err(ExprError::unresolved(name));
                    }
                };

                functions::validate_usage(def.name, args.len())?;

                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                (def.handler)(&values)
            }
        }
    }
}
