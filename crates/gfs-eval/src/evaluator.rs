//! Expression evaluator and statement executor.

use gfs_types::gfs::{
    Expression, ExpressionOperator, Statement, StatementOperator, MAX_TREE_DEPTH,
};
use tracing::trace;

use crate::error::{EvalError, EvalResult};
use crate::store::AttributeStore;

/// Default limit on expression nesting; every compiled tree fits within it.
pub const DEFAULT_MAX_DEPTH: usize = MAX_TREE_DEPTH;

/// Walks GFS expression trees against an [`AttributeStore`].
///
/// Evaluation only reads the store; [`Evaluator::execute`] is the single
/// place a statement writes back.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    max_depth: usize,
}

impl Evaluator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a finite number.
    pub fn evaluate<S>(&self, expr: &Expression, store: &S) -> EvalResult<f64>
    where
        S: AttributeStore + ?Sized,
    {
        self.eval_expr(expr, store, 1)
    }

    fn eval_expr<S>(&self, expr: &Expression, store: &S, depth: usize) -> EvalResult<f64>
    where
        S: AttributeStore + ?Sized,
    {
        if depth > self.max_depth {
            return Err(EvalError::DepthExceeded {
                max: self.max_depth,
            });
        }

        let value = match expr {
            Expression::StaticValue(v) => *v,
            Expression::DynamicValue(path) => store.get(path)?,
            Expression::Add(ops) => self
                .eval_operands(ops, store, depth)?
                .into_iter()
                .fold(0.0, |acc, v| acc + v),
            Expression::Multiply(ops) => self
                .eval_operands(ops, store, depth)?
                .into_iter()
                .fold(1.0, |acc, v| acc * v),
            Expression::Min(ops) => {
                let values = self.eval_operands(ops, store, depth)?;
                extremum(ExpressionOperator::Min, values, f64::min)?
            }
            Expression::Max(ops) => {
                let values = self.eval_operands(ops, store, depth)?;
                extremum(ExpressionOperator::Max, values, f64::max)?
            }
            Expression::Floor(inner) => self.eval_expr(inner, store, depth + 1)?.floor(),
        };

        if !value.is_finite() {
            return Err(EvalError::ArithmeticTrap(format!(
                "{} produced {value}",
                expr.operator()
            )));
        }
        Ok(value)
    }

    /// Every operand is evaluated before combining; there is no short-circuit.
    fn eval_operands<S>(&self, ops: &[Expression], store: &S, depth: usize) -> EvalResult<Vec<f64>>
    where
        S: AttributeStore + ?Sized,
    {
        ops.iter()
            .map(|op| self.eval_expr(op, store, depth + 1))
            .collect()
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statement execution
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate the operand and write it to the statement's target.
    /// Returns the value written.
    pub fn execute<S>(&self, statement: &Statement, store: &mut S) -> EvalResult<f64>
    where
        S: AttributeStore + ?Sized,
    {
        let value = self.evaluate(&statement.operand, &*store)?;
        match statement.operator {
            StatementOperator::Set => store.set(&statement.target, value)?,
            StatementOperator::Push => store.push(&statement.target, value)?,
        }
        trace!(path = %statement.target, operator = %statement.operator, value, "wrote attribute");
        Ok(value)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

fn extremum(
    operator: ExpressionOperator,
    values: Vec<f64>,
    pick: fn(f64, f64) -> f64,
) -> EvalResult<f64> {
    values
        .into_iter()
        .reduce(pick)
        .ok_or(EvalError::EmptyOperands { operator })
}

/// Evaluate `expr` with the default depth limit.
pub fn evaluate<S>(expr: &Expression, store: &S) -> EvalResult<f64>
where
    S: AttributeStore + ?Sized,
{
    Evaluator::default().evaluate(expr, store)
}

/// Execute `statement` with the default depth limit.
pub fn execute<S>(statement: &Statement, store: &mut S) -> EvalResult<f64>
where
    S: AttributeStore + ?Sized,
{
    Evaluator::default().execute(statement, store)
}
