//! GFSLang compiler: lowers a parsed [`Feature`] into GFS statements.
//!
//! Entry point: [`Compiler::compile`].
//!
//! The GFS operator set has no subtraction or division, so those are
//! rewritten here:
//! - `a - k` → `ADD[a, -k]`, `a - b` → `ADD[a, MULTIPLY[b, -1]]`
//! - `a / k` → `MULTIPLY[a, 1/k]`, `a // k` → `FLOOR[MULTIPLY[a, 1/k]]`
//! - `-a` → `MULTIPLY[a, -1]`
//!
//! Divisors must be non-zero constants. Sub-expressions whose operands are
//! all constant are folded.
//!
//! Error codes emitted:
//! - E200: undefined macro
//! - E201: duplicate functional macro argument
//! - E202: macro arity mismatch
//! - E203: macro expansion too deep
//! - E300: division by zero
//! - E301: division by a dynamic expression
//! - E302: constant folding produced NaN or infinity
//! - E400: undefined function
//! - E401: wrong argument count
//! - E501: compiled tree deeper than [`MAX_TREE_DEPTH`]
//! - E502: macro expansion past [`MAX_TREE_NODES`]

use std::collections::HashSet;

use gfs_types::ast::*;
use gfs_types::gfs::{Expression, Statement, StatementOperator, MAX_TREE_DEPTH};
use gfs_types::{CompileErrors, ErrorCode, GfslError, SourceFile, Span};
use tracing::debug;

use crate::env::MacroEnv;

/// Maximum number of nested functional macro expansions.
pub const MAX_MACRO_EXPANSION_DEPTH: usize = 32;

/// Node budget for one rule or static macro definition, counting every
/// source node compiled and every node copied out of a macro binding.
pub const MAX_TREE_NODES: usize = 100_000;

/// Built-in functions callable from GFSLang.
const FUNCTIONS: &[&str] = &["min", "max", "floor"];

// ══════════════════════════════════════════════════════════════════════════════
// Compiler
// ══════════════════════════════════════════════════════════════════════════════

/// Walks a parsed [`Feature`] and emits one [`Statement`] per rule.
pub struct Compiler<'a> {
    env: MacroEnv,
    errors: &'a mut CompileErrors,
    source: &'a SourceFile,
    /// Nodes charged against [`MAX_TREE_NODES`] by the current item.
    nodes: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(errors: &'a mut CompileErrors, source: &'a SourceFile) -> Self {
        Self {
            env: MacroEnv::new(),
            errors,
            source,
            nodes: 0,
        }
    }

    /// Compile every item in source order.
    ///
    /// A rule that fails to compile is reported and skipped; compilation
    /// continues with the next item until the error cap is reached.
    pub fn compile(&mut self, feature: &Feature) -> Vec<Statement> {
        let mut out = Vec::new();
        for item in &feature.items {
            if self.errors.is_full() {
                break;
            }
            match item {
                Item::MacroDef(def) if def.is_functional() => self.define_functional_macro(def),
                Item::MacroDef(def) => self.define_static_macro(def),
                Item::Rule(rule) => match self.compile_rule(rule) {
                    Ok(statement) => out.push(statement),
                    Err(err) => self.errors.push_error(err),
                },
            }
        }
        out
    }

    // ══════════════════════════════════════════════════════════════════════
    // Items
    // ══════════════════════════════════════════════════════════════════════

    fn define_static_macro(&mut self, def: &MacroDef) {
        self.nodes = 0;
        let value = self
            .compile_expr(&def.body)
            .and_then(|value| self.check_depth(value, def.body.span));
        match value {
            Ok(value) => {
                debug!(name = %def.name.name, "defined static macro");
                self.env.define_static(&def.name.name, value);
            }
            Err(err) => {
                self.errors.push_error(err);
                self.env.poison(&def.name.name);
            }
        }
    }

    fn define_functional_macro(&mut self, def: &MacroDef) {
        let params = def.params.as_deref().unwrap_or_default();
        let mut seen = HashSet::new();
        for param in params {
            if !seen.insert(param.name.as_str()) {
                let err = self.error(
                    ErrorCode::DUPLICATE_MACRO_ARGUMENT,
                    format!(
                        "Argument '{}' appears more than once in !{}(); argument names must be unique",
                        param.name, def.name.name
                    ),
                    param.span,
                );
                self.errors.push_error(err);
                return;
            }
        }
        debug!(name = %def.name.name, arity = params.len(), "defined functional macro");
        self.env.define_function(def.clone());
    }

    fn compile_rule(&mut self, rule: &Rule) -> gfs_types::Result<Statement> {
        let operator = match rule.op {
            RuleOp::Set => StatementOperator::Set,
            RuleOp::Push => StatementOperator::Push,
        };
        self.nodes = 0;
        let operand = self.compile_expr(&rule.value)?;
        let operand = self.check_depth(operand, rule.value.span)?;
        let target = rule.target.to_string();
        debug!(path = %target, precedence = rule.precedence, %operator, "compiled rule");
        Ok(Statement::new(rule.precedence, target, operator, operand))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn compile_expr(&mut self, expr: &Expr) -> gfs_types::Result<Expression> {
        self.charge(1, expr.span)?;
        match &expr.kind {
            ExprKind::NumberLit(n) => self.constant(*n, expr.span),
            ExprKind::Path(path) => Ok(Expression::dynamic(path.to_string())),
            ExprKind::Paren(inner) => self.compile_expr(inner),
            ExprKind::Neg(inner) => {
                let value = self.compile_expr(inner)?;
                match value.as_static() {
                    Some(k) => self.constant(-k, expr.span),
                    None => Ok(Expression::Multiply(vec![
                        value,
                        Expression::StaticValue(-1.0),
                    ])),
                }
            }
            ExprKind::Binary { left, op, right } => self.compile_binary(left, *op, right, expr.span),
            ExprKind::Call { name, args } => self.compile_call(name, args, expr.span),
            ExprKind::Macro(name) => self.compile_macro(name),
            ExprKind::MacroCall { name, args } => self.compile_macro_call(name, args, expr.span),
        }
    }

    fn compile_binary(
        &mut self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        span: Span,
    ) -> gfs_types::Result<Expression> {
        let lhs = self.compile_expr(left)?;
        let rhs = self.compile_expr(right)?;

        // ── Both sides constant: evaluate now ──
        if let (Some(a), Some(b)) = (lhs.as_static(), rhs.as_static()) {
            let value = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div | BinOp::FloorDiv if b == 0.0 => {
                    return Err(self.division_by_zero(op, right.span))
                }
                BinOp::Div => a / b,
                BinOp::FloorDiv => (a / b).floor(),
            };
            return self.constant(value, span);
        }

        match op {
            BinOp::Add if is_constant(&rhs, 0.0) => Ok(lhs),
            BinOp::Add if is_constant(&lhs, 0.0) => Ok(rhs),
            BinOp::Add => Ok(Expression::Add(vec![lhs, rhs])),

            BinOp::Sub => match rhs.as_static() {
                Some(k) if k == 0.0 => Ok(lhs),
                Some(k) => Ok(Expression::Add(vec![lhs, Expression::StaticValue(-k)])),
                None => Ok(Expression::Add(vec![
                    lhs,
                    Expression::Multiply(vec![rhs, Expression::StaticValue(-1.0)]),
                ])),
            },

            BinOp::Mul if is_constant(&lhs, 0.0) || is_constant(&rhs, 0.0) => {
                Ok(Expression::StaticValue(0.0))
            }
            BinOp::Mul if is_constant(&rhs, 1.0) => Ok(lhs),
            BinOp::Mul if is_constant(&lhs, 1.0) => Ok(rhs),
            BinOp::Mul => Ok(Expression::Multiply(vec![lhs, rhs])),

            BinOp::Div | BinOp::FloorDiv => {
                let Some(k) = rhs.as_static() else {
                    return Err(self.error(
                        ErrorCode::DYNAMIC_DIVISOR,
                        format!(
                            "Cannot divide by a dynamic expression with '{}'; divisors must be constant",
                            op.as_str()
                        ),
                        right.span,
                    ));
                };
                if k == 0.0 {
                    return Err(self.division_by_zero(op, right.span));
                }
                let scaled = if k == 1.0 {
                    lhs
                } else {
                    let reciprocal = self.constant(1.0 / k, right.span)?;
                    Expression::Multiply(vec![lhs, reciprocal])
                };
                Ok(match op {
                    BinOp::FloorDiv => Expression::floor(scaled),
                    _ => scaled,
                })
            }
        }
    }

    fn compile_call(
        &mut self,
        name: &Ident,
        args: &[Expr],
        span: Span,
    ) -> gfs_types::Result<Expression> {
        if !FUNCTIONS.contains(&name.name.as_str()) {
            return Err(self
                .error(
                    ErrorCode::UNDEFINED_FUNCTION,
                    format!("Function {}() is not defined", name.name),
                    name.span,
                )
                .with_suggestion(format!("available functions: {}", FUNCTIONS.join(", "))));
        }

        let arity_ok = match name.name.as_str() {
            "floor" => args.len() == 1,
            _ => !args.is_empty(),
        };
        if !arity_ok {
            let expected = if name.name == "floor" {
                "exactly 1 argument"
            } else {
                "at least 1 argument"
            };
            return Err(self.error(
                ErrorCode::WRONG_ARG_COUNT,
                format!("{}() takes {expected}, got {}", name.name, args.len()),
                span,
            ));
        }

        let mut operands = Vec::with_capacity(args.len());
        for arg in args {
            operands.push(self.compile_expr(arg)?);
        }

        let constants: Option<Vec<f64>> = operands.iter().map(Expression::as_static).collect();
        if let Some(values) = constants {
            let folded = match name.name.as_str() {
                "floor" => values[0].floor(),
                "min" => values.iter().copied().fold(f64::INFINITY, f64::min),
                _ => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            };
            return self.constant(folded, span);
        }

        Ok(match name.name.as_str() {
            "floor" => Expression::floor(operands.swap_remove(0)),
            "min" => Expression::Min(operands),
            _ => Expression::Max(operands),
        })
    }

    // ══════════════════════════════════════════════════════════════════════
    // Macros
    // ══════════════════════════════════════════════════════════════════════

    fn compile_macro(&mut self, name: &Ident) -> gfs_types::Result<Expression> {
        if let Some(value) = self.env.lookup(&name.name).cloned() {
            self.charge(value.size(), name.span)?;
            return Ok(value);
        }
        let err = self.error(
            ErrorCode::UNDEFINED_MACRO,
            format!("Macro !{} is not defined", name.name),
            name.span,
        );
        Err(if self.env.is_poisoned(&name.name) {
            err.with_suggestion(format!("the definition of !{} failed to compile", name.name))
        } else if self.env.function(&name.name).is_some() {
            err.with_suggestion(format!("!{0} is a functional macro; call it as !{0}(...)", name.name))
        } else {
            err
        })
    }

    fn compile_macro_call(
        &mut self,
        name: &Ident,
        args: &[Expr],
        span: Span,
    ) -> gfs_types::Result<Expression> {
        let Some(def) = self.env.function(&name.name).cloned() else {
            let err = self.error(
                ErrorCode::UNDEFINED_MACRO,
                format!("Macro !{}() is not defined", name.name),
                name.span,
            );
            return Err(if self.env.lookup(&name.name).is_some() {
                err.with_suggestion(format!("!{} is a static macro; use it without arguments", name.name))
            } else {
                err
            });
        };

        // Arguments are compiled in the caller's scope.
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.compile_expr(arg)?);
        }

        let params = def.params.as_deref().unwrap_or_default();
        if params.len() != values.len() {
            return Err(self.error(
                ErrorCode::MACRO_ARITY_MISMATCH,
                format!(
                    "Incorrect number of arguments passed to !{}(): expected {}, got {}",
                    name.name,
                    params.len(),
                    values.len()
                ),
                span,
            ));
        }

        if self.env.expansion_depth() >= MAX_MACRO_EXPANSION_DEPTH {
            return Err(self.error(
                ErrorCode::MACRO_EXPANSION_TOO_DEEP,
                format!(
                    "Expanding !{}() exceeds the maximum macro nesting depth of {MAX_MACRO_EXPANSION_DEPTH}",
                    name.name
                ),
                span,
            ));
        }

        self.env.push_scope(
            params
                .iter()
                .map(|p| p.name.clone())
                .zip(values),
        );
        let result = self.compile_expr(&def.body);
        self.env.pop_scope();
        result
    }

    // ══════════════════════════════════════════════════════════════════════
    // Helpers
    // ══════════════════════════════════════════════════════════════════════

    /// Count `count` more nodes against [`MAX_TREE_NODES`].
    fn charge(&mut self, count: usize, span: Span) -> gfs_types::Result<()> {
        self.nodes += count;
        if self.nodes > MAX_TREE_NODES {
            return Err(self.error(
                ErrorCode::TREE_TOO_LARGE,
                format!("Macro expansion produces more than {MAX_TREE_NODES} nodes"),
                span,
            ));
        }
        Ok(())
    }

    /// Reject trees deeper than [`MAX_TREE_DEPTH`].
    fn check_depth(&self, value: Expression, span: Span) -> gfs_types::Result<Expression> {
        let depth = value.depth();
        if depth > MAX_TREE_DEPTH {
            return Err(self.error(
                ErrorCode::TREE_TOO_DEEP,
                format!("Expression compiles to a tree {depth} levels deep; the limit is {MAX_TREE_DEPTH}"),
                span,
            ));
        }
        Ok(value)
    }

    /// A `STATIC_VALUE` node, rejecting NaN and infinities.
    fn constant(&self, value: f64, span: Span) -> gfs_types::Result<Expression> {
        if value.is_finite() {
            Ok(Expression::StaticValue(value))
        } else {
            Err(self.error(
                ErrorCode::NON_FINITE_CONSTANT,
                format!("Constant expression evaluates to {value}"),
                span,
            ))
        }
    }

    fn division_by_zero(&self, op: BinOp, span: Span) -> GfslError {
        self.error(
            ErrorCode::DIVISION_BY_ZERO,
            format!("Cannot divide by zero with '{}'", op.as_str()),
            span,
        )
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> GfslError {
        let source_line = self.source.line(span.line).unwrap_or("");
        GfslError::new(&self.source.name, code, message, span, source_line)
    }
}

fn is_constant(expr: &Expression, value: f64) -> bool {
    expr.as_static() == Some(value)
}
