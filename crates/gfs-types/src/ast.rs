//! AST node types for GFSLang source.
//!
//! This is the parser's output: it still contains macro definitions,
//! macro references, and the full set of infix operators. The compiler
//! lowers it into the [`crate::gfs`] statement tree.

use crate::Span;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// One GFSLang source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Macro definitions and rules in source order.
    pub items: Vec<Item>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `!name = expr` or `!name(a, b) = expr`
    MacroDef(MacroDef),
    /// `0.5: target = expr`
    Rule(Rule),
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Macros
// ══════════════════════════════════════════════════════════════════════════════

/// A macro definition.
///
/// `params` is `None` for a static macro (`!half = 0.5`) and `Some` for a
/// functional macro (`!mod(score) = ...`), even when the list is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDef {
    pub name: Ident,
    pub params: Option<Vec<Ident>>,
    pub body: Expr,
    pub span: Span,
}

impl MacroDef {
    pub fn is_functional(&self) -> bool {
        self.params.is_some()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Rules
// ══════════════════════════════════════════════════════════════════════════════

/// `precedence: target op expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub precedence: f64,
    pub target: Path,
    pub op: RuleOp,
    pub value: Expr,
    pub span: Span,
}

/// The assignment operator of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOp {
    /// `=`
    Set,
    /// `++`
    Push,
}

impl RuleOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOp::Set => "=",
            RuleOp::Push => "++",
        }
    }
}

/// A dotted attribute path: `attributes.${statName}.modifier`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub segments: Vec<PathSegment>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `dexterity`
    Name(String),
    /// `${statName}`, kept verbatim for the host to substitute.
    Template(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Name(name) => write!(f, "{name}"),
            PathSegment::Template(name) => write!(f, "${{{name}}}"),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `15`, `0.5`
    NumberLit(f64),
    /// `attributes.dexterity.value`
    Path(Path),
    /// `a + b`, `a // b`, ...
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `-x`
    Neg(Box<Expr>),
    /// `max(a, b)`
    Call { name: Ident, args: Vec<Expr> },
    /// `!half`
    Macro(Ident),
    /// `!mod(score)`
    MacroCall { name: Ident, args: Vec<Expr> },
    /// `(expr)`
    Paren(Box<Expr>),
}

/// Binary operators (in precedence order, lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `//`, floor division
    FloorDiv,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
        }
    }
}
