//! Expression parsing with operator precedence.
//!
//! Precedence (lowest → highest):
//! 3. `+`, `-`
//! 2. `*`, `/`, `//`
//! 1. unary `-`

use gfs_lexer::token::TokenKind;
use gfs_types::ast::*;
use gfs_types::ErrorCode;

use crate::parser::{Parser, MAX_EXPR_DEPTH};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_nested(Self::parse_additive)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `Additive = Term { ("+" | "-") Term }`
    fn parse_additive(&mut self) -> Option<Expr> {
        self.parse_chain(additive_op, Self::parse_term)
    }

    /// `Term = Unary { ("*" | "/" | "//") Unary }`
    fn parse_term(&mut self) -> Option<Expr> {
        self.parse_chain(multiplicative_op, Self::parse_unary)
    }

    /// Left-associative `operand { op operand }`.
    ///
    /// Every link wraps the tree built so far one level deeper, so each one
    /// counts against [`MAX_EXPR_DEPTH`] like an explicit parenthesis.
    fn parse_chain(
        &mut self,
        operator: fn(&TokenKind) -> Option<BinOp>,
        operand: fn(&mut Self) -> Option<Expr>,
    ) -> Option<Expr> {
        let outer = self.expr_depth;
        let result = self.parse_links(operator, operand);
        self.expr_depth = outer;
        result
    }

    fn parse_links(
        &mut self,
        operator: fn(&TokenKind) -> Option<BinOp>,
        operand: fn(&mut Self) -> Option<Expr>,
    ) -> Option<Expr> {
        let mut left = operand(self)?;
        while let Some(op) = operator(self.peek_kind()) {
            self.advance();
            if !self.deepen() {
                return None;
            }
            let right = operand(self)?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `Unary = "-" Unary | Primary`
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        if self.eat(&TokenKind::Minus) {
            // `- - - x` nests, so it counts against the depth limit.
            let operand = self.parse_nested(Self::parse_unary)?;
            let span = start.merge(operand.span);
            return Some(Expr::new(ExprKind::Neg(Box::new(operand)), span));
        }
        self.parse_primary()
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::NumberLit(n) => {
                self.advance();
                Some(Expr::new(ExprKind::NumberLit(n), start))
            }

            // ── Calls: `max(a, b)` ──────────────────────────────────────
            TokenKind::Identifier(_) if self.look_ahead(1) == &TokenKind::LParen => {
                let name = self.expect_identifier()?;
                self.advance(); // eat `(`
                let args = self.parse_arg_list()?;
                self.expect(&TokenKind::RParen)?;
                let span = start.merge(self.previous_span());
                Some(Expr::new(ExprKind::Call { name, args }, span))
            }

            // ── Attribute paths ─────────────────────────────────────────
            TokenKind::Identifier(_) | TokenKind::Template(_) => {
                let path = self.parse_path()?;
                let span = path.span;
                Some(Expr::new(ExprKind::Path(path), span))
            }

            // ── Macros: `!name` / `!name(args)` ─────────────────────────
            TokenKind::Bang => {
                self.advance();
                let name = self.expect_identifier()?;
                if self.eat(&TokenKind::LParen) {
                    let args = self.parse_arg_list()?;
                    self.expect(&TokenKind::RParen)?;
                    let span = start.merge(self.previous_span());
                    Some(Expr::new(ExprKind::MacroCall { name, args }, span))
                } else {
                    let span = start.merge(name.span);
                    Some(Expr::new(ExprKind::Macro(name), span))
                }
            }

            // ── Grouping ────────────────────────────────────────────────
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                let span = start.merge(self.previous_span());
                Some(Expr::new(ExprKind::Paren(Box::new(inner)), span))
            }

            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected expression, got '{other}'"),
                );
                None
            }
        }
    }

    /// `ArgList = [ Expr { "," Expr } ]` (the closing `)` is left in place)
    fn parse_arg_list(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check_exact(&TokenKind::RParen) {
            return Some(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(args)
    }

    /// Run `f` one nesting level deeper, enforcing [`MAX_EXPR_DEPTH`].
    fn parse_nested(&mut self, f: fn(&mut Self) -> Option<Expr>) -> Option<Expr> {
        let outer = self.expr_depth;
        let result = if self.deepen() { f(self) } else { None };
        self.expr_depth = outer;
        result
    }

    /// Enter one more nesting level; reports E500 past the limit.
    fn deepen(&mut self) -> bool {
        self.expr_depth += 1;
        if self.expr_depth > MAX_EXPR_DEPTH {
            self.error_at_current(
                ErrorCode::STRUCTURAL_LIMIT_EXCEEDED,
                format!("maximum expression nesting depth is {MAX_EXPR_DEPTH}"),
            );
            return false;
        }
        true
    }
}

fn additive_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        _ => None,
    }
}

fn multiplicative_op(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Star => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        TokenKind::SlashSlash => Some(BinOp::FloorDiv),
        _ => None,
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}
