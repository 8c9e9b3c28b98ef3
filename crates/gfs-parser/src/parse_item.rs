//! Item parsing: the feature, macro definitions, rules and paths.

use gfs_lexer::token::TokenKind;
use gfs_types::ast::*;
use gfs_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `Feature = { Item NEWLINE }`
    pub(crate) fn parse_feature(&mut self) -> Feature {
        let start = self.current_span();
        let mut items = Vec::new();
        self.skip_newlines();

        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            match self.parse_item() {
                Some(item) => {
                    if self.expect_newline_or_eof() {
                        items.push(item);
                    } else {
                        self.synchronize();
                    }
                }
                None => self.synchronize(),
            }
        }

        let span = start.merge(self.previous_span());
        Feature { items, span }
    }

    fn parse_item(&mut self) -> Option<Item> {
        match self.peek_kind() {
            TokenKind::Bang => self.parse_macro_def().map(Item::MacroDef),
            TokenKind::NumberLit(_) | TokenKind::Minus => self.parse_rule().map(Item::Rule),
            other => {
                let message = format!(
                    "expected a rule ('0.5: target = expr') or a macro definition ('!name = expr'), got '{other}'"
                );
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    /// `MacroDef = "!" IDENT [ "(" [ IDENT { "," IDENT } ] ")" ] "=" Expr`
    fn parse_macro_def(&mut self) -> Option<MacroDef> {
        let start = self.current_span();
        self.advance(); // eat `!`
        let name = self.expect_identifier()?;

        let params = if self.eat(&TokenKind::LParen) {
            let mut params = Vec::new();
            if !self.check_exact(&TokenKind::RParen) {
                loop {
                    params.push(self.expect_identifier()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RParen)?;
            Some(params)
        } else {
            None
        };

        self.expect(&TokenKind::Eq)?;
        let body = self.parse_expression()?;
        let span = start.merge(body.span);
        Some(MacroDef {
            name,
            params,
            body,
            span,
        })
    }

    /// `Rule = [ "-" ] NUMBER ":" Path ( "=" | "++" ) Expr`
    fn parse_rule(&mut self) -> Option<Rule> {
        let start = self.current_span();
        let negative = self.eat(&TokenKind::Minus);
        let precedence = match self.peek_kind() {
            TokenKind::NumberLit(n) => {
                let n = *n;
                self.advance();
                if negative {
                    -n
                } else {
                    n
                }
            }
            other => {
                let message = format!("expected rule precedence, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                return None;
            }
        };
        self.expect(&TokenKind::Colon)?;
        let target = self.parse_path()?;

        let op = match self.peek_kind() {
            TokenKind::Eq => RuleOp::Set,
            TokenKind::PlusPlus => RuleOp::Push,
            other => {
                let message = format!("expected '=' or '++' after rule target, got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                return None;
            }
        };
        self.advance();

        let value = self.parse_expression()?;
        let span = start.merge(value.span);
        Some(Rule {
            precedence,
            target,
            op,
            value,
            span,
        })
    }

    /// `Path = Segment { "." Segment }`
    pub(crate) fn parse_path(&mut self) -> Option<Path> {
        let start = self.current_span();
        let mut segments = vec![self.parse_path_segment()?];
        while self.eat(&TokenKind::Dot) {
            segments.push(self.parse_path_segment()?);
        }
        let span = start.merge(self.previous_span());
        Some(Path { segments, span })
    }

    fn parse_path_segment(&mut self) -> Option<PathSegment> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Some(PathSegment::Name(name))
            }
            TokenKind::Template(name) => {
                self.advance();
                Some(PathSegment::Template(name))
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected path segment, got '{other}'"),
                );
                None
            }
        }
    }
}
