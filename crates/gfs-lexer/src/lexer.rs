//! Core GFSLang lexer: converts source text to a token stream.
//!
//! - `#` starts a comment that runs to end of line
//! - newlines separate items, except inside parentheses
//! - `${name}` path templates are single tokens
//! - errors are collected (up to [`gfs_types::MAX_ERRORS`]) and scanning resumes

use gfs_types::{CompileErrors, ErrorCode, GfslError, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// The GFSLang lexer.
pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// 1-based line.
    line: u32,
    /// 1-based column.
    col: u32,
    /// Open parentheses; newlines inside them are not tokens.
    paren_depth: u32,
    errors: CompileErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            paren_depth: 0,
            errors: CompileErrors::empty(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        while !self.errors.is_full() {
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn text_from(&self, start: usize) -> &'src str {
        std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("")
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.line).unwrap_or("");
        let err = GfslError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip blanks and comments. Newlines are skipped only inside parentheses.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' => {
                    self.advance();
                }
                b'\n' if self.paren_depth > 0 => {
                    self.advance();
                }
                b'#' => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Token {
        loop {
            self.skip_trivia();

            let start = self.pos;
            let start_line = self.line;
            let start_col = self.col;
            let Some(ch) = self.advance() else {
                return Token::new(TokenKind::Eof, self.current_span());
            };

            let kind = match ch {
                b'\n' => TokenKind::Newline,
                b'0'..=b'9' => self.scan_number(start, start_line, start_col),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(start),
                b'$' => match self.scan_template(start_line, start_col) {
                    Some(kind) => kind,
                    None => continue,
                },
                b'+' => {
                    if self.peek() == Some(b'+') {
                        self.advance();
                        TokenKind::PlusPlus
                    } else {
                        TokenKind::Plus
                    }
                }
                b'/' => {
                    if self.peek() == Some(b'/') {
                        self.advance();
                        TokenKind::SlashSlash
                    } else {
                        TokenKind::Slash
                    }
                }
                b'-' => TokenKind::Minus,
                b'*' => TokenKind::Star,
                b'!' => TokenKind::Bang,
                b'=' => TokenKind::Eq,
                b'(' => {
                    self.paren_depth += 1;
                    TokenKind::LParen
                }
                b')' => {
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    TokenKind::RParen
                }
                b',' => TokenKind::Comma,
                b':' => TokenKind::Colon,
                b'.' => TokenKind::Dot,
                _ => {
                    // Swallow the rest of a multi-byte character.
                    while self.peek().is_some_and(|c| c & 0xC0 == 0x80) {
                        self.advance();
                    }
                    let text = self.text_from(start).to_string();
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        format!("Unexpected character '{text}'"),
                        span,
                    );
                    if self.errors.is_full() {
                        return Token::new(TokenKind::Eof, self.current_span());
                    }
                    continue;
                }
            };
            return Token::new(kind, self.span_from(start_line, start_col));
        }
    }

    fn scan_number(&mut self, start: usize, start_line: u32, start_col: u32) -> TokenKind {
        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            while let Some(b'0'..=b'9') = self.peek() {
                self.advance();
            }
        }

        let text = self.text_from(start);
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => TokenKind::NumberLit(value),
            _ => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("Number literal '{text}' is out of range"),
                    span,
                );
                TokenKind::NumberLit(0.0)
            }
        }
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }
        TokenKind::Identifier(self.text_from(start).to_string())
    }

    /// Scan `${name}` after the `$`. Returns `None` after reporting an error.
    fn scan_template(&mut self, start_line: u32, start_col: u32) -> Option<TokenKind> {
        if self.peek() != Some(b'{') {
            let span = self.span_from(start_line, start_col);
            self.emit_error(
                ErrorCode::UNEXPECTED_CHARACTER,
                "Unexpected character '$'; templates are written ${name}",
                span,
            );
            return None;
        }
        self.advance();

        let name_start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }
        let name = self.text_from(name_start).to_string();

        if name.is_empty() || self.peek() != Some(b'}') {
            while self.peek().is_some_and(|c| c != b'}' && c != b'\n') {
                self.advance();
            }
            if self.peek() == Some(b'}') {
                self.advance();
            }
            let span = self.span_from(start_line, start_col);
            self.emit_error(
                ErrorCode::UNTERMINATED_TEMPLATE,
                "Template must be a single name in ${...}",
                span,
            );
            return None;
        }
        self.advance();
        Some(TokenKind::Template(name))
    }
}
