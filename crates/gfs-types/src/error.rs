use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors stored before further ones are only counted.
pub const MAX_ERRORS: usize = 20;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Macro,
    Arithmetic,
    Call,
    Structure,
}

/// Numeric error code (E100–E599).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNEXPECTED_CHARACTER: Self = Self(101);
    pub const INVALID_NUMBER: Self = Self(102);
    pub const UNTERMINATED_TEMPLATE: Self = Self(103);

    // ── Macro errors (E200–E299) ──
    pub const UNDEFINED_MACRO: Self = Self(200);
    pub const DUPLICATE_MACRO_ARGUMENT: Self = Self(201);
    pub const MACRO_ARITY_MISMATCH: Self = Self(202);
    pub const MACRO_EXPANSION_TOO_DEEP: Self = Self(203);

    // ── Arithmetic errors (E300–E399) ──
    pub const DIVISION_BY_ZERO: Self = Self(300);
    pub const DYNAMIC_DIVISOR: Self = Self(301);
    pub const NON_FINITE_CONSTANT: Self = Self(302);

    // ── Call errors (E400–E499) ──
    pub const UNDEFINED_FUNCTION: Self = Self(400);
    pub const WRONG_ARG_COUNT: Self = Self(401);

    // ── Structure errors (E500–E599) ──
    pub const STRUCTURAL_LIMIT_EXCEEDED: Self = Self(500);
    pub const TREE_TOO_DEEP: Self = Self(501);
    pub const TREE_TOO_LARGE: Self = Self(502);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Macro,
            300..=399 => ErrorCategory::Arithmetic,
            400..=499 => ErrorCategory::Call,
            500..=599 => ErrorCategory::Structure,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured GFSL compiler diagnostic.
///
/// Front ends render these directly; they never parse the message text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GfslError {
    /// Source file name.
    pub file: String,
    pub code: ErrorCode,
    /// Derived from `code`.
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, for context.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl GfslError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for GfslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for GfslError {}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Macro => write!(f, "macro"),
            Self::Arithmetic => write!(f, "arithmetic"),
            Self::Call => write!(f, "call"),
            Self::Structure => write!(f, "structure"),
        }
    }
}

/// Diagnostics collected by one compiler stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<GfslError>,
    pub total_errors: usize,
}

impl CompileErrors {
    pub fn empty() -> Self {
        Self {
            errors: Vec::new(),
            total_errors: 0,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Returns `true` once the storage cap has been reached.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Add an error. Past [`MAX_ERRORS`] the error is counted but not stored.
    pub fn push_error(&mut self, error: GfslError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        if self.total_errors > self.errors.len() {
            writeln!(
                f,
                "... and {} more errors",
                self.total_errors - self.errors.len()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: ErrorCode) -> GfslError {
        GfslError::new(
            "strength.gfsl",
            code,
            "Macro !mod is not defined",
            Span::new(2, 40, 2, 44),
            "0.5: attributes.strength.modifier = !mod",
        )
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.category(), ErrorCategory::Syntax);
        assert_eq!(ErrorCode::UNDEFINED_MACRO.category(), ErrorCategory::Macro);
        assert_eq!(ErrorCode::DIVISION_BY_ZERO.category(), ErrorCategory::Arithmetic);
        assert_eq!(ErrorCode::UNDEFINED_FUNCTION.category(), ErrorCategory::Call);
        assert_eq!(
            ErrorCode::STRUCTURAL_LIMIT_EXCEEDED.category(),
            ErrorCategory::Structure
        );
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::DYNAMIC_DIVISOR.to_string(), "E301");
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.to_string(), "E100");
    }

    #[test]
    fn test_error_display() {
        let err = sample(ErrorCode::UNDEFINED_MACRO);
        assert_eq!(
            err.to_string(),
            "strength.gfsl:2:40: E200 [macro] Macro !mod is not defined"
        );
        assert_eq!(err.category, ErrorCategory::Macro);
    }

    #[test]
    fn test_error_json_flattens_span() {
        let err = sample(ErrorCode::UNDEFINED_MACRO).with_suggestion("define it with !mod = ...");
        let json: serde_json::Value = serde_json::to_value(&err).unwrap();
        assert_eq!(json["line"], 2);
        assert_eq!(json["column"], 40);
        assert_eq!(json["end_column"], 44);
        assert_eq!(json["code"], 200);
        assert_eq!(json["category"], "macro");
        assert_eq!(json["suggestion"], "define it with !mod = ...");

        let back: GfslError = serde_json::from_value(json).unwrap();
        assert_eq!(back.code, err.code);
        assert_eq!(back.span, err.span);
    }

    #[test]
    fn test_suggestion_omitted_when_absent() {
        let json = serde_json::to_string(&sample(ErrorCode::UNDEFINED_MACRO)).unwrap();
        assert!(!json.contains("suggestion"));
    }

    #[test]
    fn test_compile_errors_cap() {
        let mut errs = CompileErrors::empty();
        for _ in 0..25 {
            errs.push_error(sample(ErrorCode::UNEXPECTED_TOKEN));
        }
        assert_eq!(errs.errors.len(), MAX_ERRORS);
        assert_eq!(errs.total_errors, 25);
        assert!(errs.is_full());
        assert!(errs.to_string().ends_with("... and 5 more errors\n"));
    }

    #[test]
    fn test_compile_errors_empty() {
        let errs = CompileErrors::empty();
        assert!(!errs.has_errors());
        assert_eq!(errs.to_string(), "");
    }
}
