//! Shared types for GFSL.
//!
//! This crate defines the GFSLang source AST, the GFS statement tree that
//! the compiler emits and the evaluator runs, source spans, and the
//! structured diagnostics used by every compiler stage.

mod error;
mod span;
pub mod ast;
pub mod gfs;

pub use error::{CompileErrors, ErrorCategory, ErrorCode, GfslError, MAX_ERRORS};
pub use span::{SourceFile, Span};

/// Result type used throughout the GFSL compiler.
pub type Result<T> = std::result::Result<T, GfslError>;
