//! GFSL compiler: orchestrates the full compilation pipeline.
//!
//! ```text
//! GFSLang Source → Lexer → Parser → Compiler (macros, folding) → GFS statements → TS / JSON
//! ```

pub mod compiler;
mod env;
pub mod render;

use gfs_lexer::Lexer;
use gfs_parser::Parser;
use gfs_types::gfs::Statement;
use gfs_types::{CompileErrors, SourceFile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use compiler::{Compiler, MAX_MACRO_EXPANSION_DEPTH, MAX_TREE_NODES};
pub use render::{render_json, render_ts};

/// Outcome of a compilation, in a form front ends can serialize directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    /// Compiled statements; `None` when any error was reported.
    pub statements: Option<Vec<Statement>>,
    pub errors: CompileErrors,
}

/// Compile GFSLang source into GFS statements.
///
/// Stops after the first stage that reports errors and returns everything
/// that stage collected.
pub fn compile(source: &str, filename: &str) -> Result<Vec<Statement>, CompileErrors> {
    let source_file = SourceFile::new(filename, source);

    let lexed = Lexer::new(&source_file).lex();
    if lexed.errors.has_errors() {
        return Err(lexed.errors);
    }
    debug!(file = filename, tokens = lexed.tokens.len(), "lexed");

    let parsed = Parser::new(lexed.tokens, &source_file).parse();
    if parsed.errors.has_errors() {
        return Err(parsed.errors);
    }
    debug!(file = filename, items = parsed.feature.items.len(), "parsed");

    let mut errors = parsed.errors;
    let statements = Compiler::new(&mut errors, &source_file).compile(&parsed.feature);
    if errors.has_errors() {
        return Err(errors);
    }
    info!(file = filename, statements = statements.len(), "compiled");
    Ok(statements)
}

/// Like [`compile`], but always returns a [`CompileResult`].
pub fn compile_to_result(source: &str, filename: &str) -> CompileResult {
    match compile(source, filename) {
        Ok(statements) => CompileResult {
            success: true,
            statements: Some(statements),
            errors: CompileErrors::empty(),
        },
        Err(errors) => CompileResult {
            success: false,
            statements: None,
            errors,
        },
    }
}

/// Compile to TypeScript.
pub fn compile_to_ts(source: &str, filename: &str) -> Result<String, CompileErrors> {
    compile(source, filename).map(|statements| render_ts(&statements))
}

/// Compile to a GFS JSON document.
pub fn compile_to_json(source: &str, filename: &str) -> Result<String, CompileErrors> {
    compile(source, filename).map(|statements| render_json(&statements))
}
