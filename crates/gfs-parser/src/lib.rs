//! GFSLang parser: converts a token stream into a source AST.

mod parse_expr;
mod parse_item;
mod parser;

pub use parser::{ParseResult, Parser, MAX_EXPR_DEPTH};
