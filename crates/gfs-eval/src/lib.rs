//! GFS evaluator: runs compiled statements against character state.
//!
//! - [`AttributeStore`] / [`JsonStore`]: dotted-path reads and writes
//! - [`Evaluator`]: expression evaluation and statement execution
//! - [`run`]: precedence-ordered batch execution

mod batch;
mod error;
mod evaluator;
mod store;

use gfs_types::gfs::{decode_document, Statement};

pub use batch::{
    execution_order, run, BatchError, BatchPolicy, BatchReport, RunOptions, StatementFailure,
};
pub use error::{EvalError, EvalResult};
pub use evaluator::{evaluate, execute, Evaluator, DEFAULT_MAX_DEPTH};
pub use store::{AttributeStore, JsonStore};

/// Decode a GFS JSON document into statements.
///
/// Unknown operator tags fail with [`EvalError::UnknownOperator`] and
/// nothing is returned.
pub fn load_statements(text: &str) -> EvalResult<Vec<Statement>> {
    Ok(decode_document(text)?)
}
