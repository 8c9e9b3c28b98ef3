//! Batch runner: executes a feature's statements in precedence order.

use gfs_types::gfs::Statement;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::EvalError;
use crate::evaluator::{Evaluator, DEFAULT_MAX_DEPTH};
use crate::store::AttributeStore;

// ══════════════════════════════════════════════════════════════════════════════
// Options
// ══════════════════════════════════════════════════════════════════════════════

/// What to do when a statement fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Stop at the first failure. Earlier writes stay applied.
    #[default]
    FailFast,
    /// Record the failure and run the remaining statements.
    Continue,
}

/// Run configuration, usually read from a JSON file:
///
/// ```json
/// { "policy": "continue", "max_depth": 64 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    pub policy: BatchPolicy,
    /// Maximum expression nesting depth.
    pub max_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: BatchPolicy::FailFast,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RunOptions {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Results
// ══════════════════════════════════════════════════════════════════════════════

/// A fail-fast batch stopped at statement `index` (its position in the
/// list passed to [`run`]).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("statement {index} (target '{target}') failed: {source}")]
pub struct BatchError {
    pub index: usize,
    pub target: String,
    pub source: EvalError,
}

/// A failure recorded under [`BatchPolicy::Continue`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatementFailure {
    pub index: usize,
    pub target: String,
    pub error: EvalError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Statements that ran to completion.
    pub executed: usize,
    pub failures: Vec<StatementFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Runner
// ══════════════════════════════════════════════════════════════════════════════

/// Indices of `statements` in execution order: ascending precedence, ties
/// in list order.
pub fn execution_order(statements: &[Statement]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..statements.len()).collect();
    order.sort_by(|&a, &b| {
        statements[a]
            .precedence
            .total_cmp(&statements[b].precedence)
    });
    order
}

/// Execute `statements` against `store` one at a time, so each statement
/// sees every write made before it.
pub fn run<S>(
    statements: &[Statement],
    store: &mut S,
    options: &RunOptions,
) -> Result<BatchReport, BatchError>
where
    S: AttributeStore + ?Sized,
{
    let evaluator = Evaluator::new(options.max_depth);
    let mut report = BatchReport::default();

    for index in execution_order(statements) {
        let statement = &statements[index];
        match evaluator.execute(statement, &mut *store) {
            Ok(value) => {
                debug!(
                    index,
                    path = %statement.target,
                    precedence = statement.precedence,
                    value,
                    "executed statement"
                );
                report.executed += 1;
            }
            Err(error) => match options.policy {
                BatchPolicy::FailFast => {
                    return Err(BatchError {
                        index,
                        target: statement.target.clone(),
                        source: error,
                    })
                }
                BatchPolicy::Continue => {
                    warn!(index, path = %statement.target, %error, "statement failed");
                    report.failures.push(StatementFailure {
                        index,
                        target: statement.target.clone(),
                        error,
                    });
                }
            },
        }
    }

    info!(
        executed = report.executed,
        failed = report.failures.len(),
        "batch complete"
    );
    Ok(report)
}
