//! Runtime error types for the GFS evaluator.

use gfs_types::gfs::{DecodeError, ExpressionOperator};
use thiserror::Error;

/// Evaluation error. Every failure surfaces; no operator falls back to a
/// default value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// An operator tag outside the GFS vocabulary, met while decoding.
    #[error("{at}: unknown {kind} operator '{tag}'")]
    UnknownOperator {
        kind: &'static str,
        tag: String,
        at: String,
    },

    /// A GFS document that is not valid JSON or has the wrong shape.
    #[error("malformed GFS document: {0}")]
    Malformed(String),

    /// A dynamic value whose path does not lead to a number.
    #[error("unresolved path '{path}': {reason}")]
    UnresolvedPath { path: String, reason: String },

    /// A statement target that cannot be written.
    #[error("invalid target '{path}': {reason}")]
    InvalidTarget { path: String, reason: String },

    /// `MIN` / `MAX` with no operands.
    #[error("{operator} requires at least one operand")]
    EmptyOperands { operator: ExpressionOperator },

    /// NaN or an infinity produced or stored.
    #[error("arithmetic trap: {0}")]
    ArithmeticTrap(String),

    /// Expression nesting beyond the configured limit.
    #[error("expression nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },
}

impl EvalError {
    pub(crate) fn unresolved(path: &str, reason: impl Into<String>) -> Self {
        EvalError::UnresolvedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_target(path: &str, reason: impl Into<String>) -> Self {
        EvalError::InvalidTarget {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<DecodeError> for EvalError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnknownOperator { kind, tag, at } => {
                EvalError::UnknownOperator { kind, tag, at }
            }
            other => EvalError::Malformed(other.to_string()),
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
