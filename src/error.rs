//! Error taxonomy for the reasoning engine
//!
//! Computation errors (validation, empty option sets, unknown ids) are
//! fatal to the call that raised them. Storage errors are a separate type so
//! the lifecycle can log and continue without losing the distinction.

use thiserror::Error;

/// Errors raised by the decision pipeline and lifecycle
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed objective or context, rejected before the pipeline runs
    #[error("Invalid input: {field}: {message}")]
    InputValidation {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Selector was handed nothing to choose from
    #[error("No options to select from")]
    EmptyOptionSet,

    /// Status update or feedback for an id that is not in history
    #[error("Unknown decision: {0}")]
    UnknownDecision(String),

    /// Store write failed on a path where the failure is surfaced
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl EngineError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unknown_decision(id: impl Into<String>) -> Self {
        Self::UnknownDecision(id.into())
    }
}

/// Errors from a `DecisionStore` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decision already stored: {0}")]
    Duplicate(String),

    #[error("Store call timed out after {0}ms")]
    Timeout(u64),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
