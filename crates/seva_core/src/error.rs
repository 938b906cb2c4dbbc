use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FieldError, Status};

/// Error surface of the ledger core.
///
/// Validation, not-found, illegal-transition and conflict are expected
/// control flow and always returned as values. Store errors split two ways:
/// an unreadable slot degrades to an empty snapshot (logged, not surfaced),
/// while a failed write must reach the caller because the mutation it was
/// meant to persist did not happen.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerError {
    #[error("complaint validation failed ({} field(s))", .0.len())]
    Validation(Vec<FieldError>),

    #[error("complaint not found: {id}")]
    NotFound { id: String },

    #[error("transition {from} -> {to} is not allowed")]
    IllegalTransition { from: Status, to: Status },

    #[error("snapshot revision conflict: base {base}, store has {current}")]
    Conflict { base: u64, current: u64 },

    #[error("failed to read persisted snapshot: {0}")]
    StoreRead(String),

    #[error("failed to write snapshot: {0}")]
    StoreWrite(String),
}

impl LedgerError {
    /// Field messages for a validation failure, empty for other variants.
    /// Convenience for UI layers that render per-field errors.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            LedgerError::Validation(errors) => errors,
            _ => &[],
        }
    }
}
