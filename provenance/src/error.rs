//! Ledger error types.

use crate::store::StoreError;
use crate::types::BatchState;

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidTransition,
    AlreadyExists,
    IdGeneration,
    Serialization,
    CommitConflict,
    Store,
    UnknownOperation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "ValidationError",
            Self::NotFound => "NotFoundError",
            Self::InvalidTransition => "InvalidTransitionError",
            Self::AlreadyExists => "AlreadyExistsError",
            Self::IdGeneration => "IdGenerationError",
            Self::Serialization => "SerializationError",
            Self::CommitConflict => "CommitConflict",
            Self::Store => "StoreError",
            Self::UnknownOperation => "UnknownOperation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by ledger operations.
///
/// Everything except `CommitConflict` and `Store` is raised before the
/// invocation submits its write-set.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Empty or malformed argument
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Key has no record
    #[error("Record not found: {key}")]
    NotFound { key: String },

    /// Batch is not in a state the operation accepts
    #[error("Batch {batch_id} is {current}; {operation} requires {allowed}")]
    InvalidTransition {
        batch_id: String,
        operation: &'static str,
        current: BatchState,
        allowed: String,
    },

    /// Creation against an occupied key
    #[error("Record already exists: {key}")]
    AlreadyExists { key: String },

    /// Freshly generated batch id is already taken
    #[error("Generated batch id collides with existing key: {key}")]
    IdGeneration { key: String },

    /// Stored bytes do not decode as the expected record
    #[error("Malformed record at {key}: {reason}")]
    Serialization { key: String, reason: String },

    /// Read-set went stale before commit; resubmit the invocation
    #[error("Commit conflict on key: {key}")]
    CommitConflict { key: String },

    /// Record store backend failure
    #[error("Store error: {0}")]
    Store(String),

    /// Operation name not on the invocation surface
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::IdGeneration { .. } => ErrorKind::IdGeneration,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::CommitConflict { .. } => ErrorKind::CommitConflict,
            Self::Store(_) => ErrorKind::Store,
            Self::UnknownOperation(_) => ErrorKind::UnknownOperation,
        }
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn serialization(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Serialization {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { key } => Self::CommitConflict { key },
            StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}

/// Reject empty or whitespace-only identifiers.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::validation(field, "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflict_keeps_key() {
        let err: LedgerError = StoreError::Conflict {
            key: "batch-1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::CommitConflict);
        assert!(err.to_string().contains("batch-1"));
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("id", "abc").is_ok());
        let err = require_non_empty("id", "   ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Invalid id: must not be empty");
    }
}
