//! Application-level errors

use thiserror::Error;

/// Errors that can occur when operating the store
///
/// Backend errors propagate unchanged to the caller. The chaos layer never
/// converts a genuine failure into a success; it only changes which operation
/// is performed, or whether the real outcome is reported honestly.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Lookup or sample target is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Connection or query failure in the backend
    #[error("Backend I/O error: {0}")]
    BackendIo(String),

    /// The operation was cancelled before completion
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// The operation did not complete within its deadline
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),
}

impl ApplicationError {
    /// Create a not-found error for a missing key
    pub fn key_not_found(key: &str) -> Self {
        Self::NotFound(format!("no record for key '{key}'"))
    }

    /// Check whether this error denotes an absent record rather than a failure
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
