//! Audit trail error types.

use thiserror::Error;

/// Errors from audit trail operations.
///
/// An operation whose audit entry cannot be persisted must not be
/// considered successful; callers treat these as seriously as a failure
/// of the primary mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// The backing store refused or failed the append.
    #[error("Audit backend failure: {message}")]
    Backend {
        /// Adapter-specific description.
        message: String,
    },
}
