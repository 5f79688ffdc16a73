//! # Domain Errors
//!
//! Error types for the document store and the blob storage port.

use shared_types::{DocumentId, StorageRef, VersionId};
use thiserror::Error;
use vd_02_audit_trail::AuditError;

/// Errors from metadata store operations.
///
/// Each variant corresponds to a specific invariant violation or failure
/// mode; no variant is a catch-all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced document does not exist.
    #[error("Document not found: {id}")]
    DocumentNotFound {
        /// The missing document.
        id: DocumentId,
    },

    /// The referenced version does not exist.
    #[error("Document version not found: {id}")]
    VersionNotFound {
        /// The missing version.
        id: VersionId,
    },

    /// A document with this ID is already stored (INVARIANT-2).
    #[error("Document already exists: {id}")]
    DocumentExists {
        /// The colliding document.
        id: DocumentId,
    },

    /// A version with this ID is already stored (INVARIANT-2).
    #[error("Document version already exists: {id}")]
    VersionExists {
        /// The colliding version.
        id: VersionId,
    },

    /// Version numbering would break the last+1 sequence (INVARIANT-1).
    #[error("Non-sequential version for document {document}: expected {expected}, got {got}")]
    NonSequentialVersion {
        /// The affected document.
        document: DocumentId,
        /// The next number the sequence allows.
        expected: u32,
        /// The number the batch tried to insert.
        got: u32,
    },

    /// An approved-version reference points outside the document.
    #[error("Version {version} does not belong to document {document}")]
    ForeignApprovedVersion {
        /// The affected document.
        document: DocumentId,
        /// The foreign version.
        version: VersionId,
    },

    /// The batch's audit entry could not be appended (INVARIANT-4);
    /// nothing was committed.
    #[error("Audit append failed: {0}")]
    Audit(#[from] AuditError),
}

/// Errors from the blob storage port.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Transient infrastructure failure; the operation may be retried.
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Adapter-specific description.
        message: String,
    },

    /// The referenced bytes no longer exist. Fatal to the operation.
    #[error("Stored bytes not found: {storage_ref}")]
    NotFound {
        /// The dangling reference.
        storage_ref: StorageRef,
    },
}

impl StorageError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable { .. })
    }
}
