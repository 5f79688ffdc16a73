//! # Workflow Errors
//!
//! The error taxonomy callers pattern-match on. Every rejected transition
//! names the precise precondition that failed — current state, required
//! state, or the integrity mismatch — never a generic failure.

use crate::domain::policy::Operation;
use shared_crypto::CryptoError;
use shared_types::{ContentHash, DocumentId, DocumentStatus, Role, SignatureId, VersionId};
use thiserror::Error;
use vd_01_document_store::{StorageError, StoreError};
use vd_02_audit_trail::AuditError;
use vd_04_download_gate::DownloadError;

/// Errors from workflow transitions.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The actor's role may not trigger this operation.
    #[error("Role {role} may not {operation}")]
    RoleDenied {
        /// The denied role.
        role: Role,
        /// The attempted operation.
        operation: Operation,
    },

    /// The referenced document does not exist.
    #[error("Document not found: {id}")]
    DocumentNotFound {
        /// The missing document.
        id: DocumentId,
    },

    /// The document is not in a state this transition accepts.
    #[error("Document is {current}; transition requires {required}")]
    InvalidState {
        /// The document's current status.
        current: DocumentStatus,
        /// The status (or statuses) the transition requires.
        required: &'static str,
    },

    /// Reject requires a non-empty reason.
    #[error("Reject requires a non-empty reason")]
    EmptyRejectReason,

    /// The transition needs an approved version and none is set.
    #[error("Document {document} has no approved version")]
    MissingApprovedVersion {
        /// The affected document.
        document: DocumentId,
    },

    /// The uploaded content already exists on a completed document.
    /// 409-equivalent: an already-signed artifact cannot be resubmitted.
    #[error("Content hash {hash} already belongs to a signed document")]
    DuplicateSignedContent {
        /// The colliding hash.
        hash: ContentHash,
    },

    /// The live bytes no longer match the recorded content hash.
    /// Tamper evidence; a hard stop requiring human intervention.
    #[error("Integrity violation for version {version_id}: expected {expected}, computed {computed}")]
    IntegrityViolation {
        /// The affected version.
        version_id: VersionId,
        /// Hash recorded at upload time.
        expected: ContentHash,
        /// Hash of the bytes as they are now.
        computed: ContentHash,
    },

    /// The referenced signature does not exist.
    #[error("Signature not found: {id}")]
    SignatureNotFound {
        /// The missing signature.
        id: SignatureId,
    },

    /// Internal bookkeeping broke an invariant that upload-time
    /// construction should make impossible.
    #[error("Inconsistent workflow state: {message}")]
    Inconsistent {
        /// What was found.
        message: String,
    },

    /// Signing or verification failed at the crypto layer. Never
    /// silently treated as "not signed".
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Byte storage failed. `Unavailable` is retryable, `NotFound` fatal.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The metadata store refused the transition batch.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The audit entry could not be persisted; the operation did not
    /// take effect.
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// Capability issuance failed downstream.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

impl WorkflowError {
    /// Whether retrying the whole operation could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkflowError::Storage(e) => e.is_transient(),
            WorkflowError::Download(DownloadError::Storage(e)) => e.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_storage_is_retryable() {
        let err = WorkflowError::Storage(StorageError::Unavailable {
            message: "timeout".into(),
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn test_integrity_violation_is_not_retryable() {
        let err = WorkflowError::IntegrityViolation {
            version_id: VersionId::new(),
            expected: ContentHash::from_hex("aa"),
            computed: ContentHash::from_hex("bb"),
        };
        assert!(!err.is_retryable());
    }
}
