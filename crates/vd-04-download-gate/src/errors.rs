//! Download gate error types.

use chrono::{DateTime, Utc};
use shared_types::{ContentHash, VersionId};
use thiserror::Error;
use vd_01_document_store::StorageError;
use vd_02_audit_trail::AuditError;

/// Errors from capability issuance and redemption.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The token's time window has elapsed.
    #[error("Capability expired at {expired_at}")]
    Expired {
        /// End of the token's validity window.
        expired_at: DateTime<Utc>,
    },

    /// The token is malformed or its authentication tag does not match.
    #[error("Invalid capability token")]
    Invalid,

    /// The referenced version does not exist, or its bytes are no longer
    /// retrievable.
    #[error("Version not found: {version_id}")]
    NotFound {
        /// The unresolvable version.
        version_id: VersionId,
    },

    /// The live bytes no longer match the recorded content hash.
    /// Tamper evidence; requires human intervention.
    #[error("Integrity violation for version {version_id}: expected {expected}, computed {computed}")]
    IntegrityViolation {
        /// The affected version.
        version_id: VersionId,
        /// Hash recorded at upload time.
        expected: ContentHash,
        /// Hash of the bytes as they are now.
        computed: ContentHash,
    },

    /// Transient storage failure; the redemption may be retried.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The tamper-evidence audit entry could not be persisted.
    #[error(transparent)]
    Audit(#[from] AuditError),
}
