//! Audit entry records and the action vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ActorId, DocumentId, Metadata, VersionId};
use std::fmt;

/// Action tag recorded with every audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// A document or new version was uploaded.
    Upload,
    /// A pending document was approved for signing.
    Approve,
    /// A pending document was rejected.
    Reject,
    /// An internal RSA-PSS signature was created.
    SignInternal,
    /// An externally-signed file was ingested as a new version.
    UploadSignedExternal,
    /// A download capability was issued for an approved version.
    DownloadApproved,
    /// A download capability was redeemed and bytes released.
    DownloadRedeemed,
    /// A hash or signature re-verification succeeded.
    HashVerified,
    /// A hash re-verification found a mismatch — tamper evidence.
    HashVerifiedFail,
    /// A background re-verification ran (details carry the outcome).
    BackgroundVerify,
    /// A transition was refused by a role or state precondition.
    ActionDenied,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditAction::Upload => "UPLOAD",
            AuditAction::Approve => "APPROVE",
            AuditAction::Reject => "REJECT",
            AuditAction::SignInternal => "SIGN_INTERNAL",
            AuditAction::UploadSignedExternal => "UPLOAD_SIGNED_EXTERNAL",
            AuditAction::DownloadApproved => "DOWNLOAD_APPROVED",
            AuditAction::DownloadRedeemed => "DOWNLOAD_REDEEMED",
            AuditAction::HashVerified => "HASH_VERIFIED",
            AuditAction::HashVerifiedFail => "HASH_VERIFIED_FAIL",
            AuditAction::BackgroundVerify => "BACKGROUND_VERIFY",
            AuditAction::ActionDenied => "ACTION_DENIED",
        };
        f.write_str(name)
    }
}

/// A committed, immutable audit entry.
///
/// Fields referencing other records are nullable so that audit history
/// stays valid even if a referenced record could ever be removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic entry ID, assigned at append time.
    pub id: u64,
    /// Append timestamp.
    pub timestamp: DateTime<Utc>,
    /// The acting user; `None` for system actions.
    pub actor: Option<ActorId>,
    /// What happened.
    pub action: AuditAction,
    /// The affected document, if any.
    pub document: Option<DocumentId>,
    /// The affected version, if any.
    pub version: Option<VersionId>,
    /// Opaque key-value details (reason, hashes, filenames).
    pub details: Metadata,
}

/// The caller-supplied part of an audit entry; the trail assigns ID and
/// timestamp at append time.
///
/// A draft is well-formed by construction: the action tag is mandatory
/// and every reference is optional.
#[derive(Debug, Clone)]
pub struct AuditDraft {
    /// The acting user; `None` for system actions.
    pub actor: Option<ActorId>,
    /// What happened.
    pub action: AuditAction,
    /// The affected document, if any.
    pub document: Option<DocumentId>,
    /// The affected version, if any.
    pub version: Option<VersionId>,
    /// Opaque key-value details.
    pub details: Metadata,
}

impl AuditDraft {
    /// Start a draft for an action.
    pub fn new(action: AuditAction) -> Self {
        Self {
            actor: None,
            action,
            document: None,
            version: None,
            details: Metadata::new(),
        }
    }

    /// Record the acting user.
    #[must_use]
    pub fn actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Record the affected document.
    #[must_use]
    pub fn document(mut self, document: DocumentId) -> Self {
        self.document = Some(document);
        self
    }

    /// Record the affected version.
    #[must_use]
    pub fn version(mut self, version: VersionId) -> Self {
        self.version = Some(version);
        self
    }

    /// Attach a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_display_names() {
        assert_eq!(AuditAction::HashVerifiedFail.to_string(), "HASH_VERIFIED_FAIL");
        assert_eq!(
            AuditAction::UploadSignedExternal.to_string(),
            "UPLOAD_SIGNED_EXTERNAL"
        );
    }

    #[test]
    fn test_draft_builder() {
        let doc = DocumentId::new();
        let draft = AuditDraft::new(AuditAction::Reject)
            .document(doc)
            .detail("reason", "missing appendix");

        assert_eq!(draft.action, AuditAction::Reject);
        assert_eq!(draft.document, Some(doc));
        assert_eq!(draft.details.get("reason").map(String::as_str), Some("missing appendix"));
        assert!(draft.actor.is_none());
    }
}
