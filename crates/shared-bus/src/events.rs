//! # Workflow Events
//!
//! Defines all event types that flow through the shared bus. Events are
//! facts about committed transitions, never commands: consuming them is
//! always optional and their loss never affects workflow state.

use serde::{Deserialize, Serialize};
use shared_types::{ContentHash, DocumentId, SignatureId, SignatureKind, VersionId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    // =========================================================================
    // LIFECYCLE (vd-03)
    // =========================================================================
    /// A new document or document version entered the workflow.
    DocumentSubmitted {
        /// The document that received the version.
        document_id: DocumentId,
        /// The freshly created version.
        version_id: VersionId,
        /// 1 for an initial upload, last+1 for re-uploads.
        version_number: u32,
        /// Digest of the stored bytes.
        content_hash: ContentHash,
    },

    /// A pending document was approved for signing.
    DocumentApproved {
        /// The approved document.
        document_id: DocumentId,
        /// The version frozen as `approved_version`.
        version_id: VersionId,
    },

    /// A pending document was rejected.
    DocumentRejected {
        /// The rejected document.
        document_id: DocumentId,
        /// The checker's stated reason (always non-empty).
        reason: String,
    },

    // =========================================================================
    // SIGNING (vd-03)
    // =========================================================================
    /// A document completed signing, internally or externally.
    DocumentSigned {
        /// The signed document.
        document_id: DocumentId,
        /// The signed version.
        version_id: VersionId,
        /// The recorded signature.
        signature_id: SignatureId,
        /// Internal (engine key) or external (ingested file).
        kind: SignatureKind,
    },

    // =========================================================================
    // INTEGRITY (vd-03, vd-04, background verifier)
    // =========================================================================
    /// A content hash re-verification found a mismatch. Possible tampering;
    /// requires human intervention.
    IntegrityAlert {
        /// The affected document, when known.
        document_id: Option<DocumentId>,
        /// The version whose bytes failed verification.
        version_id: VersionId,
        /// The hash recorded at upload time.
        expected: ContentHash,
        /// The recomputed hash; `None` when the bytes were unreadable.
        computed: Option<ContentHash>,
    },

    // =========================================================================
    // DOWNLOADS (vd-03 issues, vd-04 redeems)
    // =========================================================================
    /// A download capability was issued for an approved version.
    DownloadIssued {
        /// The document whose approved version was requested.
        document_id: DocumentId,
        /// The version the capability binds to.
        version_id: VersionId,
    },

    /// A download capability was redeemed after passing re-verification.
    DownloadRedeemed {
        /// The version whose bytes were released.
        version_id: VersionId,
    },
}

impl WorkflowEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::DocumentSubmitted { .. }
            | Self::DocumentApproved { .. }
            | Self::DocumentRejected { .. } => EventTopic::Lifecycle,
            Self::DocumentSigned { .. } => EventTopic::Signing,
            Self::IntegrityAlert { .. } => EventTopic::Integrity,
            Self::DownloadIssued { .. } | Self::DownloadRedeemed { .. } => EventTopic::Download,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Upload, approve, and reject transitions.
    Lifecycle,
    /// Completed signing transitions.
    Signing,
    /// Hash re-verification failures.
    Integrity,
    /// Capability issuance and redemption.
    Download,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &WorkflowEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
