//! # Transition Batches
//!
//! A workflow transition mutates records and writes one audit entry as a
//! single atomic unit. The batch is the value that crosses the store
//! boundary: either every operation in it commits together with the audit
//! entry, or nothing does.

use shared_types::{Document, DocumentId, DocumentStatus, DocumentVersion, Signature, VersionId};
use vd_02_audit_trail::AuditDraft;

/// One record mutation inside a transition batch.
#[derive(Debug, Clone)]
pub enum RecordOp {
    /// Insert a new document.
    InsertDocument(Document),
    /// Insert a new version (must continue the last+1 sequence).
    InsertVersion(DocumentVersion),
    /// Insert a new signature record.
    InsertSignature(Signature),
    /// Change a document's lifecycle status.
    SetStatus {
        /// The document to update.
        document: DocumentId,
        /// The new status.
        status: DocumentStatus,
    },
    /// Set or clear a document's approved version.
    SetApprovedVersion {
        /// The document to update.
        document: DocumentId,
        /// The frozen version, or `None` to clear.
        version: Option<VersionId>,
    },
}

/// The atomic unit a workflow transition commits.
#[derive(Debug, Clone)]
pub struct TransitionBatch {
    /// Record mutations, applied in order.
    pub ops: Vec<RecordOp>,
    /// The audit entry persisted with the mutations.
    pub audit: AuditDraft,
}

impl TransitionBatch {
    /// Start a batch carrying the given audit entry.
    pub fn new(audit: AuditDraft) -> Self {
        Self {
            ops: Vec::new(),
            audit,
        }
    }

    /// Append an operation.
    #[must_use]
    pub fn op(mut self, op: RecordOp) -> Self {
        self.ops.push(op);
        self
    }
}
