//! # Audit Trail Contract and In-Memory Implementation
//!
//! The public contract is append and query. There is deliberately no way
//! to update or delete an entry once appended.

use crate::entry::{AuditAction, AuditDraft, AuditEntry};
use crate::errors::AuditError;
use chrono::Utc;
use parking_lot::RwLock;
use shared_types::{ActorId, DocumentId};
use tracing::debug;

/// Sort order for audit queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first.
    #[default]
    Ascending,
    /// Newest first.
    Descending,
}

/// Filters for reading the trail.
///
/// Empty filters match everything; `limit: None` returns all matches.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Only entries touching this document.
    pub document: Option<DocumentId>,
    /// Only entries by this actor.
    pub actor: Option<ActorId>,
    /// Only entries with this action tag.
    pub action: Option<AuditAction>,
    /// Timestamp ordering of the result.
    pub order: SortOrder,
    /// Maximum number of entries to return.
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Query all entries for one document, oldest first.
    #[must_use]
    pub fn for_document(document: DocumentId) -> Self {
        Self {
            document: Some(document),
            ..Self::default()
        }
    }

    /// Restrict to one action tag.
    #[must_use]
    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Newest entries first.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }

    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(document) = self.document {
            if entry.document != Some(document) {
                return false;
            }
        }
        if let Some(actor) = self.actor {
            if entry.actor != Some(actor) {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        true
    }
}

/// The audit trail contract: append and query, nothing else.
pub trait AuditTrail: Send + Sync {
    /// Append a new entry, returning its monotonic ID.
    fn append(&self, draft: AuditDraft) -> Result<u64, AuditError>;

    /// Read entries matching the query, ordered by timestamp.
    fn query(&self, query: &AuditQuery) -> Vec<AuditEntry>;
}

/// In-memory audit trail.
///
/// Entries and the ID counter live behind one lock so IDs are assigned in
/// append order with no gaps or duplicates under concurrency.
#[derive(Default)]
pub struct InMemoryAuditTrail {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditTrail {
    /// Create an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl AuditTrail for InMemoryAuditTrail {
    fn append(&self, draft: AuditDraft) -> Result<u64, AuditError> {
        let mut entries = self.entries.write();
        let id = entries.len() as u64 + 1;
        let entry = AuditEntry {
            id,
            timestamp: Utc::now(),
            actor: draft.actor,
            action: draft.action,
            document: draft.document,
            version: draft.version,
            details: draft.details,
        };
        debug!(id, action = %entry.action, "[vd-02] Audit entry appended");
        entries.push(entry);
        Ok(id)
    }

    fn query(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        let entries = self.entries.read();
        // Entries are stored in append order, which is timestamp order.
        let mut matched: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();

        if query.order == SortOrder::Descending {
            matched.reverse();
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        matched
    }
}
