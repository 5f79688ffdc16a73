//! # Document Store Service
//!
//! In-memory implementation of the metadata store. All record tables live
//! behind one `RwLock`, so a committed batch is either fully visible to
//! readers or not at all (INVARIANT-3).
//!
//! The audit entry carried by a batch is appended inside the same write
//! section, after validation and before the (infallible) application of
//! the record operations — a transition whose audit entry cannot be
//! persisted does not commit (INVARIANT-4).

use crate::domain::batch::{RecordOp, TransitionBatch};
use crate::domain::errors::StoreError;
use parking_lot::RwLock;
use shared_types::{
    ContentHash, Document, DocumentId, DocumentVersion, Signature, SignatureId, VersionId,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use vd_02_audit_trail::AuditTrail;

#[derive(Default)]
struct StoreState {
    documents: HashMap<DocumentId, Document>,
    versions: HashMap<VersionId, DocumentVersion>,
    /// Version IDs per document, in version-number order.
    by_document: HashMap<DocumentId, Vec<VersionId>>,
    signatures: HashMap<SignatureId, Signature>,
    /// Signature IDs per version, in creation order.
    by_version: HashMap<VersionId, Vec<SignatureId>>,
}

impl StoreState {
    fn next_version_number(&self, document: DocumentId) -> u32 {
        self.by_document
            .get(&document)
            .and_then(|ids| ids.last())
            .and_then(|id| self.versions.get(id))
            .map(|v| v.version_number + 1)
            .unwrap_or(1)
    }
}

/// The in-memory metadata store.
pub struct DocumentStore {
    state: RwLock<StoreState>,
    audit: Arc<dyn AuditTrail>,
}

impl DocumentStore {
    /// Create an empty store committing audit entries to `audit`.
    pub fn new(audit: Arc<dyn AuditTrail>) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            audit,
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Fetch a document by ID.
    pub fn document(&self, id: DocumentId) -> Option<Document> {
        self.state.read().documents.get(&id).cloned()
    }

    /// Fetch a version by ID.
    pub fn version(&self, id: VersionId) -> Option<DocumentVersion> {
        self.state.read().versions.get(&id).cloned()
    }

    /// All versions of a document, in version-number order.
    pub fn versions_of(&self, document: DocumentId) -> Vec<DocumentVersion> {
        let state = self.state.read();
        state
            .by_document
            .get(&document)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.versions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The version with the highest version number, if any.
    pub fn latest_version(&self, document: DocumentId) -> Option<DocumentVersion> {
        let state = self.state.read();
        state
            .by_document
            .get(&document)
            .and_then(|ids| ids.last())
            .and_then(|id| state.versions.get(id).cloned())
    }

    /// The version number the next upload will receive.
    pub fn next_version_number(&self, document: DocumentId) -> u32 {
        self.state.read().next_version_number(document)
    }

    /// Fetch a signature by ID.
    pub fn signature(&self, id: SignatureId) -> Option<Signature> {
        self.state.read().signatures.get(&id).cloned()
    }

    /// All signatures recorded for a version, in creation order.
    pub fn signatures_of(&self, version: VersionId) -> Vec<Signature> {
        let state = self.state.read();
        state
            .by_version
            .get(&version)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.signatures.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `hash` already belongs to a version of a COMPLETED_*
    /// document. Guards against resubmitting an already-signed artifact.
    pub fn hash_on_completed_document(&self, hash: &ContentHash) -> Option<VersionId> {
        let state = self.state.read();
        state
            .versions
            .values()
            .filter(|v| &v.content_hash == hash)
            .find(|v| {
                state
                    .documents
                    .get(&v.document)
                    .is_some_and(|d| d.status.is_completed())
            })
            .map(|v| v.id)
    }

    /// Approved versions of all COMPLETED_* documents. Input for periodic
    /// background re-verification sweeps.
    pub fn completed_approved_versions(&self) -> Vec<DocumentVersion> {
        let state = self.state.read();
        state
            .documents
            .values()
            .filter(|d| d.status.is_completed())
            .filter_map(|d| d.approved_version)
            .filter_map(|id| state.versions.get(&id).cloned())
            .collect()
    }

    // =========================================================================
    // ATOMIC COMMIT
    // =========================================================================

    /// Commit a transition batch: validate every operation, append the
    /// audit entry, then apply the mutations. Returns the audit entry ID.
    ///
    /// Nothing becomes visible to readers unless the whole batch commits.
    pub fn commit(&self, batch: TransitionBatch) -> Result<u64, StoreError> {
        let mut state = self.state.write();

        Self::validate(&state, &batch.ops)?;

        // Fallible step last-but-one: audit append. Application below is
        // infallible once validation has passed, so all-or-nothing holds.
        let audit_id = self.audit.append(batch.audit)?;

        for op in batch.ops {
            Self::apply(&mut state, op);
        }
        debug!(audit_id, "[vd-01] Transition batch committed");
        Ok(audit_id)
    }

    /// Validate all operations against current state plus what the batch
    /// itself stages, so an upload may insert a document and its first
    /// version in one unit.
    fn validate(state: &StoreState, ops: &[RecordOp]) -> Result<(), StoreError> {
        let mut staged_docs: HashSet<DocumentId> = HashSet::new();
        let mut staged_versions: HashMap<VersionId, DocumentId> = HashMap::new();
        let mut staged_numbers: HashMap<DocumentId, u32> = HashMap::new();

        let doc_known = |state: &StoreState, staged: &HashSet<DocumentId>, id: DocumentId| {
            state.documents.contains_key(&id) || staged.contains(&id)
        };

        for op in ops {
            match op {
                RecordOp::InsertDocument(doc) => {
                    if state.documents.contains_key(&doc.id) || staged_docs.contains(&doc.id) {
                        return Err(StoreError::DocumentExists { id: doc.id });
                    }
                    staged_docs.insert(doc.id);
                }
                RecordOp::InsertVersion(version) => {
                    if !doc_known(state, &staged_docs, version.document) {
                        return Err(StoreError::DocumentNotFound {
                            id: version.document,
                        });
                    }
                    if state.versions.contains_key(&version.id)
                        || staged_versions.contains_key(&version.id)
                    {
                        return Err(StoreError::VersionExists { id: version.id });
                    }
                    let expected = staged_numbers
                        .get(&version.document)
                        .copied()
                        .unwrap_or_else(|| state.next_version_number(version.document));
                    if version.version_number != expected {
                        return Err(StoreError::NonSequentialVersion {
                            document: version.document,
                            expected,
                            got: version.version_number,
                        });
                    }
                    staged_numbers.insert(version.document, expected + 1);
                    staged_versions.insert(version.id, version.document);
                }
                RecordOp::InsertSignature(signature) => {
                    if !state.versions.contains_key(&signature.version)
                        && !staged_versions.contains_key(&signature.version)
                    {
                        return Err(StoreError::VersionNotFound {
                            id: signature.version,
                        });
                    }
                }
                RecordOp::SetStatus { document, .. } => {
                    if !doc_known(state, &staged_docs, *document) {
                        return Err(StoreError::DocumentNotFound { id: *document });
                    }
                }
                RecordOp::SetApprovedVersion { document, version } => {
                    if !doc_known(state, &staged_docs, *document) {
                        return Err(StoreError::DocumentNotFound { id: *document });
                    }
                    if let Some(version) = version {
                        let owner = state
                            .versions
                            .get(version)
                            .map(|v| v.document)
                            .or_else(|| staged_versions.get(version).copied());
                        match owner {
                            None => return Err(StoreError::VersionNotFound { id: *version }),
                            Some(owner) if owner != *document => {
                                return Err(StoreError::ForeignApprovedVersion {
                                    document: *document,
                                    version: *version,
                                })
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(state: &mut StoreState, op: RecordOp) {
        match op {
            RecordOp::InsertDocument(doc) => {
                state.by_document.entry(doc.id).or_default();
                state.documents.insert(doc.id, doc);
            }
            RecordOp::InsertVersion(version) => {
                state
                    .by_document
                    .entry(version.document)
                    .or_default()
                    .push(version.id);
                state.versions.insert(version.id, version);
            }
            RecordOp::InsertSignature(signature) => {
                state
                    .by_version
                    .entry(signature.version)
                    .or_default()
                    .push(signature.id);
                state.signatures.insert(signature.id, signature);
            }
            RecordOp::SetStatus { document, status } => {
                if let Some(doc) = state.documents.get_mut(&document) {
                    doc.status = status;
                }
            }
            RecordOp::SetApprovedVersion { document, version } => {
                if let Some(doc) = state.documents.get_mut(&document) {
                    doc.approved_version = version;
                }
            }
        }
    }
}
