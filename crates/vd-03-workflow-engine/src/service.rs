//! # Workflow Engine Service
//!
//! Implements [`WorkflowApi`]. Every transition follows the same shape:
//!
//! 1. Serialize on the document's lock (INVARIANT-4).
//! 2. Validate role and state preconditions; denials are audited as
//!    `ACTION_DENIED` and returned as precise errors.
//! 3. Re-verify content hashes when crossing a trust boundary
//!    (INVARIANT-2); mismatches are audited as `HASH_VERIFIED_FAIL` and
//!    abort the operation.
//! 4. Commit record mutations and the success audit entry as one batch
//!    (INVARIANT-3).
//! 5. Only after the commit, publish events and enqueue background tasks
//!    (INVARIANT-5) - both best-effort.

use crate::domain::errors::WorkflowError;
use crate::domain::policy::{can, Operation};
use crate::ports::inbound::{ExternalSignedUpload, UploadRequest, WorkflowApi};
use crate::ports::outbound::{BackgroundTask, TaskQueue};
use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use shared_bus::{EventPublisher, WorkflowEvent};
use shared_crypto::{digest_reader, Digest, PssSigner};
use shared_types::{
    Actor, ActorId, ContentHash, Document, DocumentId, DocumentStatus, DocumentVersion, Signature,
    SignatureId, SignatureKind, StorageRef, VersionId,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use vd_01_document_store::{BlobStorage, DocumentStore, RecordOp, StorageError, TimeSource, TransitionBatch};
use vd_02_audit_trail::{AuditAction, AuditDraft, AuditTrail};
use vd_04_download_gate::{CapabilityToken, DownloadGate};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Validity window of issued download capabilities.
    pub download_ttl: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            download_ttl: Duration::seconds(300),
        }
    }
}

/// Dependencies for [`WorkflowEngine`].
pub struct WorkflowDependencies {
    /// Metadata store committing transition batches.
    pub store: Arc<DocumentStore>,
    /// External byte storage.
    pub blobs: Arc<dyn BlobStorage>,
    /// Audit trail for entries outside transition batches.
    pub audit: Arc<dyn AuditTrail>,
    /// Internal signing key; `None` disables internal signing.
    pub signer: Option<Arc<PssSigner>>,
    /// Capability issuer for downloads.
    pub gate: Arc<DownloadGate>,
    /// Post-commit event bus.
    pub bus: Arc<dyn EventPublisher>,
    /// Background task queue.
    pub tasks: Arc<dyn TaskQueue>,
    /// Wall clock.
    pub time: Arc<dyn TimeSource>,
}

/// The workflow engine.
pub struct WorkflowEngine {
    store: Arc<DocumentStore>,
    blobs: Arc<dyn BlobStorage>,
    audit: Arc<dyn AuditTrail>,
    signer: Option<Arc<PssSigner>>,
    gate: Arc<DownloadGate>,
    bus: Arc<dyn EventPublisher>,
    tasks: Arc<dyn TaskQueue>,
    time: Arc<dyn TimeSource>,
    config: WorkflowConfig,
    /// Per-document transition locks (INVARIANT-4).
    locks: DashMap<DocumentId, Arc<Mutex<()>>>,
}

impl WorkflowEngine {
    /// Create a new engine with the given dependencies.
    pub fn new(deps: WorkflowDependencies, config: WorkflowConfig) -> Self {
        Self {
            store: deps.store,
            blobs: deps.blobs,
            audit: deps.audit,
            signer: deps.signer,
            gate: deps.gate,
            bus: deps.bus,
            tasks: deps.tasks,
            time: deps.time,
            config,
            locks: DashMap::new(),
        }
    }

    /// Enqueue re-verification of every completed document's approved
    /// version. Body of the periodic integrity sweep; scheduling lives
    /// with the host. Returns the number of tasks enqueued.
    pub fn enqueue_reverification_sweep(&self) -> usize {
        let versions = self.store.completed_approved_versions();
        let mut enqueued = 0;
        for version in versions {
            if self
                .try_enqueue(BackgroundTask::VerifyVersionHash {
                    version_id: version.id,
                    expected: version.content_hash.clone(),
                })
                .is_ok()
            {
                enqueued += 1;
            }
        }
        info!(enqueued, "[vd-03] Re-verification sweep enqueued");
        enqueued
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn lock_for(&self, document: DocumentId) -> Arc<Mutex<()>> {
        self.locks
            .entry(document)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn fetch(&self, id: DocumentId) -> Result<Document, WorkflowError> {
        self.store
            .document(id)
            .ok_or(WorkflowError::DocumentNotFound { id })
    }

    /// Record a refused transition. The denied-action entry is the only
    /// side effect a validation failure may have.
    fn audit_denied(
        &self,
        actor: &Actor,
        operation: Operation,
        document: Option<DocumentId>,
        reason: &str,
    ) -> Result<(), WorkflowError> {
        let mut draft = AuditDraft::new(AuditAction::ActionDenied)
            .actor(actor.id)
            .detail("operation", operation.to_string())
            .detail("reason", reason);
        if let Some(document) = document {
            draft = draft.document(document);
        }
        self.audit.append(draft)?;
        Ok(())
    }

    fn check_role(
        &self,
        actor: &Actor,
        operation: Operation,
        document: Option<DocumentId>,
    ) -> Result<(), WorkflowError> {
        if can(actor.role, operation) {
            return Ok(());
        }
        self.audit_denied(actor, operation, document, "role not permitted")?;
        Err(WorkflowError::RoleDenied {
            role: actor.role,
            operation,
        })
    }

    fn check_state(
        &self,
        actor: &Actor,
        operation: Operation,
        document: &Document,
        accepted: &[DocumentStatus],
        required: &'static str,
    ) -> Result<(), WorkflowError> {
        if accepted.contains(&document.status) {
            return Ok(());
        }
        self.audit_denied(
            actor,
            operation,
            Some(document.id),
            &format!("status is {}", document.status),
        )?;
        Err(WorkflowError::InvalidState {
            current: document.status,
            required,
        })
    }

    fn hash_stored_bytes(&self, storage_ref: &StorageRef) -> Result<Digest, WorkflowError> {
        let mut reader = self.blobs.open(storage_ref)?;
        let (digest, _) = digest_reader(&mut reader).map_err(|e| StorageError::Unavailable {
            message: e.to_string(),
        })?;
        Ok(digest)
    }

    /// Re-verify a version's live bytes against its recorded hash. On
    /// mismatch: audit tamper evidence, raise an integrity alert, abort.
    async fn verify_version_bytes(
        &self,
        version: &DocumentVersion,
        actor: Option<ActorId>,
        stage: &str,
    ) -> Result<Digest, WorkflowError> {
        let digest = self.hash_stored_bytes(&version.storage_ref)?;
        let computed = ContentHash::from_digest(digest);
        if computed == version.content_hash {
            return Ok(digest);
        }

        warn!(
            version = %version.id,
            stage,
            expected = %version.content_hash,
            computed = %computed,
            "[vd-03] Hash mismatch - possible tampering"
        );
        let mut draft = AuditDraft::new(AuditAction::HashVerifiedFail)
            .document(version.document)
            .version(version.id)
            .detail("stored", version.content_hash.as_str())
            .detail("computed", computed.as_str())
            .detail("stage", stage);
        if let Some(actor) = actor {
            draft = draft.actor(actor);
        }
        self.audit.append(draft)?;

        self.bus
            .publish(WorkflowEvent::IntegrityAlert {
                document_id: Some(version.document),
                version_id: version.id,
                expected: version.content_hash.clone(),
                computed: Some(computed.clone()),
            })
            .await;

        Err(WorkflowError::IntegrityViolation {
            version_id: version.id,
            expected: version.content_hash.clone(),
            computed,
        })
    }

    /// Store and hash upload content; refuse bytes already signed
    /// elsewhere (409-equivalent).
    fn ingest_bytes(
        &self,
        actor: &Actor,
        operation: Operation,
        document: Option<DocumentId>,
        mut content: Box<dyn std::io::Read + Send>,
    ) -> Result<(StorageRef, u64, ContentHash), WorkflowError> {
        let (storage_ref, size) = self.blobs.put(&mut *content)?;
        let digest = self.hash_stored_bytes(&storage_ref)?;
        let content_hash = ContentHash::from_digest(digest);

        if operation == Operation::Upload
            && self
                .store
                .hash_on_completed_document(&content_hash)
                .is_some()
        {
            self.audit_denied(
                actor,
                operation,
                document,
                "content already signed on a completed document",
            )?;
            return Err(WorkflowError::DuplicateSignedContent { hash: content_hash });
        }
        Ok((storage_ref, size, content_hash))
    }

    fn try_enqueue(&self, task: BackgroundTask) -> Result<(), ()> {
        if let Err(e) = self.tasks.enqueue(task) {
            // Best-effort: a full or missing queue never fails the
            // transition that produced the task.
            warn!(error = %e, "[vd-03] Background task dropped");
            return Err(());
        }
        Ok(())
    }

    fn enqueue_notify(
        &self,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        document_id: DocumentId,
    ) {
        let _ = self.try_enqueue(BackgroundTask::Notify {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            document_id: Some(document_id),
        });
    }

    fn new_version(
        &self,
        document: DocumentId,
        uploader: ActorId,
        content_hash: ContentHash,
        storage_ref: StorageRef,
        filename: String,
        size: u64,
        notes: Option<String>,
    ) -> DocumentVersion {
        DocumentVersion {
            id: VersionId::new(),
            document,
            version_number: self.store.next_version_number(document),
            uploader,
            content_hash,
            storage_ref,
            filename,
            size,
            uploaded_at: self.time.now(),
            notes,
        }
    }

    async fn finish_upload(
        &self,
        document_id: DocumentId,
        version: DocumentVersion,
        batch: TransitionBatch,
    ) -> Result<Document, WorkflowError> {
        self.store.commit(batch)?;
        info!(
            document = %document_id,
            version = version.version_number,
            "[vd-03] Version uploaded"
        );

        self.bus
            .publish(WorkflowEvent::DocumentSubmitted {
                document_id,
                version_id: version.id,
                version_number: version.version_number,
                content_hash: version.content_hash.clone(),
            })
            .await;

        let _ = self.try_enqueue(BackgroundTask::VerifyVersionHash {
            version_id: version.id,
            expected: version.content_hash.clone(),
        });
        self.enqueue_notify(
            "role:CHECKER",
            format!("[PENDING] Review requested: {document_id}"),
            format!("Version {} awaits review.", version.version_number),
            document_id,
        );

        self.fetch(document_id)
    }
}

#[async_trait]
impl WorkflowApi for WorkflowEngine {
    async fn upload(
        &self,
        actor: Actor,
        request: UploadRequest,
    ) -> Result<Document, WorkflowError> {
        self.check_role(&actor, Operation::Upload, request.document)?;

        match request.document {
            None => {
                // New document: no lock needed, nothing can race a fresh ID.
                let (storage_ref, size, content_hash) =
                    self.ingest_bytes(&actor, Operation::Upload, None, request.content)?;

                let document = Document {
                    id: DocumentId::new(),
                    title: request.title,
                    creator: actor.id,
                    status: DocumentStatus::Pending,
                    metadata: request.metadata,
                    approved_version: None,
                    created_at: self.time.now(),
                };
                let document_id = document.id;
                let version = self.new_version(
                    document_id,
                    actor.id,
                    content_hash,
                    storage_ref,
                    request.filename.clone(),
                    size,
                    request.notes,
                );

                let batch = TransitionBatch::new(
                    AuditDraft::new(AuditAction::Upload)
                        .actor(actor.id)
                        .document(document_id)
                        .version(version.id)
                        .detail("filename", request.filename)
                        .detail("size", size.to_string())
                        .detail("version_number", version.version_number.to_string()),
                )
                .op(RecordOp::InsertDocument(document))
                .op(RecordOp::InsertVersion(version.clone()));

                self.finish_upload(document_id, version, batch).await
            }
            Some(document_id) => {
                let lock = self.lock_for(document_id);
                let _guard = lock.lock().await;

                let document = self.fetch(document_id)?;
                self.check_state(
                    &actor,
                    Operation::Upload,
                    &document,
                    &[DocumentStatus::Pending, DocumentStatus::Rejected],
                    "PENDING or REJECTED",
                )?;

                let (storage_ref, size, content_hash) = self.ingest_bytes(
                    &actor,
                    Operation::Upload,
                    Some(document_id),
                    request.content,
                )?;
                let version = self.new_version(
                    document_id,
                    actor.id,
                    content_hash,
                    storage_ref,
                    request.filename.clone(),
                    size,
                    request.notes,
                );

                // A re-upload restarts review: back to PENDING with no
                // approved version.
                let batch = TransitionBatch::new(
                    AuditDraft::new(AuditAction::Upload)
                        .actor(actor.id)
                        .document(document_id)
                        .version(version.id)
                        .detail("filename", request.filename)
                        .detail("size", size.to_string())
                        .detail("version_number", version.version_number.to_string()),
                )
                .op(RecordOp::InsertVersion(version.clone()))
                .op(RecordOp::SetStatus {
                    document: document_id,
                    status: DocumentStatus::Pending,
                })
                .op(RecordOp::SetApprovedVersion {
                    document: document_id,
                    version: None,
                });

                self.finish_upload(document_id, version, batch).await
            }
        }
    }

    async fn approve(
        &self,
        actor: Actor,
        document_id: DocumentId,
        reason: Option<String>,
    ) -> Result<Document, WorkflowError> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;

        let document = self.fetch(document_id)?;
        self.check_role(&actor, Operation::Approve, Some(document_id))?;
        self.check_state(
            &actor,
            Operation::Approve,
            &document,
            &[DocumentStatus::Pending],
            "PENDING",
        )?;

        let latest = self
            .store
            .latest_version(document_id)
            .ok_or_else(|| WorkflowError::Inconsistent {
                message: format!("document {document_id} has no versions"),
            })?;

        let mut draft = AuditDraft::new(AuditAction::Approve)
            .actor(actor.id)
            .document(document_id)
            .version(latest.id);
        if let Some(reason) = reason {
            draft = draft.detail("reason", reason);
        }
        let batch = TransitionBatch::new(draft)
            .op(RecordOp::SetStatus {
                document: document_id,
                status: DocumentStatus::ApprovedForSigning,
            })
            .op(RecordOp::SetApprovedVersion {
                document: document_id,
                version: Some(latest.id),
            });
        self.store.commit(batch)?;
        info!(document = %document_id, version = latest.version_number, "[vd-03] Approved for signing");

        self.bus
            .publish(WorkflowEvent::DocumentApproved {
                document_id,
                version_id: latest.id,
            })
            .await;
        self.enqueue_notify(
            format!("actor:{}", document.creator),
            format!("[APPROVED] {}", document.title),
            "Your document was approved and is ready for signing.".to_string(),
            document_id,
        );
        self.enqueue_notify(
            "role:MANAGER",
            format!("[SIGNING] Awaiting signature: {}", document.title),
            "An approved document awaits signing.".to_string(),
            document_id,
        );

        self.fetch(document_id)
    }

    async fn reject(
        &self,
        actor: Actor,
        document_id: DocumentId,
        reason: &str,
    ) -> Result<Document, WorkflowError> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;

        let document = self.fetch(document_id)?;
        self.check_role(&actor, Operation::Reject, Some(document_id))?;
        self.check_state(
            &actor,
            Operation::Reject,
            &document,
            &[DocumentStatus::Pending],
            "PENDING",
        )?;

        // Refused before any state mutation.
        if reason.trim().is_empty() {
            self.audit_denied(&actor, Operation::Reject, Some(document_id), "empty reason")?;
            return Err(WorkflowError::EmptyRejectReason);
        }

        let batch = TransitionBatch::new(
            AuditDraft::new(AuditAction::Reject)
                .actor(actor.id)
                .document(document_id)
                .detail("reason", reason),
        )
        .op(RecordOp::SetStatus {
            document: document_id,
            status: DocumentStatus::Rejected,
        });
        self.store.commit(batch)?;
        info!(document = %document_id, reason, "[vd-03] Rejected");

        self.bus
            .publish(WorkflowEvent::DocumentRejected {
                document_id,
                reason: reason.to_string(),
            })
            .await;
        self.enqueue_notify(
            format!("actor:{}", document.creator),
            format!("[REJECTED] {}", document.title),
            format!("Your document was rejected: {reason}"),
            document_id,
        );

        self.fetch(document_id)
    }

    async fn sign_internal(
        &self,
        actor: Actor,
        document_id: DocumentId,
        notes: Option<String>,
    ) -> Result<(Document, Signature), WorkflowError> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;

        let document = self.fetch(document_id)?;
        self.check_role(&actor, Operation::SignInternal, Some(document_id))?;
        self.check_state(
            &actor,
            Operation::SignInternal,
            &document,
            &[DocumentStatus::ApprovedForSigning],
            "APPROVED_FOR_SIGNING",
        )?;

        let version_id = document
            .approved_version
            .ok_or(WorkflowError::MissingApprovedVersion {
                document: document_id,
            })?;
        let version =
            self.store
                .version(version_id)
                .ok_or_else(|| WorkflowError::Inconsistent {
                    message: format!("approved version {version_id} is not stored"),
                })?;

        // Trust boundary: the bytes must still match what was approved.
        let digest = self
            .verify_version_bytes(&version, Some(actor.id), "sign_internal")
            .await?;

        let signer = self
            .signer
            .as_ref()
            .ok_or(WorkflowError::Crypto(shared_crypto::CryptoError::KeyUnavailable))?;
        let signature_bytes = signer.sign(&digest)?;
        let public_key_pem = signer.public_key_pem()?;

        let mut metadata = shared_types::Metadata::new();
        if let Some(notes) = notes {
            metadata.insert("notes".into(), notes);
        }
        let signature = Signature {
            id: SignatureId::new(),
            version: version.id,
            signer: Some(actor.id),
            kind: SignatureKind::Internal,
            signature_bytes,
            public_key_pem: Some(public_key_pem),
            metadata,
            created_at: self.time.now(),
        };

        let batch = TransitionBatch::new(
            AuditDraft::new(AuditAction::SignInternal)
                .actor(actor.id)
                .document(document_id)
                .version(version.id)
                .detail("signature_id", signature.id.to_string())
                .detail("content_hash", version.content_hash.as_str()),
        )
        .op(RecordOp::InsertSignature(signature.clone()))
        .op(RecordOp::SetStatus {
            document: document_id,
            status: DocumentStatus::CompletedInternal,
        });
        self.store.commit(batch)?;
        info!(document = %document_id, signature = %signature.id, "[vd-03] Signed internally");

        self.bus
            .publish(WorkflowEvent::DocumentSigned {
                document_id,
                version_id: version.id,
                signature_id: signature.id,
                kind: SignatureKind::Internal,
            })
            .await;
        self.enqueue_notify(
            format!("actor:{}", document.creator),
            format!("[SIGNED] {}", document.title),
            "Your document completed internal signing.".to_string(),
            document_id,
        );

        Ok((self.fetch(document_id)?, signature))
    }

    async fn upload_external_signed(
        &self,
        actor: Actor,
        document_id: DocumentId,
        upload: ExternalSignedUpload,
    ) -> Result<(Document, Signature), WorkflowError> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;

        let document = self.fetch(document_id)?;
        self.check_role(&actor, Operation::UploadExternalSigned, Some(document_id))?;
        self.check_state(
            &actor,
            Operation::UploadExternalSigned,
            &document,
            &[DocumentStatus::ApprovedForSigning],
            "APPROVED_FOR_SIGNING",
        )?;

        let (storage_ref, size, content_hash) = self.ingest_bytes(
            &actor,
            Operation::UploadExternalSigned,
            Some(document_id),
            upload.content,
        )?;
        let version = self.new_version(
            document_id,
            actor.id,
            content_hash.clone(),
            storage_ref,
            upload.filename.clone(),
            size,
            Some("Externally-signed file".to_string()),
        );

        // The embedded signature stays inside the file; the record keeps
        // the signed file's digest and the certificate, if supplied.
        let digest_bytes = content_hash
            .to_digest()
            .map(|d| d.to_vec())
            .unwrap_or_default();
        let signature = Signature {
            id: SignatureId::new(),
            version: version.id,
            signer: None,
            kind: SignatureKind::External,
            signature_bytes: digest_bytes,
            public_key_pem: upload.certificate,
            metadata: upload.metadata,
            created_at: self.time.now(),
        };

        let batch = TransitionBatch::new(
            AuditDraft::new(AuditAction::UploadSignedExternal)
                .actor(actor.id)
                .document(document_id)
                .version(version.id)
                .detail("filename", upload.filename)
                .detail("signature_id", signature.id.to_string())
                .detail("version_number", version.version_number.to_string()),
        )
        .op(RecordOp::InsertVersion(version.clone()))
        .op(RecordOp::InsertSignature(signature.clone()))
        .op(RecordOp::SetApprovedVersion {
            document: document_id,
            version: Some(version.id),
        })
        .op(RecordOp::SetStatus {
            document: document_id,
            status: DocumentStatus::CompletedExternal,
        });
        self.store.commit(batch)?;
        info!(document = %document_id, version = version.version_number, "[vd-03] External signature ingested");

        self.bus
            .publish(WorkflowEvent::DocumentSigned {
                document_id,
                version_id: version.id,
                signature_id: signature.id,
                kind: SignatureKind::External,
            })
            .await;
        let _ = self.try_enqueue(BackgroundTask::VerifyVersionHash {
            version_id: version.id,
            expected: version.content_hash.clone(),
        });
        self.enqueue_notify(
            format!("actor:{}", document.creator),
            format!("[SIGNED] {}", document.title),
            "Your document completed external signing.".to_string(),
            document_id,
        );

        Ok((self.fetch(document_id)?, signature))
    }

    async fn download_approved(
        &self,
        actor: Actor,
        document_id: DocumentId,
    ) -> Result<(CapabilityToken, DocumentVersion), WorkflowError> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;

        let document = self.fetch(document_id)?;

        // Reviewers, signers, and admins may download; so may the
        // document's creator regardless of role.
        if !can(actor.role, Operation::DownloadApproved) && actor.id != document.creator {
            self.audit_denied(
                &actor,
                Operation::DownloadApproved,
                Some(document_id),
                "role not permitted and not the creator",
            )?;
            return Err(WorkflowError::RoleDenied {
                role: actor.role,
                operation: Operation::DownloadApproved,
            });
        }

        let version_id = document
            .approved_version
            .ok_or(WorkflowError::MissingApprovedVersion {
                document: document_id,
            })?;
        let version =
            self.store
                .version(version_id)
                .ok_or_else(|| WorkflowError::Inconsistent {
                    message: format!("approved version {version_id} is not stored"),
                })?;

        // Trust boundary: never hand out a capability for bytes that no
        // longer match their recorded hash.
        self.verify_version_bytes(&version, Some(actor.id), "download_approved")
            .await?;

        let token = self.gate.issue(version.id, self.config.download_ttl)?;

        self.audit.append(
            AuditDraft::new(AuditAction::DownloadApproved)
                .actor(actor.id)
                .document(document_id)
                .version(version.id)
                .detail("ttl_secs", self.config.download_ttl.num_seconds().to_string()),
        )?;
        self.bus
            .publish(WorkflowEvent::DownloadIssued {
                document_id,
                version_id: version.id,
            })
            .await;

        Ok((token, version))
    }

    async fn verify_signature(&self, signature_id: SignatureId) -> Result<bool, WorkflowError> {
        let signature =
            self.store
                .signature(signature_id)
                .ok_or(WorkflowError::SignatureNotFound { id: signature_id })?;
        let version =
            self.store
                .version(signature.version)
                .ok_or_else(|| WorkflowError::Inconsistent {
                    message: format!("signed version {} is not stored", signature.version),
                })?;

        let digest = self.hash_stored_bytes(&version.storage_ref)?;
        let computed = ContentHash::from_digest(digest);
        if computed != version.content_hash {
            self.audit.append(
                AuditDraft::new(AuditAction::HashVerifiedFail)
                    .document(version.document)
                    .version(version.id)
                    .detail("stored", version.content_hash.as_str())
                    .detail("computed", computed.as_str())
                    .detail("stage", "verify_signature"),
            )?;
            self.bus
                .publish(WorkflowEvent::IntegrityAlert {
                    document_id: Some(version.document),
                    version_id: version.id,
                    expected: version.content_hash.clone(),
                    computed: Some(computed),
                })
                .await;
            return Ok(false);
        }

        let verified = match signature.kind {
            SignatureKind::Internal => {
                let pem = signature
                    .public_key_pem
                    .as_deref()
                    .ok_or_else(|| WorkflowError::Inconsistent {
                        message: format!("internal signature {signature_id} has no public key"),
                    })?;
                shared_crypto::verify_pss(&digest, &signature.signature_bytes, pem)?
            }
            // External signatures live inside the file; intact bytes are
            // all the engine can attest to.
            SignatureKind::External => true,
        };

        self.audit.append(
            AuditDraft::new(if verified {
                AuditAction::HashVerified
            } else {
                AuditAction::HashVerifiedFail
            })
            .document(version.document)
            .version(version.id)
            .detail("signature_id", signature_id.to_string())
            .detail("stage", "verify_signature"),
        )?;
        Ok(verified)
    }
}
