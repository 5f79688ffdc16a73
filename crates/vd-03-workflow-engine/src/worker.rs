//! # Background Worker
//!
//! Consumes [`BackgroundTask`]s queued by committed transitions:
//! periodic/deferred hash re-verification and notification dispatch.
//!
//! Execution is decoupled from the triggering transition: failures here
//! are retried with bounded exponential backoff, and anything still
//! failing after the last attempt is logged and dropped — never surfaced
//! to, nor rolled back into, the original caller. Handlers are idempotent
//! because queue delivery is at-least-once.

use crate::ports::outbound::{BackgroundTask, Notifier, NotifyError};
use shared_bus::{EventPublisher, WorkflowEvent};
use shared_crypto::digest_reader;
use shared_types::{ContentHash, Metadata, VersionId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use vd_01_document_store::{BlobStorage, DocumentStore, StorageError};
use vd_02_audit_trail::{AuditAction, AuditDraft, AuditTrail};

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `next_attempt` (2-based).
    fn delay_before(&self, next_attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(next_attempt.saturating_sub(2))
    }
}

enum VerifyOutcome {
    /// Bytes match the recorded hash.
    Match,
    /// Bytes differ from the recorded hash.
    Mismatch(ContentHash),
    /// The bytes are gone from storage.
    MissingBytes,
    /// The version record no longer resolves (stale task).
    UnknownVersion,
}

/// The background task consumer.
pub struct BackgroundWorker {
    store: Arc<DocumentStore>,
    blobs: Arc<dyn BlobStorage>,
    audit: Arc<dyn AuditTrail>,
    notifier: Arc<dyn Notifier>,
    bus: Arc<dyn EventPublisher>,
    retry: RetryPolicy,
}

impl BackgroundWorker {
    /// Create a worker over the given collaborators.
    pub fn new(
        store: Arc<DocumentStore>,
        blobs: Arc<dyn BlobStorage>,
        audit: Arc<dyn AuditTrail>,
        notifier: Arc<dyn Notifier>,
        bus: Arc<dyn EventPublisher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            blobs,
            audit,
            notifier,
            bus,
            retry,
        }
    }

    /// Drain the queue until all senders are dropped.
    pub async fn run(&self, mut receiver: mpsc::UnboundedReceiver<BackgroundTask>) {
        info!("[vd-03] Background worker started");
        while let Some(task) = receiver.recv().await {
            self.handle(task).await;
        }
        info!("[vd-03] Background worker stopped");
    }

    /// Execute one task, retries included.
    pub async fn handle(&self, task: BackgroundTask) {
        match task {
            BackgroundTask::VerifyVersionHash {
                version_id,
                expected,
            } => self.handle_verify(version_id, expected).await,
            BackgroundTask::Notify {
                recipient,
                subject,
                body,
                document_id,
            } => {
                let mut context = Metadata::new();
                if let Some(document_id) = document_id {
                    context.insert("document_id".into(), document_id.to_string());
                }
                self.handle_notify(&recipient, &subject, &body, &context)
                    .await;
            }
        }
    }

    async fn handle_verify(&self, version_id: VersionId, expected: ContentHash) {
        for attempt in 1..=self.retry.max_attempts {
            match self.verify_once(version_id) {
                Ok(VerifyOutcome::Match) => {
                    debug!(version = %version_id, "[vd-03] Background verification passed");
                    self.append_verify_entry(version_id, "success", None);
                    return;
                }
                Ok(VerifyOutcome::Mismatch(computed)) => {
                    warn!(
                        version = %version_id,
                        expected = %expected,
                        computed = %computed,
                        "[vd-03] Background verification found a mismatch"
                    );
                    self.append_verify_entry(version_id, "mismatch", Some(computed.clone()));
                    self.publish_alert(version_id, expected, Some(computed)).await;
                    return;
                }
                Ok(VerifyOutcome::MissingBytes) => {
                    warn!(version = %version_id, "[vd-03] Background verification: bytes missing");
                    self.append_verify_entry(version_id, "missing_bytes", None);
                    self.publish_alert(version_id, expected, None).await;
                    return;
                }
                Ok(VerifyOutcome::UnknownVersion) => {
                    // Stale task for a version this store never saw.
                    warn!(version = %version_id, "[vd-03] Background verification: unknown version");
                    return;
                }
                Err(e) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_before(attempt + 1);
                    debug!(
                        version = %version_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "[vd-03] Transient verification failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        version = %version_id,
                        attempts = self.retry.max_attempts,
                        error = %e,
                        "[vd-03] Background verification gave up"
                    );
                    return;
                }
            }
        }
    }

    fn verify_once(&self, version_id: VersionId) -> Result<VerifyOutcome, StorageError> {
        let Some(version) = self.store.version(version_id) else {
            return Ok(VerifyOutcome::UnknownVersion);
        };

        let mut reader = match self.blobs.open(&version.storage_ref) {
            Ok(reader) => reader,
            Err(StorageError::NotFound { .. }) => return Ok(VerifyOutcome::MissingBytes),
            Err(e) => return Err(e),
        };
        let (digest, _) = digest_reader(&mut reader).map_err(|e| StorageError::Unavailable {
            message: e.to_string(),
        })?;

        let computed = ContentHash::from_digest(digest);
        if computed == version.content_hash {
            Ok(VerifyOutcome::Match)
        } else {
            Ok(VerifyOutcome::Mismatch(computed))
        }
    }

    fn append_verify_entry(
        &self,
        version_id: VersionId,
        outcome: &str,
        computed: Option<ContentHash>,
    ) {
        let document = self.store.version(version_id).map(|v| v.document);
        let mut draft = AuditDraft::new(AuditAction::BackgroundVerify)
            .version(version_id)
            .detail("outcome", outcome);
        if let Some(document) = document {
            draft = draft.document(document);
        }
        if let Some(computed) = computed {
            draft = draft.detail("computed", computed.as_str());
        }
        if let Err(e) = self.audit.append(draft) {
            // Background bookkeeping must not crash the worker.
            error!(version = %version_id, error = %e, "[vd-03] Verify audit append failed");
        }
    }

    async fn publish_alert(
        &self,
        version_id: VersionId,
        expected: ContentHash,
        computed: Option<ContentHash>,
    ) {
        let document_id = self.store.version(version_id).map(|v| v.document);
        self.bus
            .publish(WorkflowEvent::IntegrityAlert {
                document_id,
                version_id,
                expected,
                computed,
            })
            .await;
    }

    async fn handle_notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        context: &Metadata,
    ) {
        for attempt in 1..=self.retry.max_attempts {
            match self.notifier.notify(recipient, subject, body, context).await {
                Ok(()) => {
                    debug!(recipient, subject, "[vd-03] Notification delivered");
                    return;
                }
                Err(NotifyError::Permanent { message }) => {
                    error!(recipient, subject, message, "[vd-03] Notification rejected");
                    return;
                }
                Err(NotifyError::Transient { message }) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_before(attempt + 1);
                    debug!(
                        recipient,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        message,
                        "[vd-03] Notification failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(NotifyError::Transient { message }) => {
                    error!(
                        recipient,
                        subject,
                        attempts = self.retry.max_attempts,
                        message,
                        "[vd-03] Notification gave up"
                    );
                    return;
                }
            }
        }
    }
}
