//! # Test Fixtures
//!
//! One fully wired engine over in-memory adapters, with a controllable
//! clock, an inspectable task queue, and handles to every collaborator.

use chrono::Utc;
use shared_bus::InMemoryEventBus;
use shared_crypto::PssSigner;
use shared_types::{Actor, Document, DocumentId, Role, StorageRef};
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::mpsc;
use vd_01_document_store::{DocumentStore, InMemoryBlobStore, ManualTimeSource};
use vd_02_audit_trail::InMemoryAuditTrail;
use vd_03_workflow_engine::service::WorkflowDependencies;
use vd_03_workflow_engine::{
    BackgroundTask, BackgroundWorker, InMemoryTaskQueue, RetryPolicy, TracingNotifier,
    UploadRequest, WorkflowApi, WorkflowConfig, WorkflowEngine,
};
use vd_04_download_gate::{DownloadGate, GateSecret};

/// A fully wired engine with every collaborator exposed.
pub struct EngineFixture {
    pub engine: Arc<WorkflowEngine>,
    pub store: Arc<DocumentStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub trail: Arc<InMemoryAuditTrail>,
    pub bus: Arc<InMemoryEventBus>,
    pub gate: Arc<DownloadGate>,
    pub clock: Arc<ManualTimeSource>,
    pub task_rx: std::sync::Mutex<mpsc::UnboundedReceiver<BackgroundTask>>,
    pub sender: Actor,
    pub checker: Actor,
    pub manager: Actor,
    pub admin: Actor,
}

impl EngineFixture {
    /// Build with an internal signing key (1024-bit: fast for tests).
    pub fn new() -> Self {
        Self::build(Some(Arc::new(PssSigner::generate(1024).unwrap())))
    }

    /// Build without a signing key; internal signing fails with
    /// `KeyUnavailable`.
    pub fn without_signer() -> Self {
        Self::build(None)
    }

    fn build(signer: Option<Arc<PssSigner>>) -> Self {
        let trail = Arc::new(InMemoryAuditTrail::new());
        let store = Arc::new(DocumentStore::new(trail.clone()));
        let blobs = Arc::new(InMemoryBlobStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(ManualTimeSource::starting_at(Utc::now()));
        let (tasks, task_rx) = InMemoryTaskQueue::new();

        let gate = Arc::new(DownloadGate::new(
            store.clone(),
            blobs.clone(),
            trail.clone(),
            clock.clone(),
            GateSecret::random(),
        ));
        let engine = Arc::new(WorkflowEngine::new(
            WorkflowDependencies {
                store: store.clone(),
                blobs: blobs.clone(),
                audit: trail.clone(),
                signer,
                gate: gate.clone(),
                bus: bus.clone(),
                tasks: Arc::new(tasks),
                time: clock.clone(),
            },
            WorkflowConfig::default(),
        ));

        Self {
            engine,
            store,
            blobs,
            trail,
            bus,
            gate,
            clock,
            task_rx: std::sync::Mutex::new(task_rx),
            sender: Actor::with_role(Role::Sender),
            checker: Actor::with_role(Role::Checker),
            manager: Actor::with_role(Role::Manager),
            admin: Actor::with_role(Role::Admin),
        }
    }

    /// A background worker over the fixture's collaborators.
    pub fn worker(&self) -> BackgroundWorker {
        BackgroundWorker::new(
            self.store.clone(),
            self.blobs.clone(),
            self.trail.clone(),
            Arc::new(TracingNotifier),
            self.bus.clone(),
            RetryPolicy::default(),
        )
    }

    /// Upload a new document as the fixture's SENDER.
    pub async fn submit(&self, title: &str, bytes: &[u8]) -> Document {
        self.engine
            .upload(self.sender, upload_request(title, bytes))
            .await
            .expect("upload")
    }

    /// Storage handle of a document's latest version.
    pub fn latest_storage_ref(&self, document: DocumentId) -> StorageRef {
        self.store
            .latest_version(document)
            .expect("latest version")
            .storage_ref
    }

    /// Drain every currently queued background task.
    pub fn drain_tasks(&self) -> Vec<BackgroundTask> {
        let mut rx = self.task_rx.lock().unwrap();
        let mut tasks = Vec::new();
        while let Ok(task) = rx.try_recv() {
            tasks.push(task);
        }
        tasks
    }
}

impl Default for EngineFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an upload request for a new document.
pub fn upload_request(title: &str, bytes: &[u8]) -> UploadRequest {
    UploadRequest {
        document: None,
        title: title.to_string(),
        filename: format!("{}.pdf", title.to_lowercase().replace(' ', "-")),
        metadata: Default::default(),
        notes: None,
        content: Box::new(Cursor::new(bytes.to_vec())),
    }
}

/// Build an upload request adding a version to an existing document.
pub fn reupload_request(document: DocumentId, bytes: &[u8]) -> UploadRequest {
    UploadRequest {
        document: Some(document),
        title: String::new(),
        filename: "revised.pdf".to_string(),
        metadata: Default::default(),
        notes: Some("Revised after review".to_string()),
        content: Box::new(Cursor::new(bytes.to_vec())),
    }
}
