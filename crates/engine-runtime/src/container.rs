//! # Engine Container
//!
//! Builds every subsystem from an [`EngineConfig`], injects dependencies,
//! and starts the background worker.

use crate::config::{EngineConfig, StorageBackend};
use anyhow::{Context, Result};
use chrono::Duration;
use shared_bus::InMemoryEventBus;
use shared_crypto::PssSigner;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use vd_01_document_store::{
    BlobStorage, DocumentStore, FsBlobStore, InMemoryBlobStore, SystemTimeSource, TimeSource,
};
use vd_02_audit_trail::InMemoryAuditTrail;
use vd_03_workflow_engine::service::WorkflowDependencies;
use vd_03_workflow_engine::{
    BackgroundWorker, InMemoryTaskQueue, RetryPolicy, TracingNotifier, WorkflowConfig,
    WorkflowEngine,
};
use vd_04_download_gate::{DownloadGate, GateSecret};

/// A fully wired engine plus the shared infrastructure handles the host
/// application needs.
pub struct EngineContainer {
    /// The workflow API implementation.
    pub engine: Arc<WorkflowEngine>,
    /// The event bus (subscribe for notifications/dashboards).
    pub bus: Arc<InMemoryEventBus>,
    /// The audit trail (query access).
    pub trail: Arc<InMemoryAuditTrail>,
    /// The metadata store (query access).
    pub store: Arc<DocumentStore>,
    /// The capability gate (redeem access).
    pub gate: Arc<DownloadGate>,
    /// Background worker task.
    pub worker: JoinHandle<()>,
}

impl EngineContainer {
    /// Build and start an engine from configuration.
    pub fn build(config: &EngineConfig) -> Result<Self> {
        let trail = Arc::new(InMemoryAuditTrail::new());
        let store = Arc::new(DocumentStore::new(trail.clone()));
        let bus = Arc::new(InMemoryEventBus::new());
        let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);

        let blobs: Arc<dyn BlobStorage> = match &config.storage {
            StorageBackend::InMemory => {
                info!("[runtime] Using in-memory byte storage");
                Arc::new(InMemoryBlobStore::new())
            }
            StorageBackend::Filesystem(root) => {
                info!(root = %root.display(), "[runtime] Using filesystem byte storage");
                Arc::new(FsBlobStore::new(root.clone()).context("init filesystem blob store")?)
            }
        };

        let signer = match &config.signing.private_key_pem_path {
            Some(path) => {
                let pem = std::fs::read_to_string(path)
                    .with_context(|| format!("read signing key {}", path.display()))?;
                Some(Arc::new(
                    PssSigner::from_pkcs8_pem(&pem).context("parse signing key")?,
                ))
            }
            None if config.signing.generate_dev_key => {
                info!(
                    bits = config.signing.dev_key_bits,
                    "[runtime] Generating development signing key"
                );
                Some(Arc::new(
                    PssSigner::generate(config.signing.dev_key_bits)
                        .context("generate signing key")?,
                ))
            }
            None => None,
        };

        let gate = Arc::new(DownloadGate::new(
            store.clone(),
            blobs.clone(),
            trail.clone(),
            time.clone(),
            GateSecret::new(config.security.gate_secret),
        ));

        let (tasks, task_receiver) = InMemoryTaskQueue::new();
        let notifier = Arc::new(TracingNotifier);

        let workflow_config = WorkflowConfig {
            download_ttl: config
                .download_ttl_secs
                .map(Duration::seconds)
                .unwrap_or_else(|| WorkflowConfig::default().download_ttl),
        };
        let engine = Arc::new(WorkflowEngine::new(
            WorkflowDependencies {
                store: store.clone(),
                blobs: blobs.clone(),
                audit: trail.clone(),
                signer,
                gate: gate.clone(),
                bus: bus.clone(),
                tasks: Arc::new(tasks),
                time,
            },
            workflow_config,
        ));

        let worker = BackgroundWorker::new(
            store.clone(),
            blobs,
            trail.clone(),
            notifier,
            bus.clone(),
            RetryPolicy::default(),
        );
        let worker = tokio::spawn(async move { worker.run(task_receiver).await });

        info!("[runtime] Engine container ready");
        Ok(Self {
            engine,
            bus,
            trail,
            store,
            gate,
            worker,
        })
    }
}
