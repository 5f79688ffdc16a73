//! # Outbound Ports (Driven Ports)
//!
//! Side-effect channels the engine requires the host application to
//! provide: a notifier and a background task queue. Both are best-effort;
//! their failure never rolls back or blocks a committed transition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{ContentHash, DocumentId, Metadata, VersionId};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// A queued background job. Delivery is at-least-once, so handlers must
/// be idempotent (re-verifying a hash twice is harmless).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackgroundTask {
    /// Recompute a version's hash against its recorded value.
    VerifyVersionHash {
        /// The version to re-verify.
        version_id: VersionId,
        /// The hash recorded at upload time.
        expected: ContentHash,
    },
    /// Dispatch a notification.
    Notify {
        /// Logical recipient ("role:CHECKER", "actor:<id>").
        recipient: String,
        /// Subject line.
        subject: String,
        /// Message body.
        body: String,
        /// The document this notification concerns, if any.
        document_id: Option<DocumentId>,
    },
}

/// Errors from enqueueing background work.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue transport refused the task. Transient by definition;
    /// callers log and move on.
    #[error("Task queue unavailable: {message}")]
    Unavailable {
        /// Transport-specific description.
        message: String,
    },
}

/// Abstract interface to the background task queue.
pub trait TaskQueue: Send + Sync {
    /// Enqueue a task for asynchronous execution.
    fn enqueue(&self, task: BackgroundTask) -> Result<(), QueueError>;
}

/// Errors from notification delivery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Delivery failed but may succeed on retry.
    #[error("Notification delivery failed: {message}")]
    Transient {
        /// Transport-specific description.
        message: String,
    },
    /// Delivery can never succeed (bad recipient, permanent rejection).
    #[error("Notification permanently rejected: {message}")]
    Permanent {
        /// Transport-specific description.
        message: String,
    },
}

/// Abstract interface for notification delivery.
///
/// Fire-and-forget from the workflow's point of view: the engine only
/// ever reaches this through the task queue, never inside a transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        context: &Metadata,
    ) -> Result<(), NotifyError>;
}

// =============================================================================
// ADAPTER IMPLEMENTATIONS
// Production: host-supplied (email gateway, distributed queue)
// Testing/demo: in-memory channel and log-only notifier below
// =============================================================================

/// In-memory task queue over an unbounded tokio channel.
pub struct InMemoryTaskQueue {
    sender: mpsc::UnboundedSender<BackgroundTask>,
}

impl InMemoryTaskQueue {
    /// Create the queue and the receiver the worker consumes.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BackgroundTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TaskQueue for InMemoryTaskQueue {
    fn enqueue(&self, task: BackgroundTask) -> Result<(), QueueError> {
        self.sender
            .send(task)
            .map_err(|e| QueueError::Unavailable {
                message: e.to_string(),
            })
    }
}

/// Notifier that only logs. Used by the demo runtime and tests.
#[derive(Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        _body: &str,
        _context: &Metadata,
    ) -> Result<(), NotifyError> {
        info!(recipient, subject, "[vd-03] Notification dispatched");
        Ok(())
    }
}
