//! # Workflow Engine (vd-03)
//!
//! The document state machine: validates role and state preconditions,
//! executes transitions, re-verifies content hashes at trust boundaries,
//! writes audit entries, and emits outbound events.
//!
//! ## State Machine
//!
//! ```text
//!              upload                       approve
//! (new) ────────────────→ PENDING ────────────────────→ APPROVED_FOR_SIGNING
//!                          ↑   │                            │            │
//!                 re-upload│   │ reject          sign       │            │ upload
//!                          │   ↓                 internal   │            │ externally-signed
//!                        REJECTED                           ↓            ↓
//!                                              COMPLETED_INTERNAL  COMPLETED_EXTERNAL
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Gated Transitions | Role and status checked before any effect |
//! | 2 | Trust Boundaries | Hash recomputed before sign and download |
//! | 3 | Atomic Units | Record mutations + audit entry commit together |
//! | 4 | Serialized Documents | Same-document transitions never race |
//! | 5 | Post-Commit Side Effects | Events/tasks fire only after commit |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Pure policy table and error taxonomy
//! - `ports/` - Inbound API trait, outbound Notifier/TaskQueue ports
//! - `service.rs` - The engine implementing the API
//! - `worker.rs` - Background task consumer (re-verification, notify)

pub mod domain;
pub mod ports;
pub mod service;
pub mod worker;

// Re-export key types for convenience
pub use domain::errors::WorkflowError;
pub use domain::policy::{can, Operation};
pub use ports::inbound::{ExternalSignedUpload, UploadRequest, WorkflowApi};
pub use ports::outbound::{
    BackgroundTask, InMemoryTaskQueue, Notifier, NotifyError, QueueError, TaskQueue,
    TracingNotifier,
};
pub use service::{WorkflowConfig, WorkflowEngine};
pub use worker::{BackgroundWorker, RetryPolicy};
