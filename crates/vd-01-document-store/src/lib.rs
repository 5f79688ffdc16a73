//! # Document Store (vd-01)
//!
//! The authoritative metadata layer for documents, versions, and
//! signatures. Bytes live behind the [`BlobStorage`] outbound port; this
//! crate owns records and their invariants.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Sequential Versions | `version_number` is always last+1, from 1 |
//! | 2 | Immutable Versions | Versions and signatures are insert-only |
//! | 3 | Atomic Transitions | A [`TransitionBatch`] commits whole or not at all |
//! | 4 | Audited Commits | The batch's audit entry persists with the mutations |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Batch operations and store errors
//! - `ports/` - Outbound port traits (blob storage, time) and adapters
//! - `service.rs` - The in-memory store implementing atomic commits

pub mod domain;
pub mod ports;
pub mod service;

// Re-export key types for convenience
pub use domain::batch::{RecordOp, TransitionBatch};
pub use domain::errors::{StorageError, StoreError};
pub use ports::outbound::{
    BlobStorage, FsBlobStore, InMemoryBlobStore, ManualTimeSource, SystemTimeSource, TimeSource,
};
pub use service::DocumentStore;
