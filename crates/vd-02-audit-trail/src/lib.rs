//! # Audit Trail (vd-02)
//!
//! Append-only log of every state-changing or trust-sensitive action in
//! the document workflow.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Append-Only | The public contract has no update or delete |
//! | 2 | Monotonic IDs | Entry IDs strictly increase, assigned at append |
//! | 3 | Dangling-Safe | Actor/document references are nullable |
//!
//! Immutability is structural, not policy: neither the [`AuditTrail`]
//! trait nor [`InMemoryAuditTrail`] expose any mutating operation beyond
//! `append`, so a code path that alters history cannot be written against
//! this crate.

pub mod entry;
pub mod errors;
pub mod trail;

pub use entry::{AuditAction, AuditDraft, AuditEntry};
pub use errors::AuditError;
pub use trail::{AuditQuery, AuditTrail, InMemoryAuditTrail, SortOrder};
