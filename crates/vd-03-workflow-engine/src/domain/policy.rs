//! # Role Policy
//!
//! One pure function answers "may this role trigger this operation",
//! consulted exactly once per transition. Ownership-based access (a
//! document's creator may download it) is layered on top by the engine;
//! this table is role-only and transport-independent.

use shared_types::Role;
use std::fmt;

/// The gated workflow operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a document or add a version to one.
    Upload,
    /// Approve a pending document for signing.
    Approve,
    /// Reject a pending document.
    Reject,
    /// Sign the approved version with the internal key.
    SignInternal,
    /// Ingest an externally-signed file.
    UploadExternalSigned,
    /// Request a download capability for the approved version.
    DownloadApproved,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Upload => "upload",
            Operation::Approve => "approve",
            Operation::Reject => "reject",
            Operation::SignInternal => "sign_internal",
            Operation::UploadExternalSigned => "upload_external_signed",
            Operation::DownloadApproved => "download_approved",
        };
        f.write_str(name)
    }
}

/// Whether `role` may trigger `operation`.
pub fn can(role: Role, operation: Operation) -> bool {
    match operation {
        Operation::Upload => matches!(role, Role::Sender),
        Operation::Approve | Operation::Reject => matches!(role, Role::Checker | Role::Admin),
        Operation::SignInternal | Operation::UploadExternalSigned => {
            matches!(role, Role::Manager | Role::Admin)
        }
        Operation::DownloadApproved => {
            matches!(role, Role::Checker | Role::Manager | Role::Admin)
        }
    }
}
