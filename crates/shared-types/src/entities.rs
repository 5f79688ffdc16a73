//! # Core Domain Entities
//!
//! Defines the document lifecycle records shared across subsystems.
//!
//! ## Clusters
//!
//! - **Lifecycle**: `Document`, `DocumentStatus`
//! - **Content**: `DocumentVersion`, `ContentHash`, `StorageRef`
//! - **Signing**: `Signature`, `SignatureKind`

use crate::actor::ActorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Opaque metadata bag attached to documents and signatures.
pub type Metadata = BTreeMap<String, String>;

/// Unique identifier for a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

/// Unique identifier for a [`DocumentVersion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(pub Uuid);

/// Unique identifier for a [`Signature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureId(pub Uuid);

macro_rules! impl_id {
    ($id:ident) => {
        impl $id {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $id {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

impl_id!(DocumentId);
impl_id!(VersionId);
impl_id!(SignatureId);

/// Hex-encoded SHA-256 digest of a version's bytes.
///
/// The content hash is the fingerprint every trust-sensitive operation
/// (sign, download) re-verifies against live bytes, and it is the payload
/// that gets signed — never the raw file content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a 32-byte digest as its lowercase hex encoding.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Wrap an already hex-encoded digest. The caller is responsible for
    /// only passing well-formed hex.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to raw digest bytes, if well-formed.
    pub fn to_digest(&self) -> Option<[u8; 32]> {
        let bytes = hex::decode(&self.0).ok()?;
        bytes.try_into().ok()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to externally stored bytes.
///
/// The core never interprets the handle; only the `BlobStorage` adapter
/// that minted it can resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageRef(pub String);

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a [`Document`].
///
/// Transitions only ever follow:
/// `Pending → {ApprovedForSigning | Rejected}`,
/// `ApprovedForSigning → {CompletedInternal | CompletedExternal}`.
/// A rejected document accepts a new version (resetting to `Pending`)
/// rather than reopening the rejected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    /// Awaiting review.
    Pending,
    /// Approved by a checker; awaiting a signature.
    ApprovedForSigning,
    /// Rejected by a checker. Terminal for this version chain.
    Rejected,
    /// Signed with the internal RSA-PSS key. Terminal.
    CompletedInternal,
    /// Completed by ingesting an externally-signed file. Terminal.
    CompletedExternal,
}

impl DocumentStatus {
    /// Whether this status is terminal for the document's trust chain.
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            DocumentStatus::CompletedInternal | DocumentStatus::CompletedExternal
        )
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::ApprovedForSigning => "APPROVED_FOR_SIGNING",
            DocumentStatus::Rejected => "REJECTED",
            DocumentStatus::CompletedInternal => "COMPLETED_INTERNAL",
            DocumentStatus::CompletedExternal => "COMPLETED_EXTERNAL",
        };
        f.write_str(name)
    }
}

/// Kind of a recorded [`Signature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureKind {
    /// Produced by the engine's own RSA-PSS key over the content hash.
    Internal,
    /// Embedded in an externally-signed file ingested as a new version.
    External,
}

impl fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignatureKind::Internal => "INTERNAL",
            SignatureKind::External => "EXTERNAL",
        };
        f.write_str(name)
    }
}

/// A document under workflow control.
///
/// Created on first upload and never physically deleted; status changes
/// model the end of its life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identity.
    pub id: DocumentId,
    /// Human-readable title.
    pub title: String,
    /// Actor who created the document (first uploader).
    pub creator: ActorId,
    /// Current lifecycle state.
    pub status: DocumentStatus,
    /// Opaque key-value bag supplied at creation.
    pub metadata: Metadata,
    /// The version whose content hash was verified at approval time.
    ///
    /// If set, it must reference a version of this document.
    pub approved_version: Option<VersionId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One immutable uploaded revision of a document.
///
/// `version_number` starts at 1 and is always `last + 1`; re-uploads create
/// new records, never edit existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    /// Stable identity.
    pub id: VersionId,
    /// Parent document.
    pub document: DocumentId,
    /// Strictly increasing per document, unique per (document, number).
    pub version_number: u32,
    /// Actor who uploaded this version.
    pub uploader: ActorId,
    /// Digest of the bytes `storage_ref` resolves to.
    pub content_hash: ContentHash,
    /// Opaque handle into external byte storage.
    pub storage_ref: StorageRef,
    /// Original filename, returned on download.
    pub filename: String,
    /// Size of the stored bytes.
    pub size: u64,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
    /// Free-form uploader notes.
    pub notes: Option<String>,
}

/// A recorded digital signature over one document version.
///
/// Created exactly once per successful sign operation; immutable; never
/// deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Stable identity.
    pub id: SignatureId,
    /// The signed version.
    pub version: VersionId,
    /// Signing actor; `None` for external signatures.
    pub signer: Option<ActorId>,
    /// Internal (engine key) or external (ingested file).
    pub kind: SignatureKind,
    /// For `Internal`: the RSA-PSS signature over the content hash digest.
    /// For `External`: the raw digest of the signed file (the embedded
    /// signature itself lives inside the uploaded bytes).
    pub signature_bytes: Vec<u8>,
    /// For `Internal`: SPKI PEM of the verifying key. For `External`: the
    /// supplied certificate, if any.
    pub public_key_pem: Option<String>,
    /// Opaque key-value bag (notes, certificate metadata).
    pub metadata: Metadata,
    /// Signing timestamp.
    pub created_at: DateTime<Utc>,
}
