//! # Inbound Port (Driving Port)
//!
//! The API the host application calls. Identity arrives pre-authenticated
//! as an [`Actor`]; the engine enforces role and state preconditions only.

use crate::domain::errors::WorkflowError;
use async_trait::async_trait;
use shared_types::{
    Actor, Document, DocumentId, DocumentVersion, Metadata, Signature, SignatureId,
};
use std::io::Read;
use vd_04_download_gate::CapabilityToken;

/// An upload: a brand-new document, or a new version of an existing one.
///
/// `content` is consumed as a stream; the engine never needs the whole
/// payload in memory.
pub struct UploadRequest {
    /// Target document for a re-upload; `None` creates a new document.
    pub document: Option<DocumentId>,
    /// Title for a new document; ignored on re-upload.
    pub title: String,
    /// Original filename, kept for downloads.
    pub filename: String,
    /// Opaque key-value bag stored on a new document.
    pub metadata: Metadata,
    /// Free-form uploader notes for this version.
    pub notes: Option<String>,
    /// The bytes to store.
    pub content: Box<dyn Read + Send>,
}

/// An externally-signed file ingested to complete a document.
pub struct ExternalSignedUpload {
    /// Original filename of the signed file.
    pub filename: String,
    /// Certificate of the external signer, if supplied.
    pub certificate: Option<String>,
    /// Opaque signature metadata (CA name, transaction IDs).
    pub metadata: Metadata,
    /// The signed bytes.
    pub content: Box<dyn Read + Send>,
}

/// The workflow API.
///
/// Every method validates preconditions, executes the transition as one
/// atomic unit (record mutations + audit entry), and only then emits
/// events and background tasks. Errors carry the precise refused
/// precondition.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Upload a document or a new version. Resets status to PENDING and
    /// clears any approved version.
    async fn upload(&self, actor: Actor, request: UploadRequest)
        -> Result<Document, WorkflowError>;

    /// Approve a pending document; freezes the latest version as the
    /// approved one.
    async fn approve(
        &self,
        actor: Actor,
        document_id: DocumentId,
        reason: Option<String>,
    ) -> Result<Document, WorkflowError>;

    /// Reject a pending document. The reason must be non-empty.
    async fn reject(
        &self,
        actor: Actor,
        document_id: DocumentId,
        reason: &str,
    ) -> Result<Document, WorkflowError>;

    /// Sign the approved version with the internal RSA-PSS key after
    /// re-verifying its bytes.
    async fn sign_internal(
        &self,
        actor: Actor,
        document_id: DocumentId,
        notes: Option<String>,
    ) -> Result<(Document, Signature), WorkflowError>;

    /// Ingest an externally-signed file as a new, completed version.
    async fn upload_external_signed(
        &self,
        actor: Actor,
        document_id: DocumentId,
        upload: ExternalSignedUpload,
    ) -> Result<(Document, Signature), WorkflowError>;

    /// Re-verify the approved version's bytes and issue a download
    /// capability for it.
    async fn download_approved(
        &self,
        actor: Actor,
        document_id: DocumentId,
    ) -> Result<(CapabilityToken, DocumentVersion), WorkflowError>;

    /// Re-check a recorded signature against the version's current bytes
    /// and stored public key. `Ok(false)` means "does not verify".
    async fn verify_signature(&self, signature_id: SignatureId) -> Result<bool, WorkflowError>;
}
