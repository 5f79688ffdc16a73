//! # Download Gate Service
//!
//! Issues capabilities and redeems them, re-verifying integrity at the
//! redemption boundary.

use crate::errors::DownloadError;
use crate::token::{CapabilityToken, GateSecret, TokenPayload};
use chrono::Duration;
use shared_crypto::digest_reader;
use shared_types::{ContentHash, StorageRef, VersionId};
use std::sync::Arc;
use tracing::{info, warn};
use vd_01_document_store::{BlobStorage, DocumentStore, StorageError, TimeSource};
use vd_02_audit_trail::{AuditAction, AuditDraft, AuditTrail};

/// What a successfully redeemed capability resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadGrant {
    /// The granted version.
    pub version_id: VersionId,
    /// Handle the host application streams bytes from.
    pub storage_ref: StorageRef,
    /// Filename recorded at upload time.
    pub filename: String,
}

/// The download gate.
pub struct DownloadGate {
    store: Arc<DocumentStore>,
    blobs: Arc<dyn BlobStorage>,
    audit: Arc<dyn AuditTrail>,
    time: Arc<dyn TimeSource>,
    secret: GateSecret,
}

impl DownloadGate {
    /// Create a gate over the given store and storage.
    pub fn new(
        store: Arc<DocumentStore>,
        blobs: Arc<dyn BlobStorage>,
        audit: Arc<dyn AuditTrail>,
        time: Arc<dyn TimeSource>,
        secret: GateSecret,
    ) -> Self {
        Self {
            store,
            blobs,
            audit,
            time,
            secret,
        }
    }

    /// Issue a capability for one version, valid for `ttl`.
    ///
    /// The version must exist at issuance; integrity is checked again at
    /// redemption, not here.
    pub fn issue(
        &self,
        version_id: VersionId,
        ttl: Duration,
    ) -> Result<CapabilityToken, DownloadError> {
        if self.store.version(version_id).is_none() {
            return Err(DownloadError::NotFound { version_id });
        }

        let now = self.time.now();
        let payload = TokenPayload {
            version_id,
            issued_at_ms: now.timestamp_millis(),
            expires_at_ms: (now + ttl).timestamp_millis(),
            nonce: rand::random(),
        };
        let token = CapabilityToken::seal(&payload, &self.secret)?;
        info!(version = %version_id, ttl_secs = ttl.num_seconds(), "[vd-04] Capability issued");
        Ok(token)
    }

    /// Redeem a capability, re-verifying the version's bytes first.
    ///
    /// Order of checks: authentication tag, expiry, version lookup, live
    /// hash. A hash mismatch is audited as `HASH_VERIFIED_FAIL` and is a
    /// hard stop — never retried automatically.
    pub fn redeem(&self, token: &CapabilityToken) -> Result<DownloadGrant, DownloadError> {
        let payload = token.open(&self.secret)?;

        let expires_at = payload.expires_at();
        if self.time.now() > expires_at {
            return Err(DownloadError::Expired {
                expired_at: expires_at,
            });
        }

        let version_id = payload.version_id;
        let version = self
            .store
            .version(version_id)
            .ok_or(DownloadError::NotFound { version_id })?;

        let mut reader = match self.blobs.open(&version.storage_ref) {
            Ok(reader) => reader,
            Err(StorageError::NotFound { .. }) => {
                return Err(DownloadError::NotFound { version_id })
            }
            Err(e) => return Err(e.into()),
        };
        let (digest, _) = digest_reader(&mut reader).map_err(|e| StorageError::Unavailable {
            message: e.to_string(),
        })?;
        let computed = ContentHash::from_digest(digest);

        if computed != version.content_hash {
            warn!(
                version = %version_id,
                expected = %version.content_hash,
                computed = %computed,
                "[vd-04] Hash mismatch at redemption - possible tampering"
            );
            self.audit.append(
                AuditDraft::new(AuditAction::HashVerifiedFail)
                    .document(version.document)
                    .version(version_id)
                    .detail("stored", version.content_hash.as_str())
                    .detail("computed", computed.as_str())
                    .detail("stage", "download_redeem"),
            )?;
            return Err(DownloadError::IntegrityViolation {
                version_id,
                expected: version.content_hash,
                computed,
            });
        }

        self.audit.append(
            AuditDraft::new(AuditAction::DownloadRedeemed)
                .document(version.document)
                .version(version_id)
                .detail("filename", version.filename.clone()),
        )?;
        info!(version = %version_id, "[vd-04] Capability redeemed");

        Ok(DownloadGrant {
            version_id,
            storage_ref: version.storage_ref,
            filename: version.filename,
        })
    }
}
