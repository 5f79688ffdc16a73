//! # Capability Tokens
//!
//! Encoding and authentication of download capabilities. The printable
//! form is `hex(payload).hex(tag)` where `tag = HMAC-SHA256(secret,
//! payload)`; the payload itself is bincode-encoded.

use crate::errors::DownloadError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared_types::VersionId;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Secret key authenticating capability tokens.
///
/// Loaded once at startup; an all-zero secret is refused by the runtime's
/// production validation.
#[derive(Clone)]
pub struct GateSecret([u8; 32]);

impl GateSecret {
    /// Wrap raw secret bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a random secret (development and tests).
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Whether the secret is the insecure all-zero default.
    pub fn is_default(&self) -> bool {
        self.0 == [0u8; 32]
    }

    fn mac(&self) -> HmacSha256 {
        // 32-byte keys are always within HMAC's key bounds.
        HmacSha256::new_from_slice(&self.0).expect("HMAC accepts 32-byte keys")
    }
}

impl fmt::Debug for GateSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.write_str("GateSecret(..)")
    }
}

/// Authenticated token contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TokenPayload {
    /// The single version this capability grants access to.
    pub version_id: VersionId,
    /// Issue instant (unix milliseconds).
    pub issued_at_ms: i64,
    /// Expiry instant (unix milliseconds).
    pub expires_at_ms: i64,
    /// Random per-token nonce; makes tokens unique per issuance.
    pub nonce: [u8; 16],
}

impl TokenPayload {
    pub(crate) fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.expires_at_ms).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// An opaque, time-boxed download capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityToken(String);

impl CapabilityToken {
    /// The printable token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuild from a printable token string (no validation until redeem).
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub(crate) fn seal(payload: &TokenPayload, secret: &GateSecret) -> Result<Self, DownloadError> {
        let bytes = bincode::serialize(payload).map_err(|_| DownloadError::Invalid)?;
        let mut mac = secret.mac();
        mac.update(&bytes);
        let tag = mac.finalize().into_bytes();
        Ok(Self(format!("{}.{}", hex::encode(&bytes), hex::encode(tag))))
    }

    /// Verify the tag and decode the payload. Any malformation — wrong
    /// shape, bad hex, bad tag, undecodable payload — is `Invalid`; the
    /// error deliberately carries no detail an attacker could use.
    pub(crate) fn open(&self, secret: &GateSecret) -> Result<TokenPayload, DownloadError> {
        let (payload_hex, tag_hex) = self.0.split_once('.').ok_or(DownloadError::Invalid)?;
        let payload_bytes = hex::decode(payload_hex).map_err(|_| DownloadError::Invalid)?;
        let tag = hex::decode(tag_hex).map_err(|_| DownloadError::Invalid)?;

        let mut mac = secret.mac();
        mac.update(&payload_bytes);
        mac.verify_slice(&tag).map_err(|_| DownloadError::Invalid)?;

        bincode::deserialize(&payload_bytes).map_err(|_| DownloadError::Invalid)
    }
}

impl fmt::Display for CapabilityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TokenPayload {
        TokenPayload {
            version_id: VersionId::new(),
            issued_at_ms: 1_700_000_000_000,
            expires_at_ms: 1_700_000_300_000,
            nonce: rand::random(),
        }
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let secret = GateSecret::random();
        let payload = payload();
        let token = CapabilityToken::seal(&payload, &secret).unwrap();
        assert_eq!(token.open(&secret).unwrap(), payload);
    }

    #[test]
    fn test_flipped_byte_is_invalid() {
        let secret = GateSecret::random();
        let token = CapabilityToken::seal(&payload(), &secret).unwrap();

        let mut tampered = token.as_str().to_string();
        // Flip one hex digit of the payload half.
        let replacement = if tampered.starts_with('0') { '1' } else { '0' };
        tampered.replace_range(0..1, &replacement.to_string());

        let err = CapabilityToken::from_string(tampered).open(&secret).unwrap_err();
        assert!(matches!(err, DownloadError::Invalid));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = CapabilityToken::seal(&payload(), &GateSecret::random()).unwrap();
        let err = token.open(&GateSecret::random()).unwrap_err();
        assert!(matches!(err, DownloadError::Invalid));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let secret = GateSecret::random();
        for garbage in ["", "no-dot", "zz.zz", "abcd."] {
            let err = CapabilityToken::from_string(garbage).open(&secret).unwrap_err();
            assert!(matches!(err, DownloadError::Invalid));
        }
    }

    #[test]
    fn test_tokens_unique_per_issuance() {
        let secret = GateSecret::random();
        let a = CapabilityToken::seal(&payload(), &secret).unwrap();
        let b = CapabilityToken::seal(&payload(), &secret).unwrap();
        assert_ne!(a, b);
    }
}
