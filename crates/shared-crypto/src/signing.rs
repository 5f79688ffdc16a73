//! # RSA-PSS Signatures
//!
//! Signature creation and verification over content digests.
//!
//! ## Scheme
//!
//! - RSA with PSS padding (MGF1, SHA-256), probabilistic salt.
//! - The signed message is the 32-byte content digest, never raw file
//!   bytes; verification therefore needs only the digest and the SPKI PEM
//!   public key stored alongside the signature.
//!
//! Key management (loading, rotation, storage) is external: callers hand
//! in an already-loaded PKCS#8 PEM.

use crate::errors::CryptoError;
use crate::hashing::Digest;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

/// Default modulus size for generated keys.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Holds the engine's RSA keypair and produces PSS signatures.
pub struct PssSigner {
    private_key: RsaPrivateKey,
}

impl PssSigner {
    /// Load from an unencrypted PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CryptoError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { private_key })
    }

    /// Generate a fresh keypair. Intended for development and tests; real
    /// deployments load a managed key via [`PssSigner::from_pkcs8_pem`].
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        Ok(Self { private_key })
    }

    /// Sign a content digest, returning the raw signature bytes.
    pub fn sign(&self, digest: &Digest) -> Result<Vec<u8>, CryptoError> {
        let signing_key = BlindedSigningKey::<Sha256>::new(self.private_key.clone());
        let signature = signing_key
            .try_sign_with_rng(&mut rand::thread_rng(), digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(signature.to_vec())
    }

    /// Deterministic SPKI PEM export of the public half of the keypair.
    pub fn public_key_pem(&self) -> Result<String, CryptoError> {
        self.private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyExportFailed(e.to_string()))
    }
}

/// Verify an RSA-PSS signature over a content digest.
///
/// Returns `Ok(false)` when the signature simply does not match — an
/// expected negative outcome. Errors are reserved for malformed key or
/// signature encodings.
pub fn verify_pss(
    digest: &Digest,
    signature_bytes: &[u8],
    public_key_pem: &str,
) -> Result<bool, CryptoError> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

    let signature = Signature::try_from(signature_bytes)
        .map_err(|_| CryptoError::InvalidSignatureFormat)?;

    let verifying_key = VerifyingKey::<Sha256>::new(public_key);
    Ok(verifying_key.verify(digest, &signature).is_ok())
}
