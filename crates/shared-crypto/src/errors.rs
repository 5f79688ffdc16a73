//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// No private key is configured for signing.
    #[error("No signing key configured")]
    KeyUnavailable,

    /// Underlying signature creation failed.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Private key could not be parsed.
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Public key PEM could not be parsed.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signature bytes are not a well-formed RSA-PSS signature.
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Public key export failed.
    #[error("Key export failed: {0}")]
    KeyExportFailed(String),

    /// Invalid input for a cryptographic operation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Key generation failed.
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),
}
