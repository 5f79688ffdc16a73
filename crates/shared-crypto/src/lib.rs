//! # Shared Crypto - Hashing and Signing Primitives
//!
//! Cryptographic building blocks for the document lifecycle engine:
//!
//! - **Hashing**: streaming SHA-256 content digests ([`hashing`])
//! - **Signing**: RSA-PSS signatures over content digests ([`signing`])
//!
//! ## Design Rules
//!
//! - Signatures cover the 32-byte content digest, never raw file bytes.
//! - Hashing is chunked; files larger than available memory are fine.
//! - "Signature does not match" is an expected negative outcome
//!   (`Ok(false)`), not an error. Errors are reserved for malformed
//!   inputs and missing keys.

pub mod errors;
pub mod hashing;
pub mod signing;

pub use errors::CryptoError;
pub use hashing::{digest_reader, sha256_digest, Digest, Sha256Stream, HASH_CHUNK_SIZE};
pub use signing::{verify_pss, PssSigner};
