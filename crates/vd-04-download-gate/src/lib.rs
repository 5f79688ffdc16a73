//! # Download Gate (vd-04)
//!
//! Issues time-boxed capability tokens for retrieving exactly one
//! document version, and re-verifies content integrity when a token is
//! redeemed.
//!
//! ## Trust Model
//!
//! - A token is an opaque credential: HMAC-SHA256 binds its payload
//!   (version, issue/expiry instants, nonce) to the gate secret, so a
//!   tampered or forged token fails closed as `Invalid`.
//! - Redemption is a trust boundary, not just issuance: the version's
//!   bytes are re-hashed against the recorded `content_hash` before a
//!   grant is returned, and a mismatch is audited as tamper evidence.

pub mod errors;
pub mod service;
pub mod token;

pub use errors::DownloadError;
pub use service::{DownloadGate, DownloadGrant};
pub use token::{CapabilityToken, GateSecret};
