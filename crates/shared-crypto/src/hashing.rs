//! # SHA-256 Content Hashing
//!
//! Streaming content digests used both at write time (to populate
//! `content_hash`) and at read time (to detect tampering).
//!
//! ## Properties
//!
//! - Deterministic: same bytes, same digest, always.
//! - Bounded memory: readers are consumed in fixed-size chunks, so inputs
//!   larger than available memory hash fine.

use sha2::{Digest as _, Sha256};
use std::io::{self, Read};

/// SHA-256 digest output (256-bit).
pub type Digest = [u8; 32];

/// Chunk size for streaming reads (64 KiB).
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Stateful SHA-256 hasher.
pub struct Sha256Stream {
    inner: Sha256,
    bytes_hashed: u64,
}

impl Sha256Stream {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
            bytes_hashed: 0,
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self.bytes_hashed += data.len() as u64;
        self
    }

    /// Total bytes consumed so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Digest {
        self.inner.finalize().into()
    }

    /// Consume a reader in [`HASH_CHUNK_SIZE`] chunks.
    pub fn consume<R: Read>(&mut self, reader: &mut R) -> io::Result<u64> {
        let mut buf = vec![0u8; HASH_CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            self.update(&buf[..n]);
            total += n as u64;
        }
        Ok(total)
    }
}

impl Default for Sha256Stream {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash in-memory bytes with SHA-256 (one-shot).
pub fn sha256_digest(data: &[u8]) -> Digest {
    Sha256::digest(data).into()
}

/// Hash a byte stream, returning the digest and the number of bytes read.
pub fn digest_reader<R: Read>(reader: &mut R) -> io::Result<(Digest, u64)> {
    let mut hasher = Sha256Stream::new();
    let size = hasher.consume(reader)?;
    Ok((hasher.finalize(), size))
}
