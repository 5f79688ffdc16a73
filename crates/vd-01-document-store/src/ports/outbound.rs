//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the document store and its callers require the host
//! application to implement: external byte storage and a time source.

use crate::domain::errors::StorageError;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use shared_types::StorageRef;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Abstract interface for external byte storage.
///
/// The core never interprets a [`StorageRef`]; only the adapter that
/// minted it can resolve it. Both operations distinguish transient
/// failures (`Unavailable`, retryable) from missing bytes (`NotFound`,
/// fatal to the operation).
pub trait BlobStorage: Send + Sync {
    /// Store a byte stream, returning the handle and the stored size.
    fn put(&self, reader: &mut dyn Read) -> Result<(StorageRef, u64), StorageError>;

    /// Open the stored bytes for chunked reading.
    fn open(&self, storage_ref: &StorageRef) -> Result<Box<dyn Read + Send>, StorageError>;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

// =============================================================================
// ADAPTER IMPLEMENTATIONS
// Production: FsBlobStore / SystemTimeSource
// Testing: InMemoryBlobStore / ManualTimeSource
// =============================================================================

/// Default time source using the system clock.
#[derive(Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable time source for unit tests.
pub struct ManualTimeSource {
    now: RwLock<DateTime<Utc>>,
}

impl ManualTimeSource {
    /// Create a source frozen at the given instant.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Advance the clock.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// In-memory blob store for unit tests.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    next_id: AtomicU64,
}

impl InMemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Overwrite stored bytes out-of-band.
    ///
    /// Test hook for simulating tampering with external storage; not part
    /// of the [`BlobStorage`] contract.
    pub fn corrupt(&self, storage_ref: &StorageRef, bytes: Vec<u8>) {
        self.blobs.write().insert(storage_ref.0.clone(), bytes);
    }

    /// Drop stored bytes out-of-band (simulates a lost object).
    pub fn remove(&self, storage_ref: &StorageRef) {
        self.blobs.write().remove(&storage_ref.0);
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStorage for InMemoryBlobStore {
    fn put(&self, reader: &mut dyn Read) -> Result<(StorageRef, u64), StorageError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| StorageError::Unavailable {
                message: e.to_string(),
            })?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let key = format!("mem:{id}");
        let size = bytes.len() as u64;
        self.blobs.write().insert(key.clone(), bytes);
        Ok((StorageRef(key), size))
    }

    fn open(&self, storage_ref: &StorageRef) -> Result<Box<dyn Read + Send>, StorageError> {
        let blobs = self.blobs.read();
        let bytes = blobs
            .get(&storage_ref.0)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                storage_ref: storage_ref.clone(),
            })?;
        Ok(Box::new(io::Cursor::new(bytes)))
    }
}

/// Filesystem-backed blob store.
///
/// Stores each blob under a random name below `root`. Reads are plain
/// `File` handles, so hashing large blobs streams from disk in chunks
/// rather than loading them whole.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::Unavailable {
            message: format!("create {}: {e}", root.display()),
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, storage_ref: &StorageRef) -> PathBuf {
        self.root.join(&storage_ref.0)
    }
}

impl BlobStorage for FsBlobStore {
    fn put(&self, reader: &mut dyn Read) -> Result<(StorageRef, u64), StorageError> {
        let key = uuid::Uuid::new_v4().to_string();
        let path = self.root.join(&key);

        let mut file = fs::File::create(&path).map_err(|e| StorageError::Unavailable {
            message: format!("create {}: {e}", path.display()),
        })?;
        let size = io::copy(reader, &mut file).map_err(|e| StorageError::Unavailable {
            message: format!("write {}: {e}", path.display()),
        })?;
        file.flush().map_err(|e| StorageError::Unavailable {
            message: format!("flush {}: {e}", path.display()),
        })?;

        debug!(blob = %key, size, "[vd-01] Blob stored");
        Ok((StorageRef(key), size))
    }

    fn open(&self, storage_ref: &StorageRef) -> Result<Box<dyn Read + Send>, StorageError> {
        let path = self.path_for(storage_ref);
        match fs::File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound {
                storage_ref: storage_ref.clone(),
            }),
            Err(e) => Err(StorageError::Unavailable {
                message: format!("open {}: {e}", path.display()),
            }),
        }
    }
}
