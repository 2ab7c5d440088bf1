//! Key-value storage layer for Kelas.
//!
//! The portal keeps everything it remembers between page loads in a flat
//! string-to-string store, the same shape as a browser's local storage.
//! This crate provides the [`KeyValueStore`] trait plus two backends:
//!
//! - [`MemoryStore`]: a process-local map, used by tests and by the demo
//!   when no storage path is configured.
//! - [`FileStore`]: a JSON file on disk (behind the `file` feature).
//!
//! # Consistency
//!
//! Stores make no transactional promises. Callers read, modify and write
//! back; two processes sharing one [`FileStore`] can overwrite each other's
//! writes. That mirrors what two browser tabs do to local storage.
//!
//! # Feature Flags
//!
//! - `file` (default): JSON-file backend via `serde_json`

mod error;
#[cfg(feature = "file")]
mod file;

pub use error::StorageError;
#[cfg(feature = "file")]
pub use file::FileStore;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A string key-value store.
///
/// Methods take `&self`: implementations use interior mutability so one
/// store can be shared (via `Arc`) between the session guard and the
/// widgets that persist their own keys.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// An in-memory [`KeyValueStore`].
///
/// Also counts writes (`set` + `remove`), which tests use to check that
/// high-frequency callers don't amplify I/O.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set`/`remove` calls seen so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries =
            self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries =
            self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
