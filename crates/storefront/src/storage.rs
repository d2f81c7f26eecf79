//! Durable key-value storage for client-side state.
//!
//! The browser's localStorage generalizes to the [`KeyValueStore`]
//! trait: synchronous string reads and writes under well-known keys.
//! Reads never fail - a missing or unreadable record is simply absent.
//! Writes can fail and do surface errors.
//!
//! Concurrent writers (multiple tabs, multiple processes) race with
//! last-write-wins semantics; no locking is attempted.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Well-known storage keys.
pub mod keys {
    /// The anonymous cart record.
    pub const GUEST_CART: &str = "carrito_invitado";
    /// Undo/redo snapshot history for the anonymous cart.
    pub const GUEST_CART_HISTORY: &str = "carrito_invitado_historial";
    /// Guest checkout contact data.
    pub const GUEST_INFO: &str = "datos_invitado";
    /// Auth token, written by the external auth collaborator (read-only here).
    pub const AUTH_TOKEN: &str = "token";
    /// Decoded user record, written by the external auth collaborator.
    pub const CURRENT_USER: &str = "usuario";
}

/// Errors that can occur writing to storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem write failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized.
    #[error("serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A durable string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Missing and unreadable records both return `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying medium rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying medium rejects the delete.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and deserialize a JSON record.
///
/// Corrupt data is treated as absent, never as an error: the UI must not
/// crash because of a damaged local record. A warning is logged so the
/// corruption is at least visible.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding corrupt stored record");
            None
        }
    }
}

/// Serialize and write a JSON record.
///
/// # Errors
///
/// Returns an error when serialization or the write fails.
pub fn write_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

// =============================================================================
// FileStore
// =============================================================================

/// File-backed store: one JSON value per key, one file per key.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Ok(mut map) = self.map.lock() {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if let Ok(mut map) = self.map.lock() {
            map.remove(key);
        }
        Ok(())
    }
}
