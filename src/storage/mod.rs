//! Persistence layer.
//!
//! The progress store needs nothing more than a string-keyed byte store.
//! This module provides that abstraction and its backends, plus the
//! versioned snapshot codec for the value stored in it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ProgressStore                             │
//! │                         │                                    │
//! │              snapshot::encode / decode                       │
//! │                         ▼                                    │
//! │              ┌─────────────────────┐                        │
//! │              │   KeyValueStore     │  ← Trait               │
//! │              └─────────────────────┘                        │
//! │                    ▲         ▲                              │
//! │                    │         │                              │
//! │         ┌─────────┴─┐   ┌───┴─────────┐                    │
//! │         │ RedbStore │   │ MemoryStore │                    │
//! │         └───────────┘   └─────────────┘                    │
//! │           (durable)       (ephemeral)                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod memory;
pub mod redb;
pub mod schema;
pub mod snapshot;

pub use self::memory::MemoryStore;
pub use self::redb::RedbStore;
pub use schema::{StoreMetadata, STORE_FORMAT_VERSION};
pub use snapshot::{DecodedSnapshot, PersistedState, SCHEMA_VERSION};

use std::path::Path;

use crate::config::Config;
use crate::error::Result;

/// String-keyed byte store.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` and handle their own internal
/// synchronization.
///
/// # Example
///
/// ```rust
/// use skillloop::storage::{KeyValueStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("key", b"value").unwrap();
/// assert_eq!(store.get("key").unwrap().as_deref(), Some(&b"value"[..]));
/// ```
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// The write is durable (per the backend's durability mode) once this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the previous value is kept.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Deletes the value under `key`.
    ///
    /// Returns `true` if a value existed.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Closes the store, flushing any pending writes.
    ///
    /// This method consumes the store.
    fn close(self: Box<Self>) -> Result<()>;

    /// Returns the backing file, if any.
    fn path(&self) -> Option<&Path>;
}

/// Opens the durable backend at `path`.
///
/// # Errors
///
/// Returns an error if:
/// - The file is corrupted or not a SkillLoop store
/// - The file is locked by another process
/// - The store format version doesn't match
pub fn open_storage(path: impl AsRef<Path>, config: &Config) -> Result<Box<dyn KeyValueStore>> {
    let storage = RedbStore::open(path, config)?;
    Ok(Box::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_storage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.db");

        let storage = open_storage(&path, &Config::default()).unwrap();
        assert_eq!(storage.path(), Some(path.as_path()));

        storage.close().unwrap();
    }

    #[test]
    fn test_backends_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RedbStore>();
        assert_send_sync::<MemoryStore>();
    }
}
