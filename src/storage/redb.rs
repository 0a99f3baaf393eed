//! redb storage backend.
//!
//! This module provides the durable backend using
//! [redb](https://docs.rs/redb), a pure Rust embedded key-value store.
//!
//! # Features
//!
//! - ACID transactions with MVCC
//! - Single-writer, multiple-reader concurrency
//! - Automatic crash recovery
//!
//! Each `set` or `remove` commits its own write transaction with the
//! durability selected by [`SyncMode`]. A crash never leaves a half-written
//! snapshot behind: readers see either the previous value or the new one.

use std::path::{Path, PathBuf};

use ::redb::{Database, Durability, ReadableTable, WriteTransaction};
use tracing::{debug, info, instrument, warn};

use super::schema::{StoreMetadata, KV_TABLE, METADATA_KEY, METADATA_TABLE, STORE_FORMAT_VERSION};
use super::KeyValueStore;
use crate::config::{Config, SyncMode};
use crate::error::{Result, SkillLoopError, StorageError};

/// redb-backed [`KeyValueStore`].
///
/// # Thread Safety
///
/// `RedbStore` is `Send + Sync`. redb handles internal synchronization
/// using MVCC for readers and exclusive locking for writers.
#[derive(Debug)]
pub struct RedbStore {
    /// The redb database handle.
    db: Database,

    /// Cached store metadata.
    metadata: StoreMetadata,

    /// Durability applied to every write transaction.
    sync_mode: SyncMode,

    /// Path to the store file.
    path: PathBuf,
}

impl RedbStore {
    /// Opens or creates a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is corrupted or not a SkillLoop store
    /// - The file is locked by another process
    /// - The store format version doesn't match
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use skillloop::{Config, storage::RedbStore};
    ///
    /// let store = RedbStore::open("./progress.db", &Config::default())?;
    /// ```
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let exists = path.exists();

        debug!(exists, "Opening redb store");

        let db = Self::create_database(path)?;

        if exists {
            Self::open_existing(db, path.to_path_buf(), config.sync_mode)
        } else {
            Self::initialize_new(db, path.to_path_buf(), config.sync_mode)
        }
    }

    fn create_database(path: &Path) -> Result<Database> {
        // redb has no typed error for lock conflicts; match on the message.
        let db = Database::builder().create(path).map_err(|e| {
            if e.to_string().contains("locked") {
                StorageError::DatabaseLocked
            } else {
                StorageError::Redb(e.to_string())
            }
        })?;

        debug!("Store file opened successfully");
        Ok(db)
    }

    #[instrument(skip(db), fields(path = %path.display()))]
    fn initialize_new(db: Database, path: PathBuf, sync_mode: SyncMode) -> Result<Self> {
        info!("Initializing new store");

        let metadata = StoreMetadata::new();

        let write_txn = db.begin_write().map_err(StorageError::from)?;
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let metadata_bytes = bincode::serialize(&metadata)
                .map_err(|e| StorageError::serialization(e.to_string()))?;
            meta_table.insert(METADATA_KEY, metadata_bytes.as_slice())?;

            let _ = write_txn.open_table(KV_TABLE)?;
        }
        write_txn.commit().map_err(StorageError::from)?;

        info!(format_version = STORE_FORMAT_VERSION, "Store initialized");

        Ok(Self {
            db,
            metadata,
            sync_mode,
            path,
        })
    }

    #[instrument(skip(db), fields(path = %path.display()))]
    fn open_existing(db: Database, path: PathBuf, sync_mode: SyncMode) -> Result<Self> {
        info!("Opening existing store");

        let read_txn = db.begin_read().map_err(StorageError::from)?;
        let metadata = {
            let meta_table = read_txn.open_table(METADATA_TABLE).map_err(|e| {
                StorageError::corrupted(format!("Cannot open metadata table: {}", e))
            })?;

            let metadata_bytes = meta_table
                .get(METADATA_KEY)
                .map_err(StorageError::from)?
                .ok_or_else(|| StorageError::corrupted("Missing store metadata"))?;

            bincode::deserialize::<StoreMetadata>(metadata_bytes.value())
                .map_err(|e| StorageError::corrupted(format!("Invalid metadata format: {}", e)))?
        };
        drop(read_txn);

        if !metadata.is_compatible() {
            warn!(
                expected = STORE_FORMAT_VERSION,
                found = metadata.format_version,
                "Store format version mismatch"
            );
            return Err(SkillLoopError::Storage(StorageError::SchemaVersionMismatch {
                expected: STORE_FORMAT_VERSION,
                found: metadata.format_version,
            }));
        }

        let mut metadata = metadata;
        metadata.touch();

        let write_txn = db.begin_write().map_err(StorageError::from)?;
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let metadata_bytes = bincode::serialize(&metadata)
                .map_err(|e| StorageError::serialization(e.to_string()))?;
            meta_table.insert(METADATA_KEY, metadata_bytes.as_slice())?;
        }
        write_txn.commit().map_err(StorageError::from)?;

        info!(
            format_version = metadata.format_version,
            created_at = %metadata.created_at,
            "Store opened successfully"
        );

        Ok(Self {
            db,
            metadata,
            sync_mode,
            path,
        })
    }

    /// Returns the store metadata.
    pub fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    /// Returns the durability mode used for writes.
    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    #[cfg(test)]
    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    fn begin_write(&self) -> Result<WriteTransaction> {
        let mut write_txn = self.db.begin_write().map_err(StorageError::from)?;
        write_txn.set_durability(durability(self.sync_mode));
        Ok(write_txn)
    }
}

#[allow(deprecated)]
fn durability(mode: SyncMode) -> Durability {
    match mode {
        SyncMode::Normal => Durability::Immediate,
        SyncMode::Fast => Durability::Eventual,
        SyncMode::Paranoid => Durability::Paranoid,
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let table = read_txn.open_table(KV_TABLE)?;

        let value = table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit().map_err(StorageError::from)?;

        debug!(key, bytes = value.len(), "Value written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let write_txn = self.begin_write()?;
        let existed;
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            existed = table.remove(key)?.is_some();
        }
        write_txn.commit().map_err(StorageError::from)?;

        if existed {
            debug!(key, "Value removed");
        }
        Ok(existed)
    }

    #[instrument(skip(self))]
    fn close(self: Box<Self>) -> Result<()> {
        info!("Closing redb store");

        // redb flushes on drop, which is infallible.
        drop(self.db);

        info!("redb store closed");
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
