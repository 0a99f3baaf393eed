//! On-disk layout of the redb backend.
//!
//! # Format Versioning
//!
//! The store format version is kept in the metadata table. Opening a file
//! written with a different format version fails with
//! `StorageError::SchemaVersionMismatch`. This versions the *container*;
//! the progress snapshot inside it carries its own version and migrates
//! (see [`snapshot`](super::snapshot)).
//!
//! # Table Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ METADATA_TABLE                                               │
//! │   Key: &str                                                  │
//! │   Value: &[u8] (bincode)                                    │
//! │   Entries: "store_metadata" -> StoreMetadata                 │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │ KV_TABLE                                                     │
//! │   Key: &str (storage key, e.g. "skillloop-progress")        │
//! │   Value: &[u8] (opaque, JSON snapshot envelope)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Current store format version.
///
/// Increment this when making breaking changes to the table layout.
pub const STORE_FORMAT_VERSION: u32 = 1;

/// Key of the [`StoreMetadata`] record.
pub const METADATA_KEY: &str = "store_metadata";

/// Store-level information.
pub const METADATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("metadata");

/// Application values.
pub const KV_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// Metadata record, serialized with bincode under [`METADATA_KEY`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// Format version for compatibility checking.
    pub format_version: u32,

    /// When the file was created.
    pub created_at: Timestamp,

    /// Last time the file was opened (updated on each open).
    pub last_opened_at: Timestamp,
}

impl StoreMetadata {
    /// Creates metadata for a fresh file.
    pub fn new() -> Self {
        let now = Timestamp::now();
        Self {
            format_version: STORE_FORMAT_VERSION,
            created_at: now,
            last_opened_at: now,
        }
    }

    /// Updates the last_opened_at timestamp.
    pub fn touch(&mut self) {
        self.last_opened_at = Timestamp::now();
    }

    /// Checks if this file can be read by this build.
    pub fn is_compatible(&self) -> bool {
        self.format_version == STORE_FORMAT_VERSION
    }
}

impl Default for StoreMetadata {
    fn default() -> Self {
        Self::new()
    }
}
