//! Error types for SkillLoop.
//!
//! SkillLoop uses a hierarchical error system:
//! - `SkillLoopError` is the top-level error returned by all fallible APIs
//! - Specific error types (`StorageError`, `ValidationError`, `NotFoundError`)
//!   provide detail
//!
//! Most progress operations never return an error at all: they report
//! whether a state transition happened. Errors surface only from setup
//! (opening storage, validating configuration) and from loading programs.
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use skillloop::{ProgressStore, ProgramRegistry, Config, Result};
//!
//! fn example(registry: ProgramRegistry) -> Result<()> {
//!     let mut store = ProgressStore::open("./progress.db", registry, Config::default())?;
//!     store.load_program("skillloop-ai-foundations")?;
//!     store.close()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type alias for SkillLoop operations.
pub type Result<T> = std::result::Result<T, SkillLoopError>;

/// Top-level error enum for all SkillLoop operations.
///
/// This is the only error type returned by public APIs.
/// Use pattern matching to handle specific error cases.
#[derive(Debug, Error)]
pub enum SkillLoopError {
    /// Storage layer error (I/O, corruption, transactions).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of what's wrong with the configuration.
        reason: String,
    },

    /// Requested entity not found.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A curriculum document could not be loaded or parsed.
    #[error("Curriculum error: {0}")]
    Curriculum(String),
}

impl SkillLoopError {
    /// Creates a configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates a curriculum error with the given message.
    pub fn curriculum(msg: impl Into<String>) -> Self {
        Self::Curriculum(msg.into())
    }

    /// Returns true if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a curriculum loading error.
    pub fn is_curriculum(&self) -> bool {
        matches!(self, Self::Curriculum(_))
    }
}

/// Storage-related errors.
///
/// These errors indicate problems with the underlying key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Store file or data is corrupted.
    #[error("Store corrupted: {0}")]
    Corrupted(String),

    /// Store is locked by another process.
    #[error("Store is locked by another writer")]
    DatabaseLocked,

    /// Transaction failed (commit, rollback, etc.).
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error from the redb storage engine.
    #[error("Storage engine error: {0}")]
    Redb(String),

    /// Store format version doesn't match the version this build writes.
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Expected schema version.
        expected: u32,
        /// Actual schema version found in the store.
        found: u32,
    },

    /// The backend cannot currently serve requests.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Creates a transaction error with the given message.
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a redb error with the given message.
    pub fn redb(msg: impl Into<String>) -> Self {
        Self::Redb(msg.into())
    }

    /// Creates an unavailable error with the given message.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

// Conversions from redb error types
impl From<redb::Error> for StorageError {
    fn from(err: redb::Error) -> Self {
        StorageError::Redb(err.to_string())
    }
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        StorageError::Redb(err.to_string())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        StorageError::Transaction(err.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::Transaction(format!("Commit failed: {}", err))
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        StorageError::Redb(format!("Table error: {}", err))
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        StorageError::Redb(format!("Storage error: {}", err))
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

// Also allow direct conversion to SkillLoopError for convenience
impl From<redb::Error> for SkillLoopError {
    fn from(err: redb::Error) -> Self {
        SkillLoopError::Storage(StorageError::from(err))
    }
}

impl From<redb::DatabaseError> for SkillLoopError {
    fn from(err: redb::DatabaseError) -> Self {
        SkillLoopError::Storage(StorageError::from(err))
    }
}

impl From<redb::TransactionError> for SkillLoopError {
    fn from(err: redb::TransactionError) -> Self {
        SkillLoopError::Storage(StorageError::from(err))
    }
}

impl From<redb::CommitError> for SkillLoopError {
    fn from(err: redb::CommitError) -> Self {
        SkillLoopError::Storage(StorageError::from(err))
    }
}

impl From<redb::TableError> for SkillLoopError {
    fn from(err: redb::TableError) -> Self {
        SkillLoopError::Storage(StorageError::from(err))
    }
}

impl From<redb::StorageError> for SkillLoopError {
    fn from(err: redb::StorageError) -> Self {
        SkillLoopError::Storage(StorageError::from(err))
    }
}

impl From<bincode::Error> for SkillLoopError {
    fn from(err: bincode::Error) -> Self {
        SkillLoopError::Storage(StorageError::from(err))
    }
}

/// Validation errors for input data.
///
/// These errors indicate problems with data provided by the caller:
/// configuration values or curriculum documents.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field has an invalid value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// A required field is missing or empty.
    #[error("Required field missing: {field}")]
    RequiredField {
        /// Name of the missing field.
        field: String,
    },

    /// An identifier that must be unique appears more than once.
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId {
        /// What kind of entity the id names ("loop", "exercise").
        kind: String,
        /// The repeated identifier.
        id: String,
    },
}

impl ValidationError {
    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a required field error.
    pub fn required_field(field: impl Into<String>) -> Self {
        Self::RequiredField {
            field: field.into(),
        }
    }

    /// Creates a duplicate id error.
    pub fn duplicate_id(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Not found errors for specific entity types.
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// Program with given ID is not registered or could not be loaded.
    #[error("Program not found: {0}")]
    Program(String),
}

impl NotFoundError {
    /// Creates a program not found error.
    pub fn program(id: impl ToString) -> Self {
        Self::Program(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SkillLoopError::config("storage_key must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: storage_key must not be empty"
        );
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::SchemaVersionMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Schema version mismatch: expected 2, found 1"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::duplicate_id("loop", "loop-1");
        assert_eq!(err.to_string(), "Duplicate loop id: loop-1");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = NotFoundError::program("missing-program");
        assert_eq!(err.to_string(), "Program not found: missing-program");
    }

    #[test]
    fn test_is_not_found() {
        let err: SkillLoopError = NotFoundError::program("test").into();
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_is_validation() {
        let err: SkillLoopError = ValidationError::required_field("id").into();
        assert!(err.is_validation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_curriculum_error_display() {
        let err = SkillLoopError::curriculum("missing field `paths`");
        assert_eq!(err.to_string(), "Curriculum error: missing field `paths`");
        assert!(err.is_curriculum());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_error_conversion_chain() {
        // Simulate a storage error propagating up
        fn inner() -> Result<()> {
            Err(StorageError::corrupted("test corruption"))?
        }

        let result = inner();
        assert!(result.is_err());
        assert!(result.unwrap_err().is_storage());
    }
}
