//! Program registry.
//!
//! The registry is the catalog of available programs. Each entry pairs
//! [`ProgramMetadata`] (cheap, always available) with a [`ProgramLoader`]
//! that produces the full curriculum on demand.
//!
//! Loaded curricula are validated once and cached for the lifetime of the
//! registry, so repeated `load_program` calls hand out the same
//! `Arc<Program>`. A loader that fails is retried on the next call.
//!
//! # Example
//!
//! ```rust
//! use skillloop::registry::{JsonStrLoader, ProgramMetadata, ProgramRegistry};
//!
//! const DOC: &str = r#"{
//!     "id": "demo", "title": "Demo", "description": "", "estimatedHoursPerLoop": 1,
//!     "paths": []
//! }"#;
//!
//! let mut registry = ProgramRegistry::new();
//! registry
//!     .register(ProgramMetadata::new("demo", "Demo"), JsonStrLoader::new(DOC))
//!     .unwrap();
//!
//! assert!(registry.exists("demo"));
//! let program = registry.load_program("demo").unwrap();
//! assert_eq!(program.loop_count(), 0);
//! ```

pub mod types;

pub use types::ProgramMetadata;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::curriculum::validation::validate_program;
use crate::curriculum::Program;
use crate::error::{NotFoundError, Result, SkillLoopError, ValidationError};
use crate::types::ProgramId;

// ============================================================================
// Loaders
// ============================================================================

/// Produces a program's curriculum.
///
/// Implementations must be thread-safe (`Send + Sync`) so a registry can be
/// shared between threads behind an `Arc`.
///
/// Any `Fn() -> Result<Program>` closure is a loader:
///
/// ```rust,ignore
/// registry.register(metadata, || build_program_somehow())?;
/// ```
pub trait ProgramLoader: Send + Sync {
    /// Loads the curriculum.
    ///
    /// # Errors
    ///
    /// Returns `SkillLoopError::Curriculum` if the document cannot be parsed,
    /// or `SkillLoopError::Io` if it cannot be read.
    fn load(&self) -> Result<Program>;
}

impl<F> ProgramLoader for F
where
    F: Fn() -> Result<Program> + Send + Sync,
{
    fn load(&self) -> Result<Program> {
        self()
    }
}

/// Loads a curriculum from a JSON file on disk.
#[derive(Clone, Debug)]
pub struct JsonFileLoader {
    path: PathBuf,
}

impl JsonFileLoader {
    /// Creates a loader reading `path` on every (uncached) load.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The file this loader reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgramLoader for JsonFileLoader {
    fn load(&self) -> Result<Program> {
        let text = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&text).map_err(|e| {
            SkillLoopError::curriculum(format!("{}: {}", self.path.display(), e))
        })
    }
}

/// Loads a curriculum from JSON text, typically embedded with `include_str!`.
#[derive(Clone, Debug)]
pub struct JsonStrLoader {
    source: Cow<'static, str>,
}

impl JsonStrLoader {
    /// Creates a loader over `source`.
    pub fn new(source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl ProgramLoader for JsonStrLoader {
    fn load(&self) -> Result<Program> {
        serde_json::from_str(&self.source).map_err(|e| SkillLoopError::curriculum(e.to_string()))
    }
}

/// Hands out an already-built curriculum.
#[derive(Clone, Debug)]
pub struct StaticLoader(Program);

impl StaticLoader {
    /// Wraps `program`.
    pub fn new(program: Program) -> Self {
        Self(program)
    }
}

impl ProgramLoader for StaticLoader {
    fn load(&self) -> Result<Program> {
        Ok(self.0.clone())
    }
}

// ============================================================================
// Registry
// ============================================================================

struct RegistryEntry {
    metadata: ProgramMetadata,
    loader: Box<dyn ProgramLoader>,
    cache: OnceLock<Arc<Program>>,
}

/// Catalog of available programs.
#[derive(Default)]
pub struct ProgramRegistry {
    /// Entries in registration order.
    entries: Vec<RegistryEntry>,

    /// Program id -> index into `entries`.
    index: HashMap<ProgramId, usize>,
}

impl fmt::Debug for ProgramRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.metadata.id.as_str()))
            .finish()
    }
}

impl ProgramRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a program to the catalog.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the id is empty or already registered.
    pub fn register(
        &mut self,
        metadata: ProgramMetadata,
        loader: impl ProgramLoader + 'static,
    ) -> Result<()> {
        if metadata.id.as_str().trim().is_empty() {
            return Err(ValidationError::required_field("metadata.id").into());
        }
        if self.index.contains_key(metadata.id.as_str()) {
            return Err(ValidationError::duplicate_id("program", metadata.id.as_str()).into());
        }

        debug!(program_id = %metadata.id, "Program registered");
        self.index.insert(metadata.id.clone(), self.entries.len());
        self.entries.push(RegistryEntry {
            metadata,
            loader: Box::new(loader),
            cache: OnceLock::new(),
        });
        Ok(())
    }

    /// Registers an already-built program, deriving its metadata.
    pub fn register_program(&mut self, program: Program) -> Result<()> {
        let metadata = ProgramMetadata::from_program(&program);
        self.register(metadata, StaticLoader::new(program))
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_program(
        mut self,
        metadata: ProgramMetadata,
        loader: impl ProgramLoader + 'static,
    ) -> Result<Self> {
        self.register(metadata, loader)?;
        Ok(self)
    }

    /// Metadata of every program, in registration order.
    pub fn list_metadata(&self) -> Vec<&ProgramMetadata> {
        self.entries.iter().map(|e| &e.metadata).collect()
    }

    /// Metadata of one program.
    pub fn get_metadata(&self, program_id: &str) -> Option<&ProgramMetadata> {
        self.entry(program_id).map(|e| &e.metadata)
    }

    /// Returns true if `program_id` is registered.
    pub fn exists(&self, program_id: &str) -> bool {
        self.index.contains_key(program_id)
    }

    /// Number of registered programs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no program is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads, validates and caches a program's curriculum.
    ///
    /// # Errors
    ///
    /// - `NotFoundError::Program` if `program_id` is not registered
    /// - whatever the loader returns if it fails
    /// - `SkillLoopError::Curriculum` if the loaded document carries a
    ///   different id than its registry entry
    /// - `SkillLoopError::Validation` if the document breaks structural rules
    pub fn load_program(&self, program_id: &str) -> Result<Arc<Program>> {
        let entry = self
            .entry(program_id)
            .ok_or_else(|| NotFoundError::program(program_id))?;

        if let Some(program) = entry.cache.get() {
            return Ok(Arc::clone(program));
        }

        let program = entry.loader.load()?;
        if program.id != entry.metadata.id {
            warn!(
                expected = %entry.metadata.id,
                found = %program.id,
                "Loaded curriculum does not match its registry entry"
            );
            return Err(SkillLoopError::curriculum(format!(
                "registry entry '{}' loaded program '{}'",
                entry.metadata.id, program.id
            )));
        }
        validate_program(&program)?;

        debug!(
            program_id,
            loops = program.loop_count(),
            exercises = program.exercise_count(),
            "Program loaded"
        );

        let program = Arc::new(program);
        // Another thread may have won the race; hand out whichever is cached.
        let _ = entry.cache.set(Arc::clone(&program));
        Ok(entry.cache.get().cloned().unwrap_or(program))
    }

    fn entry(&self, program_id: &str) -> Option<&RegistryEntry> {
        self.index.get(program_id).map(|&i| &self.entries[i])
    }
}
