//! # SkillLoop
//!
//! Progress and XP tracking for daily learning programs.
//!
//! A learning program is a curriculum of small daily units ("loops"), each
//! holding a handful of exercises. SkillLoop records which exercises a user
//! has checked off, which loops they have completed and what they wrote in
//! each loop's debrief, derives XP, levels and badges from that, and keeps
//! everything in a durable local store.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use skillloop::{Config, ProgressStore, ProgramRegistry};
//! use skillloop::registry::{JsonFileLoader, ProgramMetadata};
//!
//! // Register the programs the user can choose from
//! let registry = ProgramRegistry::new().with_program(
//!     ProgramMetadata::new("skillloop-ai-foundations", "AI Foundations"),
//!     JsonFileLoader::new("programs/ai-foundations.json"),
//! )?;
//!
//! // Open or create the progress store
//! let mut store = ProgressStore::open("./progress.db", registry, Config::default())?;
//! store.load_program("skillloop-ai-foundations")?;
//!
//! // Check off work
//! store.complete_exercise("loop-1", "ex-1", 10);
//! store.complete_loop("loop-1", None);
//!
//! println!("{} XP, level {}", store.get_total_xp(), store.get_level());
//!
//! // Clean up
//! store.close()?;
//! ```
//!
//! ## Key Concepts
//!
//! ### Curriculum
//!
//! A **program** is organised as paths → chapters → loops → exercises. The
//! curriculum is read-only: it says what exists and what each item is worth.
//!
//! ### Progress
//!
//! Progress is kept **per program**. Switching programs never touches the
//! progress of another one.
//!
//! ### XP
//!
//! A loop's XP is always derived from its progress and its curriculum:
//! rewards of the checked exercises, plus a completion bonus when every
//! exercise is checked, a full-completion bonus when the loop is marked
//! completed, and a reflection bonus when its debrief is filled in. Every
//! bonus is revoked again when its condition stops holding.
//!
//! ## Thread Safety
//!
//! `ProgressStore` is `Send + Sync`. Mutation takes `&mut self`, so share it
//! behind a lock if several threads must write.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============================================================================
// Module declarations
// ============================================================================

mod config;
mod error;
mod store;
mod types;

pub mod curriculum;
pub mod progress;
pub mod registry;
pub mod stats;
pub mod storage;
pub mod xp;

// ============================================================================
// Public API re-exports
// ============================================================================

// Main store interface
pub use store::ProgressStore;

// Configuration
pub use config::{
    Badge, Config, LevelConfig, SyncMode, DEFAULT_LEGACY_PROGRAM_ID, DEFAULT_STORAGE_KEY,
};

// Error handling
pub use error::{NotFoundError, Result, SkillLoopError, StorageError, ValidationError};

// Core types
pub use types::{ExerciseId, LoopId, ProgramId, Timestamp};

// Domain types
pub use curriculum::{Chapter, Exercise, ExerciseType, Loop, Path, Program, Resource, XpBonus};
pub use progress::{Debrief, LoopProgress, ProgramsProgress, UserProgress};
pub use registry::{ProgramMetadata, ProgramRegistry};
pub use stats::{CatalogOverview, LoopStats, ProgramStats, ProgramStatus};

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common SkillLoop usage.
///
/// ```rust
/// use skillloop::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, SyncMode};
    pub use crate::error::{Result, SkillLoopError};
    pub use crate::progress::{Debrief, UserProgress};
    pub use crate::registry::{ProgramMetadata, ProgramRegistry};
    pub use crate::store::ProgressStore;
    pub use crate::types::{ExerciseId, LoopId, ProgramId};
}
