//! Curriculum model.
//!
//! A **program** is a complete, read-only curriculum: paths of chapters of
//! loops of exercises, with XP values baked in. Programs are supplied by the
//! [`ProgramRegistry`](crate::ProgramRegistry) and never persisted by the
//! progress store; only progress against them is.
//!
//! Every program handed out by the registry has passed structural
//! validation: loop ids and exercise ids are unique within the program.

pub mod types;
pub(crate) mod validation;

pub use types::{
    Chapter, DebriefTemplate, Exercise, ExerciseType, Loop, Path, Program, Resource,
    ResourceType, XpBonus,
};
