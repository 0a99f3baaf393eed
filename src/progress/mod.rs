//! Progress model.
//!
//! Progress is namespaced per program:
//!
//! ```text
//! ProgramsProgress
//!  └── ProgramId -> UserProgress { total_xp, loops }
//!                    └── LoopId -> LoopProgress { completed_exercises, xp_earned, completed, debrief }
//! ```
//!
//! These are plain data types. Every mutation rule lives in
//! [`ProgressStore`](crate::ProgressStore); every XP rule lives in
//! [`xp`](crate::xp).

pub mod types;

pub use types::{Debrief, LoopProgress, ProgramsProgress, UserProgress};
