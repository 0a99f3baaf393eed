//! Type definitions for curriculum documents.
//!
//! A curriculum is a read-only tree:
//!
//! ```text
//! Program
//!  └── Path            (objective-level grouping)
//!       └── Chapter    ("modules" in the document)
//!            └── Loop  (one day of work, with XP bonuses)
//!                 └── Exercise (atomic task, with XP reward)
//! ```
//!
//! Documents are JSON with camelCase field names. XP values are baked into
//! the document and never change at runtime.

use serde::{Deserialize, Serialize};

use crate::types::{ExerciseId, LoopId, ProgramId};

// ============================================================================
// Resources
// ============================================================================

/// Kind of external learning resource attached to an exercise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Written article or blog post.
    Article,
    /// Video content.
    Video,
    /// Reference documentation.
    Doc,
    /// Source repository.
    Repo,
    /// Software tool.
    Tool,
    /// Structured course.
    Course,
}

/// A link to external material supporting an exercise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Kind of resource.
    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    /// Display label.
    pub label: String,

    /// Location of the resource.
    pub url: String,
}

// ============================================================================
// Exercise
// ============================================================================

/// What the learner does in an exercise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    /// Read material.
    #[default]
    Read,
    /// Watch material.
    Watch,
    /// Produce written output.
    Write,
    /// Hands-on practice.
    Practice,
    /// Reflect on what was learned.
    Reflect,
}

/// An atomic completable task carrying an XP reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Identifier, unique within the program.
    pub id: ExerciseId,

    /// Kind of task.
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,

    /// Display label.
    pub label: String,

    /// Expected effort in minutes.
    pub estimated_minutes: u32,

    /// XP granted when the exercise is checked off.
    pub xp_reward: u32,

    /// Supporting material.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

// ============================================================================
// Loop
// ============================================================================

/// Bonus XP a loop grants on top of its exercise rewards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpBonus {
    /// Granted while every exercise of the loop is checked.
    pub completion: u32,

    /// Granted while the loop is explicitly marked completed.
    pub full_completion: u32,

    /// Granted while the debrief has any non-empty field.
    pub reflection_completed: u32,
}

impl XpBonus {
    /// Sum of all three bonuses.
    #[inline]
    pub fn total(&self) -> u32 {
        self.completion
            .saturating_add(self.full_completion)
            .saturating_add(self.reflection_completed)
    }
}

/// Prompts shown for a loop's debrief. Shape only, never used for XP.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebriefTemplate {
    /// Prompt for free notes.
    #[serde(default)]
    pub notes: String,

    /// Prompt for insights.
    #[serde(default)]
    pub insights: String,

    /// Prompt for open questions.
    #[serde(default)]
    pub questions: String,
}

/// One day's unit of work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loop {
    /// Identifier, unique within the program.
    pub id: LoopId,

    /// Day number within the program (1-based by convention).
    pub day: u32,

    /// Display title.
    pub title: String,

    /// What the learner should achieve.
    pub goal: String,

    /// Bonus XP table.
    pub xp_bonus: XpBonus,

    /// Ordered exercises.
    pub exercises: Vec<Exercise>,

    /// Debrief prompts.
    #[serde(default)]
    pub debrief: DebriefTemplate,
}

impl Loop {
    /// Finds an exercise of this loop by id.
    pub fn exercise(&self, exercise_id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == exercise_id)
    }

    /// Returns true if `exercise_id` belongs to this loop.
    #[inline]
    pub fn contains_exercise(&self, exercise_id: &str) -> bool {
        self.exercise(exercise_id).is_some()
    }

    /// Sum of every exercise reward.
    pub fn exercises_xp(&self) -> u32 {
        self.exercises
            .iter()
            .fold(0u32, |sum, e| sum.saturating_add(e.xp_reward))
    }
}

// ============================================================================
// Chapter / Path / Program
// ============================================================================

/// A group of loops.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Identifier.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Ordered loops.
    pub loops: Vec<Loop>,
}

/// A group of chapters with a shared objective.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    /// Identifier.
    pub id: String,

    /// Display title.
    pub title: String,

    /// What the path teaches.
    pub objective: String,

    /// Ordered chapters. Named `modules` in curriculum documents.
    #[serde(rename = "modules")]
    pub chapters: Vec<Chapter>,
}

/// A complete curriculum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Identifier.
    pub id: ProgramId,

    /// Display title.
    pub title: String,

    /// Summary.
    pub description: String,

    /// Expected effort per loop, in hours.
    pub estimated_hours_per_loop: f32,

    /// Ordered paths.
    pub paths: Vec<Path>,
}

impl Program {
    /// Iterates every loop in document order (path, then chapter, then loop).
    pub fn loops(&self) -> impl Iterator<Item = &Loop> + '_ {
        self.paths
            .iter()
            .flat_map(|p| p.chapters.iter())
            .flat_map(|c| c.loops.iter())
    }

    /// Finds a loop by id.
    pub fn find_loop(&self, loop_id: &str) -> Option<&Loop> {
        self.loops().find(|l| l.id == loop_id)
    }

    /// Finds the first loop scheduled for `day`.
    pub fn find_loop_by_day(&self, day: u32) -> Option<&Loop> {
        self.loops().find(|l| l.day == day)
    }

    /// Finds a chapter by id across all paths.
    pub fn find_chapter(&self, chapter_id: &str) -> Option<&Chapter> {
        self.paths
            .iter()
            .flat_map(|p| p.chapters.iter())
            .find(|c| c.id == chapter_id)
    }

    /// Finds a path by id.
    pub fn find_path(&self, path_id: &str) -> Option<&Path> {
        self.paths.iter().find(|p| p.id == path_id)
    }

    /// Loops of a chapter, or an empty slice if the chapter doesn't exist.
    pub fn loops_in_chapter(&self, chapter_id: &str) -> &[Loop] {
        self.find_chapter(chapter_id)
            .map(|c| c.loops.as_slice())
            .unwrap_or(&[])
    }

    /// Number of loops in the program.
    pub fn loop_count(&self) -> usize {
        self.loops().count()
    }

    /// Number of exercises across all loops.
    pub fn exercise_count(&self) -> usize {
        self.loops().map(|l| l.exercises.len()).sum()
    }
}
