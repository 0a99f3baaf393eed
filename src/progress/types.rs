//! Type definitions for progress records.
//!
//! Progress is the only mutable data in SkillLoop. One [`UserProgress`]
//! exists per program; inside it, one [`LoopProgress`] per loop the user has
//! touched. A missing loop entry means "never touched" and is equivalent to
//! [`LoopProgress::new`].
//!
//! # Serialization
//!
//! These types are the persisted form (JSON, camelCase). `completedExercises`
//! is a set but serializes as an array; duplicates in a stored array
//! collapse on load.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{ExerciseId, LoopId, ProgramId};

/// Free-text reflection attached to a loop.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debrief {
    /// Free notes.
    #[serde(default)]
    pub notes: String,

    /// What the learner understood.
    #[serde(default)]
    pub insights: String,

    /// What is still unclear.
    #[serde(default)]
    pub questions: String,
}

impl Debrief {
    /// Creates a debrief from its three fields.
    pub fn new(
        notes: impl Into<String>,
        insights: impl Into<String>,
        questions: impl Into<String>,
    ) -> Self {
        Self {
            notes: notes.into(),
            insights: insights.into(),
            questions: questions.into(),
        }
    }

    /// Returns true if any field has non-whitespace content.
    ///
    /// A filled debrief earns the loop's reflection bonus.
    pub fn is_filled(&self) -> bool {
        [&self.notes, &self.insights, &self.questions]
            .iter()
            .any(|field| !field.trim().is_empty())
    }
}

/// What the user has done in one loop.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopProgress {
    /// The loop this record belongs to. Always equal to its map key.
    #[serde(default)]
    pub loop_id: LoopId,

    /// Checked exercises.
    pub completed_exercises: BTreeSet<ExerciseId>,

    /// XP earned in this loop. Derived: equals `calculate_loop_xp` for the
    /// loop after every mutation.
    pub xp_earned: u32,

    /// Explicitly marked completed by the user.
    pub completed: bool,

    /// Reflection text.
    #[serde(default)]
    pub debrief: Debrief,
}

impl LoopProgress {
    /// Creates an untouched record for `loop_id`.
    pub fn new(loop_id: impl Into<LoopId>) -> Self {
        Self {
            loop_id: loop_id.into(),
            ..Default::default()
        }
    }

    /// Returns true if `exercise_id` is checked.
    #[inline]
    pub fn is_exercise_completed(&self, exercise_id: &str) -> bool {
        self.completed_exercises.contains(exercise_id)
    }
}

/// All progress for one program.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    /// Total XP. Always the sum of every loop's `xp_earned`.
    pub total_xp: u32,

    /// Per-loop records, created lazily.
    pub loops: BTreeMap<LoopId, LoopProgress>,
}

impl UserProgress {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `loop_id`, if the loop was ever touched.
    #[inline]
    pub fn loop_progress(&self, loop_id: &str) -> Option<&LoopProgress> {
        self.loops.get(loop_id)
    }

    /// Returns the record for `loop_id`, creating a fresh one if absent.
    ///
    /// This is the only place default loop records are constructed.
    pub fn get_or_create_loop_progress(&mut self, loop_id: &LoopId) -> &mut LoopProgress {
        self.loops
            .entry(loop_id.clone())
            .or_insert_with(|| LoopProgress::new(loop_id.clone()))
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.total_xp == 0 && self.loops.is_empty()
    }

    /// Number of loops marked completed.
    pub fn completed_loop_count(&self) -> usize {
        self.loops.values().filter(|lp| lp.completed).count()
    }

    /// Number of checked exercises across all loops.
    pub fn completed_exercise_count(&self) -> usize {
        self.loops
            .values()
            .map(|lp| lp.completed_exercises.len())
            .sum()
    }

    /// Sum of the stored per-loop XP.
    pub fn loops_xp_sum(&self) -> u32 {
        self.loops
            .values()
            .fold(0u32, |sum, lp| sum.saturating_add(lp.xp_earned))
    }
}

/// Progress of every program, keyed by program id.
pub type ProgramsProgress = BTreeMap<ProgramId, UserProgress>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debrief_default_is_not_filled() {
        assert!(!Debrief::default().is_filled());
    }

    #[test]
    fn test_debrief_whitespace_is_not_filled() {
        let debrief = Debrief::new("  ", "\n", "\t");
        assert!(!debrief.is_filled());
    }

    #[test]
    fn test_debrief_any_field_fills() {
        assert!(Debrief::new("", "", "why?").is_filled());
        assert!(Debrief::new("notes", "", "").is_filled());
    }

    #[test]
    fn test_get_or_create_loop_progress() {
        let mut progress = UserProgress::new();
        let id = LoopId::new("loop-1");

        progress.get_or_create_loop_progress(&id).xp_earned = 7;
        let again = progress.get_or_create_loop_progress(&id);

        assert_eq!(again.loop_id, "loop-1");
        assert_eq!(again.xp_earned, 7);
        assert_eq!(progress.loops.len(), 1);
    }

    #[test]
    fn test_counts() {
        let mut progress = UserProgress::new();
        let lp = progress.get_or_create_loop_progress(&LoopId::new("loop-1"));
        lp.completed_exercises.insert(ExerciseId::new("a"));
        lp.completed_exercises.insert(ExerciseId::new("b"));
        lp.completed = true;
        lp.xp_earned = 30;
        progress
            .get_or_create_loop_progress(&LoopId::new("loop-2"))
            .xp_earned = 5;

        assert_eq!(progress.completed_loop_count(), 1);
        assert_eq!(progress.completed_exercise_count(), 2);
        assert_eq!(progress.loops_xp_sum(), 35);
        assert!(!progress.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let mut lp = LoopProgress::new("loop-1");
        lp.completed_exercises.insert(ExerciseId::new("ex-1"));
        lp.xp_earned = 10;

        let json = serde_json::to_value(&lp).unwrap();
        assert_eq!(json["loopId"], "loop-1");
        assert_eq!(json["completedExercises"][0], "ex-1");
        assert_eq!(json["xpEarned"], 10);
        assert_eq!(json["completed"], false);
        assert_eq!(json["debrief"]["notes"], "");
    }

    #[test]
    fn test_duplicate_completed_exercises_collapse() {
        let json = r#"{
            "loopId": "loop-1",
            "completedExercises": ["ex-1", "ex-1", "ex-2"],
            "xpEarned": 0,
            "completed": false
        }"#;
        let lp: LoopProgress = serde_json::from_str(json).unwrap();
        assert_eq!(lp.completed_exercises.len(), 2);
        assert_eq!(lp.debrief, Debrief::default());
    }

    #[test]
    fn test_negative_xp_is_rejected() {
        let json = r#"{ "totalXp": -5, "loops": {} }"#;
        assert!(serde_json::from_str::<UserProgress>(json).is_err());
    }
}
