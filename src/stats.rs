//! Derived statistics.
//!
//! Nothing here is stored. Every figure is recomputed from a curriculum and
//! the matching progress record, so it can never drift from the data.
//!
//! Exercise and loop counts only consider entities that exist in the
//! curriculum: progress left behind by a loop that was removed from a
//! program does not inflate completion figures.

use serde::Serialize;

use crate::curriculum::{Loop, Program};
use crate::progress::{LoopProgress, UserProgress};
use crate::registry::ProgramMetadata;
use crate::xp::calculate_loop_xp;

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

// ============================================================================
// Loop
// ============================================================================

/// Statistics for one loop.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopStats {
    /// Exercises in the loop.
    pub total_exercises: usize,
    /// Checked exercises that belong to the loop.
    pub completed_exercises: usize,
    /// `completed_exercises / total_exercises * 100`, 0 for an empty loop.
    pub completion_percentage: f64,
    /// The loop is explicitly marked completed.
    pub is_completed: bool,
    /// Every exercise is checked (never true for an empty loop).
    pub all_exercises_completed: bool,
    /// XP the loop is worth right now.
    pub xp_earned: u32,
}

impl LoopStats {
    /// Computes statistics for `lp`; `progress` is `None` for an untouched loop.
    pub fn compute(lp: &Loop, progress: Option<&LoopProgress>) -> Self {
        let total_exercises = lp.exercises.len();
        let completed_exercises = progress
            .map(|p| {
                lp.exercises
                    .iter()
                    .filter(|e| p.is_exercise_completed(e.id.as_str()))
                    .count()
            })
            .unwrap_or(0);

        Self {
            total_exercises,
            completed_exercises,
            completion_percentage: percentage(completed_exercises, total_exercises),
            is_completed: progress.map(|p| p.completed).unwrap_or(false),
            all_exercises_completed: total_exercises > 0
                && completed_exercises == total_exercises,
            xp_earned: progress.map(|p| calculate_loop_xp(lp, p)).unwrap_or(0),
        }
    }
}

// ============================================================================
// Program
// ============================================================================

/// Statistics for one program.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramStats {
    /// Loops in the curriculum.
    pub total_loops: usize,
    /// Loops marked completed.
    pub completed_loops: usize,
    /// Exercises in the curriculum.
    pub total_exercises: usize,
    /// Checked exercises.
    pub completed_exercises: usize,
    /// `completed_loops / total_loops * 100`, 0 for an empty program.
    pub completion_percentage: f64,
    /// Completed loops counted from the first loop until the first gap.
    pub current_streak: usize,
    /// Longest run of consecutive completed loops anywhere in the program.
    pub longest_streak: usize,
    /// Stored total XP.
    pub total_xp: u32,
}

impl ProgramStats {
    /// Computes statistics for `program` from its progress record.
    pub fn compute(program: &Program, progress: &UserProgress) -> Self {
        let mut stats = Self {
            total_loops: 0,
            completed_loops: 0,
            total_exercises: 0,
            completed_exercises: 0,
            completion_percentage: 0.0,
            current_streak: 0,
            longest_streak: 0,
            total_xp: progress.total_xp,
        };

        let mut run = 0usize;
        let mut gap_seen = false;

        for lp in program.loops() {
            let loop_stats = LoopStats::compute(lp, progress.loop_progress(lp.id.as_str()));

            stats.total_loops += 1;
            stats.total_exercises += loop_stats.total_exercises;
            stats.completed_exercises += loop_stats.completed_exercises;

            if loop_stats.is_completed {
                stats.completed_loops += 1;
                run += 1;
                stats.longest_streak = stats.longest_streak.max(run);
                if !gap_seen {
                    stats.current_streak += 1;
                }
            } else {
                run = 0;
                gap_seen = true;
            }
        }

        stats.completion_percentage = percentage(stats.completed_loops, stats.total_loops);
        stats
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Where the user stands in a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramStatus {
    /// No loop completed.
    NotStarted,
    /// Some loops completed.
    InProgress,
    /// Rounded progress reached 100%.
    Completed,
}

impl ProgramStatus {
    /// Status for a rounded progress percentage.
    pub fn from_percent(progress_percent: u32) -> Self {
        match progress_percent {
            100.. => Self::Completed,
            1..=99 => Self::InProgress,
            0 => Self::NotStarted,
        }
    }
}

/// Headline figures of one program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSummary {
    /// Stored total XP.
    pub total_xp: u32,
    /// Loops marked completed.
    pub completed_loops: usize,
    /// Loops in the curriculum.
    pub total_loops: usize,
    /// Completed loop share, rounded to the nearest integer percent.
    pub progress_percent: u32,
    /// Checked exercises.
    pub completed_exercises: usize,
    /// Exercises in the curriculum.
    pub total_exercises: usize,
}

/// One registry entry with the user's standing in it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramOverview {
    /// Registry metadata.
    pub metadata: ProgramMetadata,
    /// Current status.
    pub status: ProgramStatus,
    /// `None` when the curriculum could not be loaded.
    pub summary: Option<ProgramSummary>,
}

impl ProgramOverview {
    /// Builds the overview of one program.
    ///
    /// `program` is `None` when the curriculum failed to load; `progress` is
    /// `None` when the user never opened the program.
    pub fn compute(
        metadata: ProgramMetadata,
        program: Option<&Program>,
        progress: Option<&UserProgress>,
    ) -> Self {
        let Some(program) = program else {
            return Self {
                metadata,
                status: ProgramStatus::NotStarted,
                summary: None,
            };
        };

        let empty = UserProgress::default();
        let stats = ProgramStats::compute(program, progress.unwrap_or(&empty));
        let progress_percent = stats.completion_percentage.round() as u32;

        Self {
            metadata,
            status: ProgramStatus::from_percent(progress_percent),
            summary: Some(ProgramSummary {
                total_xp: stats.total_xp,
                completed_loops: stats.completed_loops,
                total_loops: stats.total_loops,
                progress_percent,
                completed_exercises: stats.completed_exercises,
                total_exercises: stats.total_exercises,
            }),
        }
    }

    /// Rounded progress percent, 0 without a summary.
    pub fn progress_percent(&self) -> u32 {
        self.summary.as_ref().map(|s| s.progress_percent).unwrap_or(0)
    }
}

/// Aggregate figures across the whole catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    /// XP summed over every program.
    pub total_xp: u32,
    /// Programs with status `Completed`.
    pub completed_programs: usize,
    /// Programs with status `InProgress`.
    pub in_progress_programs: usize,
    /// Registered programs.
    pub total_programs: usize,
    /// Mean of the rounded progress percents, rounded.
    pub average_progress: u32,
}

/// Every registered program with the user's standing, plus totals.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOverview {
    /// Programs in registry order.
    pub programs: Vec<ProgramOverview>,
    /// Totals.
    pub stats: CatalogStats,
}

impl CatalogOverview {
    /// Aggregates per-program overviews.
    pub fn from_programs(programs: Vec<ProgramOverview>) -> Self {
        let mut stats = CatalogStats {
            total_programs: programs.len(),
            ..Default::default()
        };
        let mut percent_sum = 0u64;

        for overview in &programs {
            if let Some(summary) = &overview.summary {
                stats.total_xp = stats.total_xp.saturating_add(summary.total_xp);
            }
            percent_sum += u64::from(overview.progress_percent());
            match overview.status {
                ProgramStatus::Completed => stats.completed_programs += 1,
                ProgramStatus::InProgress => stats.in_progress_programs += 1,
                ProgramStatus::NotStarted => {}
            }
        }

        if stats.total_programs > 0 {
            stats.average_progress =
                (percent_sum as f64 / stats.total_programs as f64).round() as u32;
        }

        Self { programs, stats }
    }

    /// Programs with the given status, in registry order.
    pub fn with_status(&self, status: ProgramStatus) -> impl Iterator<Item = &ProgramOverview> {
        self.programs.iter().filter(move |p| p.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::{Chapter, Exercise, ExerciseType, Path, XpBonus};
    use crate::types::{ExerciseId, LoopId, ProgramId};

    fn lp(id: &str, exercises: &[(&str, u32)]) -> Loop {
        Loop {
            id: LoopId::new(id),
            day: 1,
            title: id.into(),
            goal: String::new(),
            xp_bonus: XpBonus {
                completion: 5,
                full_completion: 20,
                reflection_completed: 3,
            },
            exercises: exercises
                .iter()
                .map(|(e, xp)| Exercise {
                    id: ExerciseId::new(*e),
                    exercise_type: ExerciseType::Practice,
                    label: e.to_string(),
                    estimated_minutes: 5,
                    xp_reward: *xp,
                    resources: vec![],
                })
                .collect(),
            debrief: Default::default(),
        }
    }

    fn program(loops: Vec<Loop>) -> Program {
        Program {
            id: ProgramId::new("p"),
            title: "P".into(),
            description: String::new(),
            estimated_hours_per_loop: 1.0,
            paths: vec![Path {
                id: "path".into(),
                title: "Path".into(),
                objective: String::new(),
                chapters: vec![Chapter {
                    id: "c".into(),
                    title: "C".into(),
                    loops,
                }],
            }],
        }
    }

    fn four_loops() -> Program {
        program(vec![
            lp("l1", &[("a", 10)]),
            lp("l2", &[("b", 10)]),
            lp("l3", &[("c", 10)]),
            lp("l4", &[("d", 10)]),
        ])
    }

    fn completed(progress: &mut UserProgress, ids: &[&str]) {
        for id in ids {
            progress.get_or_create_loop_progress(&LoopId::new(*id)).completed = true;
        }
    }

    fn metadata(id: &str) -> ProgramMetadata {
        ProgramMetadata::new(id, id.to_uppercase())
    }

    #[test]
    fn test_loop_stats_untouched() {
        let l = lp("l1", &[("a", 10), ("b", 15)]);
        let stats = LoopStats::compute(&l, None);
        assert_eq!(stats.total_exercises, 2);
        assert_eq!(stats.completed_exercises, 0);
        assert_eq!(stats.completion_percentage, 0.0);
        assert!(!stats.is_completed);
        assert_eq!(stats.xp_earned, 0);
    }

    #[test]
    fn test_loop_stats_partial() {
        let l = lp("l1", &[("a", 10), ("b", 15)]);
        let mut p = LoopProgress::new("l1");
        p.completed_exercises.insert(ExerciseId::new("a"));
        p.completed_exercises.insert(ExerciseId::new("stray"));

        let stats = LoopStats::compute(&l, Some(&p));
        assert_eq!(stats.completed_exercises, 1);
        assert_eq!(stats.completion_percentage, 50.0);
        assert!(!stats.all_exercises_completed);
        assert_eq!(stats.xp_earned, 10);
    }

    #[test]
    fn test_loop_stats_empty_loop() {
        let l = lp("l1", &[]);
        let stats = LoopStats::compute(&l, Some(&LoopProgress::new("l1")));
        assert_eq!(stats.completion_percentage, 0.0);
        assert!(!stats.all_exercises_completed);
    }

    #[test]
    fn test_streaks() {
        let program = four_loops();
        let mut progress = UserProgress::new();
        completed(&mut progress, &["l1", "l3", "l4"]);

        let stats = ProgramStats::compute(&program, &progress);
        assert_eq!(stats.completed_loops, 3);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 2);
        assert_eq!(stats.completion_percentage, 75.0);
    }

    #[test]
    fn test_no_streak_when_first_loop_open() {
        let program = four_loops();
        let mut progress = UserProgress::new();
        completed(&mut progress, &["l2"]);

        let stats = ProgramStats::compute(&program, &progress);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 1);
    }

    #[test]
    fn test_orphan_progress_is_not_counted() {
        let program = four_loops();
        let mut progress = UserProgress::new();
        completed(&mut progress, &["removed-loop"]);

        let stats = ProgramStats::compute(&program, &progress);
        assert_eq!(stats.completed_loops, 0);
        assert_eq!(stats.total_loops, 4);
    }

    #[test]
    fn test_status_from_percent() {
        assert_eq!(ProgramStatus::from_percent(0), ProgramStatus::NotStarted);
        assert_eq!(ProgramStatus::from_percent(1), ProgramStatus::InProgress);
        assert_eq!(ProgramStatus::from_percent(100), ProgramStatus::Completed);
    }

    #[test]
    fn test_overview_rounds_percent() {
        let program = program(vec![lp("l1", &[]), lp("l2", &[]), lp("l3", &[])]);
        let mut progress = UserProgress::new();
        completed(&mut progress, &["l1", "l2"]);

        let overview = ProgramOverview::compute(metadata("p"), Some(&program), Some(&progress));
        assert_eq!(overview.progress_percent(), 67);
        assert_eq!(overview.status, ProgramStatus::InProgress);
    }

    #[test]
    fn test_overview_without_progress() {
        let overview = ProgramOverview::compute(metadata("p"), Some(&four_loops()), None);
        assert_eq!(overview.status, ProgramStatus::NotStarted);
        let summary = overview.summary.unwrap();
        assert_eq!(summary.total_loops, 4);
        assert_eq!(summary.total_xp, 0);
    }

    #[test]
    fn test_overview_unloadable_program() {
        let overview = ProgramOverview::compute(metadata("p"), None, None);
        assert!(overview.summary.is_none());
        assert_eq!(overview.progress_percent(), 0);
    }

    #[test]
    fn test_catalog_stats() {
        let program = four_loops();
        let mut done = UserProgress::new();
        completed(&mut done, &["l1", "l2", "l3", "l4"]);
        done.total_xp = 120;
        let mut half = UserProgress::new();
        completed(&mut half, &["l1", "l2"]);
        half.total_xp = 30;

        let catalog = CatalogOverview::from_programs(vec![
            ProgramOverview::compute(metadata("a"), Some(&program), Some(&done)),
            ProgramOverview::compute(metadata("b"), Some(&program), Some(&half)),
            ProgramOverview::compute(metadata("c"), Some(&program), None),
        ]);

        assert_eq!(catalog.stats.total_programs, 3);
        assert_eq!(catalog.stats.completed_programs, 1);
        assert_eq!(catalog.stats.in_progress_programs, 1);
        assert_eq!(catalog.stats.total_xp, 150);
        assert_eq!(catalog.stats.average_progress, 50);
        assert_eq!(catalog.with_status(ProgramStatus::NotStarted).count(), 1);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = CatalogOverview::from_programs(vec![]);
        assert_eq!(catalog.stats, CatalogStats::default());
    }
}
