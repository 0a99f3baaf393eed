//! XP derivation.
//!
//! XP is never accumulated blindly. A loop's XP is a pure function of the
//! curriculum loop and the user's progress in it:
//!
//! ```text
//! xp(loop) =   Σ xpReward of checked exercises that belong to the loop
//!            + xpBonus.completion           if every exercise is checked
//!            + xpBonus.fullCompletion       if the loop is marked completed
//!            + xpBonus.reflectionCompleted  if the debrief is filled
//! ```
//!
//! Every bonus is live: when its condition stops holding, the bonus is gone
//! on the next recompute. [`calculate_loop_xp`] is the single recompute path
//! used by the store for every mutation.
//!
//! Levels and badges are derived from total XP through [`LevelConfig`].

use crate::config::LevelConfig;
use crate::curriculum::{Loop, Program};
use crate::progress::{LoopProgress, UserProgress};

/// Computes the XP a loop is worth given the user's progress in it.
pub fn calculate_loop_xp(lp: &Loop, progress: &LoopProgress) -> u32 {
    let mut xp = lp
        .exercises
        .iter()
        .filter(|e| progress.is_exercise_completed(e.id.as_str()))
        .fold(0u32, |sum, e| sum.saturating_add(e.xp_reward));

    let all_checked = !lp.exercises.is_empty()
        && lp
            .exercises
            .iter()
            .all(|e| progress.is_exercise_completed(e.id.as_str()));
    if all_checked {
        xp = xp.saturating_add(lp.xp_bonus.completion);
    }

    if progress.completed {
        xp = xp.saturating_add(lp.xp_bonus.full_completion);
    }

    if progress.debrief.is_filled() {
        xp = xp.saturating_add(lp.xp_bonus.reflection_completed);
    }

    xp
}

/// Computes a program's total XP from scratch.
///
/// Loops without a progress entry contribute nothing.
pub fn calculate_total_xp(program: &Program, progress: &UserProgress) -> u32 {
    program
        .loops()
        .filter_map(|lp| {
            progress
                .loop_progress(lp.id.as_str())
                .map(|p| calculate_loop_xp(lp, p))
        })
        .fold(0u32, |sum, xp| sum.saturating_add(xp))
}

/// The most XP a loop can ever yield: every reward plus every bonus.
pub fn loop_xp_potential(lp: &Loop) -> u32 {
    lp.exercises_xp().saturating_add(lp.xp_bonus.total())
}

/// XP still available in a loop.
///
/// Negative only if the stored XP is inconsistent with the curriculum.
pub fn loop_xp_remaining(lp: &Loop, progress: Option<&LoopProgress>) -> i64 {
    let earned = progress.map(|p| p.xp_earned).unwrap_or(0);
    i64::from(loop_xp_potential(lp)) - i64::from(earned)
}

/// Highest level whose threshold `xp` reaches.
pub fn level_for_xp(levels: &LevelConfig, xp: u32) -> usize {
    levels
        .thresholds
        .iter()
        .rposition(|&threshold| xp >= threshold)
        .unwrap_or(0)
}

/// XP missing to reach the next level; 0 at the top level.
pub fn xp_for_next_level(levels: &LevelConfig, xp: u32) -> u32 {
    let level = level_for_xp(levels, xp);
    match levels.thresholds.get(level + 1) {
        Some(&next) => next.saturating_sub(xp),
        None => 0,
    }
}

/// Names of every badge `xp` has reached, in ascending order.
///
/// Computed from the XP passed in: badges can disappear if XP drops.
pub fn badges_for_xp(levels: &LevelConfig, xp: u32) -> Vec<String> {
    levels
        .badges
        .iter()
        .filter(|b| xp >= b.xp)
        .map(|b| b.name.clone())
        .collect()
}
