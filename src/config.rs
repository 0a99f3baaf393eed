//! Configuration types for SkillLoop.
//!
//! The [`Config`] struct controls store behavior including:
//! - The storage key the progress snapshot lives under
//! - The program id legacy single-program snapshots migrate into
//! - Level thresholds and badges
//! - Write durability
//!
//! # Example
//! ```rust
//! use skillloop::{Config, SyncMode};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Customize
//! let config = Config {
//!     storage_key: "my-progress".to_string(),
//!     sync_mode: SyncMode::Fast,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::ProgramId;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "skillloop-progress";

/// Program that single-program (version 1) snapshots are migrated into.
pub const DEFAULT_LEGACY_PROGRAM_ID: &str = "skillloop-ai-foundations";

/// Store configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings:
///
/// ```rust
/// use skillloop::Config;
///
/// let config = Config {
///     repair_on_load: false,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Key the progress snapshot is stored under.
    pub storage_key: String,

    /// Program id that legacy single-program snapshots are migrated into.
    pub legacy_program_id: ProgramId,

    /// Level thresholds and badges.
    pub levels: LevelConfig,

    /// Durability mode for snapshot writes.
    pub sync_mode: SyncMode,

    /// Recompute stored XP against the curriculum whenever a program is loaded.
    ///
    /// Snapshots written by older releases may carry XP that no longer
    /// matches the derivation rules; this repairs them. Default: `true`.
    pub repair_on_load: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            legacy_program_id: ProgramId::new(DEFAULT_LEGACY_PROGRAM_ID),
            levels: LevelConfig::default(),
            sync_mode: SyncMode::Normal,
            repair_on_load: true,
        }
    }
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// Called automatically when a [`ProgressStore`](crate::ProgressStore)
    /// is constructed.
    ///
    /// # Errors
    /// Returns `ValidationError` if:
    /// - `storage_key` or `legacy_program_id` is empty
    /// - the level table is invalid (see [`LevelConfig::validate`])
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.storage_key.trim().is_empty() {
            return Err(ValidationError::required_field("storage_key"));
        }

        if self.legacy_program_id.as_str().trim().is_empty() {
            return Err(ValidationError::required_field("legacy_program_id"));
        }

        self.levels.validate()
    }
}

/// A named XP milestone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    /// Total XP needed to earn the badge.
    pub xp: u32,

    /// Display name.
    pub name: String,
}

impl Badge {
    /// Creates a badge awarded at `xp` total XP.
    pub fn new(xp: u32, name: impl Into<String>) -> Self {
        Self {
            xp,
            name: name.into(),
        }
    }
}

/// Level and badge tables.
///
/// Level `N` is reached when total XP is at least `thresholds[N]`; the
/// current level is the highest such index. Badges are awarded the same way
/// from their own thresholds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Cumulative XP needed for each level, ascending, starting at 0.
    pub thresholds: Vec<u32>,

    /// Badges, ascending by XP.
    pub badges: Vec<Badge>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![0, 100, 250, 450, 700, 1000, 1350, 1750],
            badges: vec![
                Badge::new(100, "Beginner"),
                Badge::new(250, "Apprentice"),
                Badge::new(450, "Competent"),
                Badge::new(700, "Expert"),
                Badge::new(1000, "Master"),
            ],
        }
    }
}

impl LevelConfig {
    /// Returns the highest reachable level index.
    #[inline]
    pub fn max_level(&self) -> usize {
        self.thresholds.len().saturating_sub(1)
    }

    /// Validates the level table.
    ///
    /// # Errors
    /// Returns `ValidationError` if:
    /// - `thresholds` is empty or does not start at 0
    /// - `thresholds` is not strictly ascending
    /// - `badges` is not strictly ascending by XP
    /// - a badge has an empty name
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.thresholds.first() {
            None => return Err(ValidationError::required_field("levels.thresholds")),
            Some(&first) if first != 0 => {
                return Err(ValidationError::invalid_field(
                    "levels.thresholds",
                    format!("first threshold must be 0, got {}", first),
                ));
            }
            Some(_) => {}
        }

        if let Some(pair) = self.thresholds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ValidationError::invalid_field(
                "levels.thresholds",
                format!("must be strictly ascending ({} >= {})", pair[0], pair[1]),
            ));
        }

        if let Some(pair) = self.badges.windows(2).find(|w| w[0].xp >= w[1].xp) {
            return Err(ValidationError::invalid_field(
                "levels.badges",
                format!(
                    "must be strictly ascending by xp ('{}' at {} >= '{}' at {})",
                    pair[0].name, pair[0].xp, pair[1].name, pair[1].xp
                ),
            ));
        }

        if let Some(i) = self.badges.iter().position(|b| b.name.trim().is_empty()) {
            return Err(ValidationError::invalid_field(
                "levels.badges",
                format!("badge at index {} has an empty name", i),
            ));
        }

        Ok(())
    }
}

/// Durability mode for snapshot writes.
///
/// Controls the trade-off between write performance and crash safety.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Sync to disk on transaction commit.
    ///
    /// This is the default and recommended setting. A crash loses at most
    /// the mutation that was in flight.
    #[default]
    Normal,

    /// Defer fsync (faster writes, may lose recent mutations on crash).
    Fast,

    /// Sync with additional integrity checks on every commit (slowest).
    Paranoid,
}

impl SyncMode {
    /// Returns true if this mode syncs with extra checks on every write.
    pub fn is_paranoid(&self) -> bool {
        matches!(self, Self::Paranoid)
    }

    /// Returns true if this mode defers syncing (may lose data on crash).
    pub fn is_fast(&self) -> bool {
        matches!(self, Self::Fast)
    }
}
