//! The progress store and its lifecycle.
//!
//! [`ProgressStore`] is the session object that owns every piece of mutable
//! state: which program is active, and the progress of every program the
//! user has opened. It provides methods for:
//!
//! - Opening and closing the store
//! - Switching the active program
//! - Checking off exercises, completing loops, writing debriefs
//! - Reading XP, levels, badges and statistics
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use skillloop::{Config, ProgressStore, ProgramRegistry};
//!
//! let mut store = ProgressStore::open("./progress.db", registry, Config::default())?;
//! store.load_program("skillloop-ai-foundations")?;
//!
//! store.complete_exercise("loop-1", "ex-1", 10);
//! println!("level {} with {} XP", store.get_level(), store.get_total_xp());
//!
//! store.close()?;
//! ```
//!
//! # Persistence
//!
//! Every mutation that changes state writes a full snapshot through the
//! storage backend before returning. Write failures are logged and
//! swallowed: the in-memory state stays authoritative and the next
//! successful write catches the backend up. Use [`ProgressStore::save`]
//! to observe write errors.
//!
//! A stored snapshot is never overwritten unless it was read first. If the
//! backend fails to read it at open, the read is retried before the next
//! write and whatever it holds is merged into memory. A snapshot written by
//! a newer release is left untouched for the lifetime of the store.
//!
//! # XP
//!
//! Every mutation recomputes the touched loop through
//! [`calculate_loop_xp`] and applies the difference to the program total,
//! so `total_xp` always equals the sum of the loops' `xp_earned`.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::curriculum::{Loop, Program};
use crate::error::{NotFoundError, Result, SkillLoopError, StorageError};
use crate::progress::{Debrief, LoopProgress, ProgramsProgress, UserProgress};
use crate::registry::ProgramRegistry;
use crate::stats::{CatalogOverview, LoopStats, ProgramOverview, ProgramStats};
use crate::storage::snapshot::{self, DecodedSnapshot, PersistedState, SCHEMA_VERSION};
use crate::storage::{open_storage, KeyValueStore, MemoryStore};
use crate::types::ProgramId;
use crate::xp::{
    badges_for_xp, calculate_loop_xp, level_for_xp, loop_xp_remaining, xp_for_next_level,
};

/// The progress session.
///
/// Create an instance with [`ProgressStore::open()`] (durable) or
/// [`ProgressStore::in_memory()`] (ephemeral), and close it with
/// [`ProgressStore::close()`].
///
/// # Ownership
///
/// All mutation goes through `&mut self`, so there is exactly one writer.
/// `close()` consumes the store.
pub struct ProgressStore {
    /// Storage backend (redb or in-memory).
    storage: Box<dyn KeyValueStore>,

    /// Program catalog.
    registry: Arc<ProgramRegistry>,

    /// Configuration used to open this store.
    config: Config,

    /// Curriculum of the active program. `Some` exactly when
    /// `state.current_program_id` is `Some`.
    current_program: Option<Arc<Program>>,

    /// Persisted state.
    state: PersistedState,

    /// Active program named by the loaded snapshot whose curriculum could
    /// not be loaded. Written back in place of an absent current program.
    unresolved_program_id: Option<ProgramId>,

    /// Set while the stored snapshot must not be overwritten.
    guard: Option<SnapshotGuard>,
}

/// Why the stored snapshot is protected from writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SnapshotGuard {
    /// The backend failed to read it.
    Unread,
    /// It was written by a newer release.
    Newer { found: u32 },
}

impl SnapshotGuard {
    fn error(self) -> SkillLoopError {
        match self {
            Self::Unread => StorageError::unavailable(
                "stored progress snapshot could not be read; refusing to overwrite it",
            )
            .into(),
            Self::Newer { found } => StorageError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            }
            .into(),
        }
    }
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("config", &self.config)
            .field("current_program_id", &self.state.current_program_id)
            .field("programs", &self.state.programs_progress.len())
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens or creates a durable store at the specified path.
    ///
    /// Any snapshot found under `config.storage_key` is loaded (migrating
    /// older versions), and the program that was active when it was written
    /// is re-activated.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration is invalid (see [`Config::validate`])
    /// - The store file is corrupted or locked by another process
    /// - The store format version doesn't match
    ///
    /// An unreadable *snapshot* is not an error: it is logged and the store
    /// starts empty. See the module docs for when it is overwritten.
    #[instrument(skip(path, registry, config), fields(path = %path.as_ref().display()))]
    pub fn open(
        path: impl AsRef<Path>,
        registry: impl Into<Arc<ProgramRegistry>>,
        config: Config,
    ) -> Result<Self> {
        config.validate().map_err(SkillLoopError::from)?;

        info!("Opening progress store");
        let storage = open_storage(&path, &config)?;

        Self::with_storage(storage, registry, config)
    }

    /// Creates a store over a caller-supplied backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_storage(
        storage: Box<dyn KeyValueStore>,
        registry: impl Into<Arc<ProgramRegistry>>,
        config: Config,
    ) -> Result<Self> {
        config.validate().map_err(SkillLoopError::from)?;

        let (decoded, guard) = match read_snapshot(&*storage, &config) {
            Ok(decoded) => (decoded, None),
            Err(guard) => (None, Some(guard)),
        };

        let mut store = Self {
            storage,
            registry: registry.into(),
            config,
            current_program: None,
            state: PersistedState::default(),
            unresolved_program_id: None,
            guard,
        };

        if let Some(decoded) = decoded {
            let mut dirty = decoded.migrated_from.is_some();
            store.state.programs_progress = decoded.state.programs_progress;
            if let Some(program_id) = decoded.state.current_program_id {
                dirty |= store.resume(program_id);
            }
            if dirty {
                store.persist();
            }
        }

        info!(
            programs = store.state.programs_progress.len(),
            current_program = ?store.state.current_program_id,
            sync_mode = ?store.config.sync_mode,
            "Progress store opened"
        );
        Ok(store)
    }

    /// Creates an ephemeral store; nothing survives the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn in_memory(registry: impl Into<Arc<ProgramRegistry>>, config: Config) -> Result<Self> {
        Self::with_storage(Box::new(MemoryStore::new()), registry, config)
    }

    /// Writes the current state to the backend.
    ///
    /// Mutations already do this; call it to observe write errors.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails, or if the
    /// stored snapshot is protected: `StorageError::Unavailable` while it
    /// still cannot be read, `StorageError::SchemaVersionMismatch` if a
    /// newer release wrote it.
    pub fn save(&mut self) -> Result<()> {
        self.ensure_writable()?;

        let bytes = match (&self.state.current_program_id, &self.unresolved_program_id) {
            (None, Some(program_id)) => snapshot::encode(&PersistedState {
                current_program_id: Some(program_id.clone()),
                programs_progress: self.state.programs_progress.clone(),
            })?,
            _ => snapshot::encode(&self.state)?,
        };
        self.storage.set(&self.config.storage_key, &bytes)
    }

    /// Flushes the state and closes the backend.
    ///
    /// # Errors
    ///
    /// Returns the write error if the final flush fails (the backend is
    /// still closed), or the backend's close error.
    #[instrument(skip(self))]
    pub fn close(mut self) -> Result<()> {
        info!("Closing progress store");

        let saved = self.save();
        if let Err(e) = &saved {
            warn!(error = %e, "Final snapshot write failed");
        }
        self.storage.close()?;

        info!("Progress store closed");
        saved
    }

    /// Returns the configuration the store was opened with.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the program catalog.
    #[inline]
    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    /// Returns the backing file, if the backend has one.
    pub fn path(&self) -> Option<&Path> {
        self.storage.path()
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to persist progress snapshot");
        }
    }

    /// Lifts the snapshot guard if the stored snapshot can now be read,
    /// merging what it holds into memory first.
    fn ensure_writable(&mut self) -> Result<()> {
        match self.guard {
            None => return Ok(()),
            Some(guard @ SnapshotGuard::Newer { .. }) => return Err(guard.error()),
            Some(SnapshotGuard::Unread) => {}
        }

        match read_snapshot(&*self.storage, &self.config) {
            Ok(decoded) => {
                self.guard = None;
                if let Some(decoded) = decoded {
                    info!(
                        programs = decoded.state.programs_progress.len(),
                        "Stored snapshot readable again; merging"
                    );
                    self.merge(decoded.state);
                }
                Ok(())
            }
            Err(guard) => {
                self.guard = Some(guard);
                Err(guard.error())
            }
        }
    }

    /// Folds a late-read snapshot into memory.
    ///
    /// Loop records already in memory win over stored ones; stored loops
    /// and programs missing from memory are adopted.
    fn merge(&mut self, stored: PersistedState) {
        for (program_id, stored_progress) in stored.programs_progress {
            let progress = self.state.programs_progress.entry(program_id).or_default();
            for (loop_id, entry) in stored_progress.loops {
                progress.loops.entry(loop_id).or_insert(entry);
            }
            progress.total_xp = progress.loops_xp_sum();
        }

        match stored.current_program_id {
            Some(program_id) if self.current_program.is_none() => {
                self.resume(program_id);
            }
            _ => {
                if self.config.repair_on_load {
                    if let Some((program, progress)) = self.active_mut() {
                        recalculate(program, progress);
                    }
                }
            }
        }
    }

    /// Re-activates the program a snapshot names as current.
    ///
    /// Returns true if stored XP was repaired. A program that cannot be
    /// loaded is remembered so the next write keeps naming it.
    fn resume(&mut self, program_id: ProgramId) -> bool {
        match self.registry.load_program(program_id.as_str()) {
            Ok(program) => self.activate(program),
            Err(e) => {
                warn!(
                    program_id = %program_id,
                    error = %e,
                    "Stored current program could not be loaded; starting without one"
                );
                self.unresolved_program_id = Some(program_id);
                false
            }
        }
    }

    /// Makes `program` current and repairs its progress if configured.
    ///
    /// Returns true if stored XP was repaired.
    fn activate(&mut self, program: Arc<Program>) -> bool {
        let program_id = program.id.clone();
        let progress = self
            .state
            .programs_progress
            .entry(program_id.clone())
            .or_default();

        let repaired = self.config.repair_on_load && recalculate(&program, progress);

        self.state.current_program_id = Some(program_id);
        self.current_program = Some(program);
        self.unresolved_program_id = None;
        repaired
    }

    fn active_mut(&mut self) -> Option<(&Program, &mut UserProgress)> {
        let program = self.current_program.as_deref()?;
        let progress = self
            .state
            .programs_progress
            .entry(program.id.clone())
            .or_default();
        Some((program, progress))
    }

    fn finish(&mut self, changed: bool) -> bool {
        if changed {
            self.persist();
        }
        changed
    }

    // =========================================================================
    // Program selection
    // =========================================================================

    /// Makes `program_id` the active program.
    ///
    /// Creates an empty progress record for it if none exists. Progress of
    /// other programs is untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFoundError::Program` if the id is not registered or its
    /// curriculum fails to load; the active program is then unchanged.
    #[instrument(skip(self))]
    pub fn load_program(&mut self, program_id: &str) -> Result<()> {
        let program = self.registry.load_program(program_id).map_err(|e| {
            warn!(error = %e, "Program could not be loaded");
            NotFoundError::program(program_id)
        })?;

        self.activate(program);
        info!(
            loops = self.current_program.as_ref().map(|p| p.loop_count()),
            total_xp = self.get_total_xp(),
            "Program loaded"
        );

        self.persist();
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Checks off an exercise.
    ///
    /// `xp_reward` is what the caller believes the exercise is worth; the
    /// curriculum's value is authoritative and a mismatch is logged.
    ///
    /// Returns `false` (no-op) if no program is active, the loop or exercise
    /// is unknown, or the exercise is already checked. Never marks the loop
    /// completed.
    pub fn complete_exercise(&mut self, loop_id: &str, exercise_id: &str, xp_reward: u32) -> bool {
        let changed = (|| -> Option<()> {
            let (program, progress) = self.active_mut()?;
            let lp = program.find_loop(loop_id)?;
            let exercise = lp.exercise(exercise_id)?;

            if exercise.xp_reward != xp_reward {
                warn!(
                    loop_id,
                    exercise_id,
                    given = xp_reward,
                    curriculum = exercise.xp_reward,
                    "XP reward differs from curriculum; using curriculum value"
                );
            }

            let entry = progress.get_or_create_loop_progress(&lp.id);
            if !entry.completed_exercises.insert(exercise.id.clone()) {
                return None;
            }

            let xp = apply_recompute(lp, progress);
            debug!(loop_id, exercise_id, loop_xp = xp, total_xp = progress.total_xp, "Exercise completed");
            Some(())
        })()
        .is_some();

        self.finish(changed)
    }

    /// Unchecks an exercise.
    ///
    /// Also clears the loop's `completed` flag, revoking its full-completion
    /// bonus. Returns `false` (no-op) if the exercise was not checked.
    pub fn uncomplete_exercise(&mut self, loop_id: &str, exercise_id: &str) -> bool {
        let changed = (|| -> Option<()> {
            let (program, progress) = self.active_mut()?;
            let lp = program.find_loop(loop_id)?;
            let entry = progress.loops.get_mut(loop_id)?;

            if !entry.completed_exercises.remove(exercise_id) {
                return None;
            }
            entry.completed = false;

            let xp = apply_recompute(lp, progress);
            debug!(loop_id, exercise_id, loop_xp = xp, total_xp = progress.total_xp, "Exercise uncompleted");
            Some(())
        })()
        .is_some();

        self.finish(changed)
    }

    /// Marks a loop completed, granting its full-completion bonus.
    ///
    /// The bonus comes from the curriculum; a differing `bonus_xp` is logged
    /// and ignored. Returns `false` (no-op) if the loop was never touched or
    /// is already completed, so the bonus is never granted twice.
    pub fn complete_loop(&mut self, loop_id: &str, bonus_xp: Option<u32>) -> bool {
        let changed = (|| -> Option<()> {
            let (program, progress) = self.active_mut()?;
            let lp = program.find_loop(loop_id)?;
            let entry = progress.loops.get_mut(loop_id)?;

            if entry.completed {
                return None;
            }
            if let Some(given) = bonus_xp.filter(|&b| b != lp.xp_bonus.full_completion) {
                warn!(
                    loop_id,
                    given,
                    curriculum = lp.xp_bonus.full_completion,
                    "Completion bonus differs from curriculum; using curriculum value"
                );
            }
            entry.completed = true;

            let xp = apply_recompute(lp, progress);
            debug!(loop_id, loop_xp = xp, total_xp = progress.total_xp, "Loop completed");
            Some(())
        })()
        .is_some();

        self.finish(changed)
    }

    /// Clears a loop's `completed` flag, revoking its full-completion bonus.
    ///
    /// Returns `false` (no-op) if the loop is not completed.
    pub fn mark_loop_uncompleted(&mut self, loop_id: &str) -> bool {
        let changed = (|| -> Option<()> {
            let (program, progress) = self.active_mut()?;
            let lp = program.find_loop(loop_id)?;
            let entry = progress.loops.get_mut(loop_id)?;

            if !entry.completed {
                return None;
            }
            entry.completed = false;

            let xp = apply_recompute(lp, progress);
            debug!(loop_id, loop_xp = xp, total_xp = progress.total_xp, "Loop marked uncompleted");
            Some(())
        })()
        .is_some();

        self.finish(changed)
    }

    /// Replaces a loop's debrief.
    ///
    /// The reflection bonus is granted as soon as any field is non-blank and
    /// revoked when all fields are blank again. Returns `false` if the loop
    /// is unknown or the debrief is unchanged.
    pub fn update_debrief(&mut self, loop_id: &str, debrief: Debrief) -> bool {
        let changed = (|| -> Option<()> {
            let (program, progress) = self.active_mut()?;
            let lp = program.find_loop(loop_id)?;

            let existed = progress.loops.contains_key(loop_id);
            let entry = progress.get_or_create_loop_progress(&lp.id);
            if existed && entry.debrief == debrief {
                return None;
            }
            entry.debrief = debrief;

            let xp = apply_recompute(lp, progress);
            debug!(loop_id, loop_xp = xp, total_xp = progress.total_xp, "Debrief updated");
            Some(())
        })()
        .is_some();

        self.finish(changed)
    }

    /// Recomputes every loop of the active program from the curriculum.
    ///
    /// Loop records whose loop no longer exists keep their checked
    /// exercises but earn no XP. Returns `true` if any stored XP changed.
    pub fn recalculate_xp(&mut self) -> bool {
        let changed = match self.active_mut() {
            Some((program, progress)) => recalculate(program, progress),
            None => false,
        };
        self.finish(changed)
    }

    /// Clears one program's progress.
    ///
    /// `None` targets the active program. The program stays active.
    /// Returns `false` if there is no target, or if `program_id` names a
    /// program that is neither registered nor has stored progress.
    pub fn reset_progress(&mut self, program_id: Option<&str>) -> bool {
        let target = match program_id {
            Some(id)
                if !self.state.programs_progress.contains_key(id)
                    && !self.registry.exists(id) =>
            {
                debug!(program_id = id, "Reset of unknown program ignored");
                return false;
            }
            Some(id) => ProgramId::new(id),
            None => match &self.state.current_program_id {
                Some(id) => id.clone(),
                None => return false,
            },
        };

        info!(program_id = %target, "Resetting program progress");
        self.state
            .programs_progress
            .insert(target, UserProgress::default());
        self.finish(true)
    }

    /// Clears all progress of every program and the active program, and
    /// removes the stored snapshot.
    ///
    /// This also removes a snapshot that could not be read or that a newer
    /// release wrote.
    pub fn reset_all(&mut self) {
        info!(
            programs = self.state.programs_progress.len(),
            "Resetting all progress"
        );

        self.state = PersistedState::default();
        self.current_program = None;
        self.unresolved_program_id = None;

        match self.storage.remove(&self.config.storage_key) {
            Ok(_) => self.guard = None,
            Err(e) => warn!(error = %e, "Failed to remove progress snapshot"),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Id of the active program.
    pub fn current_program_id(&self) -> Option<&ProgramId> {
        self.state.current_program_id.as_ref()
    }

    /// Curriculum of the active program.
    pub fn current_program(&self) -> Option<&Program> {
        self.current_program.as_deref()
    }

    /// Progress of the active program.
    pub fn current_progress(&self) -> Option<&UserProgress> {
        let id = self.state.current_program_id.as_ref()?;
        self.state.programs_progress.get(id)
    }

    /// Progress of every program.
    pub fn programs_progress(&self) -> &ProgramsProgress {
        &self.state.programs_progress
    }

    /// Progress of one loop of the active program.
    pub fn get_loop_progress(&self, loop_id: &str) -> Option<&LoopProgress> {
        self.current_progress()?.loop_progress(loop_id)
    }

    /// Returns true if the exercise is checked in the active program.
    pub fn is_exercise_completed(&self, loop_id: &str, exercise_id: &str) -> bool {
        self.get_loop_progress(loop_id)
            .is_some_and(|lp| lp.is_exercise_completed(exercise_id))
    }

    /// Total XP of the active program; 0 without one.
    pub fn get_total_xp(&self) -> u32 {
        self.current_progress().map(|p| p.total_xp).unwrap_or(0)
    }

    /// XP still available in a loop; 0 for an unknown loop.
    pub fn get_loop_xp_remaining(&self, loop_id: &str) -> i64 {
        match self.find_loop(loop_id) {
            Some(lp) => loop_xp_remaining(lp, self.get_loop_progress(loop_id)),
            None => 0,
        }
    }

    /// Current level of the active program's XP.
    pub fn get_level(&self) -> usize {
        level_for_xp(&self.config.levels, self.get_total_xp())
    }

    /// XP missing to reach the next level; 0 at the top level.
    pub fn get_xp_for_next_level(&self) -> u32 {
        xp_for_next_level(&self.config.levels, self.get_total_xp())
    }

    /// Names of the badges earned with the active program's XP.
    pub fn badges_earned(&self) -> Vec<String> {
        badges_for_xp(&self.config.levels, self.get_total_xp())
    }

    /// Statistics of one loop of the active program.
    pub fn loop_stats(&self, loop_id: &str) -> Option<LoopStats> {
        let lp = self.find_loop(loop_id)?;
        Some(LoopStats::compute(lp, self.get_loop_progress(loop_id)))
    }

    /// Statistics of the active program.
    pub fn program_stats(&self) -> Option<ProgramStats> {
        let program = self.current_program()?;
        let empty = UserProgress::default();
        Some(ProgramStats::compute(
            program,
            self.current_progress().unwrap_or(&empty),
        ))
    }

    /// First loop of the active program scheduled for `day`.
    pub fn find_loop_by_day(&self, day: u32) -> Option<&Loop> {
        self.current_program()?.find_loop_by_day(day)
    }

    /// Every registered program with the user's standing in it.
    ///
    /// Programs whose curriculum fails to load are listed without a summary.
    pub fn catalog_overview(&self) -> CatalogOverview {
        let programs = self
            .registry
            .list_metadata()
            .into_iter()
            .map(|metadata| {
                let program = match self.registry.load_program(metadata.id.as_str()) {
                    Ok(program) => Some(program),
                    Err(e) => {
                        warn!(program_id = %metadata.id, error = %e, "Program could not be loaded");
                        None
                    }
                };
                ProgramOverview::compute(
                    metadata.clone(),
                    program.as_deref(),
                    self.state.programs_progress.get(&metadata.id),
                )
            })
            .collect();

        CatalogOverview::from_programs(programs)
    }

    fn find_loop(&self, loop_id: &str) -> Option<&Loop> {
        self.current_program()?.find_loop(loop_id)
    }
}

// ProgressStore is auto Send + Sync: Box<dyn KeyValueStore> (Send + Sync
// supertraits), Arc<ProgramRegistry>, Config and the state are all Send + Sync.

/// Recomputes `lp`'s XP and applies the difference to the program total.
///
/// Returns the loop's new XP.
fn apply_recompute(lp: &Loop, progress: &mut UserProgress) -> u32 {
    let entry = progress.get_or_create_loop_progress(&lp.id);
    let before = entry.xp_earned;
    let after = calculate_loop_xp(lp, entry);
    entry.xp_earned = after;

    progress.total_xp = progress
        .total_xp
        .saturating_sub(before)
        .saturating_add(after);
    after
}

/// Recomputes every loop record of `progress` and the total.
///
/// Returns true if anything changed.
fn recalculate(program: &Program, progress: &mut UserProgress) -> bool {
    let mut changed = false;

    for (loop_id, entry) in progress.loops.iter_mut() {
        let xp = program
            .find_loop(loop_id.as_str())
            .map(|lp| calculate_loop_xp(lp, entry))
            .unwrap_or(0);
        if entry.xp_earned != xp {
            debug!(loop_id = %loop_id, stored = entry.xp_earned, derived = xp, "Repairing loop XP");
            entry.xp_earned = xp;
            changed = true;
        }
    }

    let total = progress.loops_xp_sum();
    if progress.total_xp != total {
        warn!(
            program_id = %program.id,
            stored = progress.total_xp,
            derived = total,
            "Stored XP disagreed with curriculum; repaired"
        );
        progress.total_xp = total;
        changed = true;
    }

    changed
}

/// Reads and decodes the stored snapshot.
///
/// `Ok(None)` means there is nothing worth keeping: no snapshot, or one
/// that is malformed. `Err` means the stored bytes must not be overwritten.
fn read_snapshot(
    storage: &dyn KeyValueStore,
    config: &Config,
) -> std::result::Result<Option<DecodedSnapshot>, SnapshotGuard> {
    let bytes = match storage.get(&config.storage_key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!("No progress snapshot; starting empty");
            return Ok(None);
        }
        Err(e) => {
            warn!(error = %e, "Progress snapshot could not be read; holding writes until it can");
            return Err(SnapshotGuard::Unread);
        }
    };

    match snapshot::decode(&bytes, &config.legacy_program_id) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(SkillLoopError::Storage(StorageError::SchemaVersionMismatch { found, .. })) => {
            warn!(found, "Progress snapshot written by a newer release; leaving it untouched");
            Err(SnapshotGuard::Newer { found })
        }
        Err(e) => {
            warn!(error = %e, "Discarding unreadable progress snapshot");
            Ok(None)
        }
    }
}
