//! Versioned progress snapshot codec.
//!
//! The store persists its whole state as one JSON value under
//! `Config::storage_key`:
//!
//! ```json
//! { "state": { "currentProgramId": "...", "programsProgress": { ... } }, "version": 2 }
//! ```
//!
//! # Versions
//!
//! | Version | `state` shape | Handling |
//! |---------|---------------|----------|
//! | 0, 1 | `{ totalXp, loops }` (one implicit program) | migrated |
//! | 2 | [`PersistedState`] | read as is |
//! | > 2 | unknown | rejected |
//!
//! Older releases also wrote the single-program state bare, without an
//! envelope; that form is migrated like version 1. Migration files the
//! legacy progress under `Config::legacy_program_id` and makes it current.
//!
//! Decoding normalizes what it reads: a `loopId` that disagrees with its
//! map key takes the key, and duplicate completed exercises collapse.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::progress::{LoopProgress, ProgramsProgress, UserProgress};
use crate::types::{LoopId, ProgramId};

use std::collections::BTreeMap;

/// Snapshot version written by this build.
pub const SCHEMA_VERSION: u32 = 2;

/// Everything the progress store persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Active program, if any.
    #[serde(default)]
    pub current_program_id: Option<ProgramId>,

    /// Progress per program.
    #[serde(default)]
    pub programs_progress: ProgramsProgress,
}

/// Result of [`decode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedSnapshot {
    /// The normalized state.
    pub state: PersistedState,

    /// Version the snapshot was migrated from, `None` if it was current.
    pub migrated_from: Option<u32>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a PersistedState,
    version: u32,
}

/// Single-program state written by versions 0 and 1.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyState {
    #[serde(default)]
    total_xp: u32,
    #[serde(default)]
    loops: BTreeMap<LoopId, LoopProgress>,
}

/// Encodes `state` as a current-version envelope.
pub fn encode(state: &PersistedState) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(&EnvelopeRef {
        state,
        version: SCHEMA_VERSION,
    })
    .map_err(StorageError::from)?;
    Ok(bytes)
}

/// Decodes a stored snapshot, migrating older versions.
///
/// # Errors
///
/// - `StorageError::Corrupted` if the bytes are not a recognizable snapshot
/// - `StorageError::SchemaVersionMismatch` if the snapshot comes from a
///   newer release
pub fn decode(bytes: &[u8], legacy_program_id: &ProgramId) -> Result<DecodedSnapshot> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| StorageError::corrupted(format!("snapshot is not JSON: {}", e)))?;

    let Value::Object(mut root) = root else {
        return Err(StorageError::corrupted("snapshot is not a JSON object").into());
    };

    let (version, state) = match root.remove("state") {
        Some(state) => {
            let version = match root.get("version") {
                None => 0,
                Some(v) => v
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| StorageError::corrupted(format!("invalid version: {}", v)))?,
            };
            (version, state)
        }
        None if root.contains_key("totalXp") || root.contains_key("loops") => {
            (1, Value::Object(root))
        }
        None => return Err(StorageError::corrupted("snapshot has no state").into()),
    };

    let mut decoded = match version {
        SCHEMA_VERSION => {
            let state: PersistedState = serde_json::from_value(state)
                .map_err(|e| StorageError::corrupted(format!("invalid state: {}", e)))?;
            DecodedSnapshot {
                state,
                migrated_from: None,
            }
        }
        0 | 1 => {
            let legacy: LegacyState = serde_json::from_value(state)
                .map_err(|e| StorageError::corrupted(format!("invalid legacy state: {}", e)))?;
            info!(
                from = version,
                to = SCHEMA_VERSION,
                program_id = %legacy_program_id,
                loops = legacy.loops.len(),
                "Migrating progress snapshot"
            );
            DecodedSnapshot {
                state: migrate_legacy(legacy, legacy_program_id),
                migrated_from: Some(version),
            }
        }
        found => {
            return Err(StorageError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            }
            .into())
        }
    };

    normalize(&mut decoded.state);
    debug!(
        programs = decoded.state.programs_progress.len(),
        "Snapshot decoded"
    );
    Ok(decoded)
}

fn migrate_legacy(legacy: LegacyState, program_id: &ProgramId) -> PersistedState {
    let mut programs_progress = ProgramsProgress::new();
    programs_progress.insert(
        program_id.clone(),
        UserProgress {
            total_xp: legacy.total_xp,
            loops: legacy.loops,
        },
    );

    PersistedState {
        current_program_id: Some(program_id.clone()),
        programs_progress,
    }
}

fn normalize(state: &mut PersistedState) {
    if state
        .current_program_id
        .as_ref()
        .is_some_and(|id| id.is_empty())
    {
        state.current_program_id = None;
    }

    for progress in state.programs_progress.values_mut() {
        for (key, lp) in progress.loops.iter_mut() {
            if lp.loop_id != *key {
                debug!(key = %key, loop_id = %lp.loop_id, "Normalizing loop id");
                lp.loop_id = key.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkillLoopError;
    use crate::types::ExerciseId;

    fn legacy_id() -> ProgramId {
        ProgramId::new("skillloop-ai-foundations")
    }

    fn sample_state() -> PersistedState {
        let mut progress = UserProgress::new();
        let lp = progress.get_or_create_loop_progress(&LoopId::new("loop-1"));
        lp.completed_exercises.insert(ExerciseId::new("ex-1"));
        lp.xp_earned = 10;
        progress.total_xp = 10;

        let mut state = PersistedState {
            current_program_id: Some(ProgramId::new("demo")),
            ..Default::default()
        };
        state.programs_progress.insert(ProgramId::new("demo"), progress);
        state
    }

    #[test]
    fn test_encode_writes_envelope() {
        let bytes = encode(&sample_state()).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["version"], 2);
        assert_eq!(json["state"]["currentProgramId"], "demo");
        assert_eq!(
            json["state"]["programsProgress"]["demo"]["loops"]["loop-1"]["xpEarned"],
            10
        );
    }

    #[test]
    fn test_decode_current_version() {
        let state = sample_state();
        let decoded = decode(&encode(&state).unwrap(), &legacy_id()).unwrap();
        assert_eq!(decoded.state, state);
        assert_eq!(decoded.migrated_from, None);
    }

    #[test]
    fn test_decode_null_current_program() {
        let json = br#"{ "state": { "currentProgramId": null, "programsProgress": {} }, "version": 2 }"#;
        let decoded = decode(json, &legacy_id()).unwrap();
        assert_eq!(decoded.state, PersistedState::default());
    }

    #[test]
    fn test_migrate_v1_envelope() {
        let json = br#"{
            "state": {
                "totalXp": 40,
                "loops": {
                    "loop-1": { "loopId": "loop-1", "completedExercises": ["ex-1"], "xpEarned": 40, "completed": true,
                                "debrief": { "notes": "", "insights": "", "questions": "" } }
                }
            },
            "version": 1
        }"#;

        let decoded = decode(json, &legacy_id()).unwrap();
        assert_eq!(decoded.migrated_from, Some(1));
        assert_eq!(decoded.state.current_program_id, Some(legacy_id()));

        let progress = &decoded.state.programs_progress[&legacy_id()];
        assert_eq!(progress.total_xp, 40);
        assert!(progress.loops["loop-1"].completed);
    }

    #[test]
    fn test_migrate_bare_legacy_object() {
        let json = br#"{ "totalXp": 15, "loops": {} }"#;
        let decoded = decode(json, &ProgramId::new("custom")).unwrap();
        assert_eq!(decoded.migrated_from, Some(1));
        assert_eq!(
            decoded.state.programs_progress[&ProgramId::new("custom")].total_xp,
            15
        );
    }

    #[test]
    fn test_migrate_unversioned_envelope() {
        let json = br#"{ "state": { "loops": {} } }"#;
        let decoded = decode(json, &legacy_id()).unwrap();
        assert_eq!(decoded.migrated_from, Some(0));
        assert_eq!(decoded.state.programs_progress[&legacy_id()].total_xp, 0);
    }

    #[test]
    fn test_future_version_rejected() {
        let json = br#"{ "state": {}, "version": 3 }"#;
        let err = decode(json, &legacy_id()).unwrap_err();
        assert!(matches!(
            err,
            SkillLoopError::Storage(StorageError::SchemaVersionMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_malformed_inputs_rejected() {
        let inputs: [&[u8]; 6] = [
            b"not json",
            b"[1, 2, 3]",
            b"{}",
            br#"{ "state": { "programsProgress": 5 }, "version": 2 }"#,
            br#"{ "state": {}, "version": "two" }"#,
            br#"{ "totalXp": -1, "loops": {} }"#,
        ];
        for input in inputs {
            let err = decode(input, &legacy_id()).unwrap_err();
            assert!(err.is_storage(), "input {:?}", String::from_utf8_lossy(input));
        }
    }

    #[test]
    fn test_loop_id_normalized_to_key() {
        let json = br#"{
            "state": {
                "currentProgramId": "demo",
                "programsProgress": {
                    "demo": { "totalXp": 0, "loops": {
                        "loop-1": { "loopId": "loop-9", "completedExercises": ["a", "a"], "xpEarned": 0, "completed": false }
                    } }
                }
            },
            "version": 2
        }"#;

        let decoded = decode(json, &legacy_id()).unwrap();
        let lp = &decoded.state.programs_progress[&ProgramId::new("demo")].loops["loop-1"];
        assert_eq!(lp.loop_id, "loop-1");
        assert_eq!(lp.completed_exercises.len(), 1);
    }

    #[test]
    fn test_empty_current_program_cleared() {
        let json = br#"{ "state": { "currentProgramId": "", "programsProgress": {} }, "version": 2 }"#;
        let decoded = decode(json, &legacy_id()).unwrap();
        assert!(decoded.state.current_program_id.is_none());
    }
}
