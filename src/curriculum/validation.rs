//! Structural validation for curriculum documents.
//!
//! Progress lookups assume every loop id and every exercise id names exactly
//! one entity in its program. A document that breaks this would let two
//! loops share one progress record, so it is rejected before the registry
//! hands it out.
//!
//! # Rules
//!
//! | Field | Constraint |
//! |-------|------------|
//! | `program.id` | Non-empty |
//! | `loop.id` | Non-empty, unique within the program |
//! | `exercise.id` | Non-empty, unique within the program |

use std::collections::HashSet;

use crate::curriculum::types::Program;
use crate::error::{SkillLoopError, ValidationError};

/// Validates a [`Program`] before it is registered or cached.
pub(crate) fn validate_program(program: &Program) -> Result<(), SkillLoopError> {
    if program.id.as_str().trim().is_empty() {
        return Err(ValidationError::required_field("program.id").into());
    }

    let mut loop_ids = HashSet::new();
    let mut exercise_ids = HashSet::new();

    for lp in program.loops() {
        if lp.id.is_empty() {
            return Err(ValidationError::required_field("loop.id").into());
        }
        if !loop_ids.insert(lp.id.as_str()) {
            return Err(ValidationError::duplicate_id("loop", lp.id.as_str()).into());
        }

        for exercise in &lp.exercises {
            if exercise.id.is_empty() {
                return Err(ValidationError::invalid_field(
                    "exercise.id",
                    format!("empty exercise id in loop '{}'", lp.id),
                )
                .into());
            }
            if !exercise_ids.insert(exercise.id.as_str()) {
                return Err(
                    ValidationError::duplicate_id("exercise", exercise.id.as_str()).into(),
                );
            }
        }
    }

    Ok(())
}
