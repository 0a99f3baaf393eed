//! Core type definitions for SkillLoop identifiers and timestamps.
//!
//! Curriculum identifiers are opaque strings chosen by curriculum authors
//! (e.g. `"skillloop-ai-foundations"`, `"loop-1"`, `"ex-1-2"`). Each kind
//! gets its own newtype so a loop id cannot be passed where an exercise id
//! is expected.
//!
//! All id types implement `Borrow<str>`, so maps keyed by an id can be
//! queried with a plain `&str`.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[doc = concat!("Creates a new ", stringify!($name), " from a string.")]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[doc = concat!("Returns the ", stringify!($name), " as a string slice.")]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id! {
    /// Program identifier.
    ///
    /// Names a complete curriculum in the [`ProgramRegistry`](crate::ProgramRegistry)
    /// and namespaces its progress record.
    ProgramId
}

string_id! {
    /// Loop identifier, unique within a program.
    LoopId
}

string_id! {
    /// Exercise identifier, unique within a program.
    ExerciseId
}

/// Unix timestamp in milliseconds.
///
/// Using i64 allows representing dates far into the future and past.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    ///
    /// If the system clock is before the Unix epoch (should never happen
    /// in practice), returns a timestamp of 0 (epoch) rather than panicking.
    #[inline]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as i64)
    }

    /// Returns the timestamp as Unix milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_program_id() {
        let id = ProgramId::new("skillloop-ai-foundations");
        assert_eq!(id.as_str(), "skillloop-ai-foundations");
        assert_eq!(format!("{}", id), "skillloop-ai-foundations");
        assert!(!id.is_empty());
    }

    #[test]
    fn test_loop_id_from_str() {
        let id: LoopId = "loop-1".into();
        assert_eq!(id, "loop-1");
    }

    #[test]
    fn test_exercise_id_default_is_empty() {
        assert!(ExerciseId::default().is_empty());
    }

    #[test]
    fn test_map_lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(LoopId::new("loop-1"), 10u32);
        assert_eq!(map.get("loop-1"), Some(&10));
        assert!(map.get("loop-2").is_none());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ExerciseId::new("ex-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ex-1\"");
        let restored: ExerciseId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);
    }

    #[test]
    fn test_timestamp_now() {
        let t1 = Timestamp::now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let t2 = Timestamp::now();
        assert!(t1 < t2, "Timestamps should be ordered");
    }

    #[test]
    fn test_timestamp_ordering() {
        let t1 = Timestamp(1000);
        let t2 = Timestamp(2000);
        assert!(t1 < t2);
        assert_eq!(t2.as_millis(), 2000);
    }
}
