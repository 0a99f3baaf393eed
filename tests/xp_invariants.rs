//! Property tests for XP bookkeeping.
//!
//! Random operation sequences are applied to a store; after every step the
//! stored XP must equal what the curriculum derives, and only the active
//! program's progress may change.

use proptest::prelude::*;

use skillloop::registry::JsonStrLoader;
use skillloop::xp::{calculate_loop_xp, loop_xp_remaining};
use skillloop::{Config, Debrief, ProgramMetadata, ProgramRegistry, ProgressStore};

const PROGRAMS: [&str; 2] = ["skillloop-ai-foundations", "rust-basics"];

/// (loop, exercise, reward) across both fixtures, plus ids no program has.
const EXERCISES: [(&str, &str, u32); 7] = [
    ("loop-1", "ex-1", 10),
    ("loop-1", "ex-2", 15),
    ("loop-2", "ex-3", 10),
    ("loop-3", "ex-4", 20),
    ("loop-3", "ex-5", 20),
    ("loop-1", "ex-404", 1),
    ("loop-404", "ex-1", 1),
];

const LOOPS: [&str; 4] = ["loop-1", "loop-2", "loop-3", "loop-404"];

#[derive(Clone, Debug)]
enum Op {
    Complete(usize),
    Uncomplete(usize),
    CompleteLoop(usize),
    UncompleteLoop(usize),
    Debrief(usize, bool),
    Switch(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..EXERCISES.len()).prop_map(Op::Complete),
        2 => (0..EXERCISES.len()).prop_map(Op::Uncomplete),
        2 => (0..LOOPS.len()).prop_map(Op::CompleteLoop),
        1 => (0..LOOPS.len()).prop_map(Op::UncompleteLoop),
        1 => (0..LOOPS.len(), any::<bool>()).prop_map(|(l, filled)| Op::Debrief(l, filled)),
        1 => (0..PROGRAMS.len()).prop_map(Op::Switch),
    ]
}

fn new_store() -> ProgressStore {
    let registry = ProgramRegistry::new()
        .with_program(
            ProgramMetadata::new(PROGRAMS[0], "AI Foundations"),
            JsonStrLoader::new(include_str!("fixtures/ai-foundations.json")),
        )
        .unwrap()
        .with_program(
            ProgramMetadata::new(PROGRAMS[1], "Rust Basics"),
            JsonStrLoader::new(include_str!("fixtures/rust-basics.json")),
        )
        .unwrap();

    let mut store = ProgressStore::in_memory(registry, Config::default()).unwrap();
    store.load_program(PROGRAMS[0]).unwrap();
    store
}

fn apply(store: &mut ProgressStore, op: &Op) {
    match *op {
        Op::Complete(i) => {
            let (loop_id, exercise_id, xp) = EXERCISES[i];
            store.complete_exercise(loop_id, exercise_id, xp);
        }
        Op::Uncomplete(i) => {
            let (loop_id, exercise_id, _) = EXERCISES[i];
            store.uncomplete_exercise(loop_id, exercise_id);
        }
        Op::CompleteLoop(i) => {
            store.complete_loop(LOOPS[i], None);
        }
        Op::UncompleteLoop(i) => {
            store.mark_loop_uncompleted(LOOPS[i]);
        }
        Op::Debrief(i, filled) => {
            let debrief = if filled {
                Debrief::new("notes", "", "")
            } else {
                Debrief::default()
            };
            store.update_debrief(LOOPS[i], debrief);
        }
        Op::Switch(i) => {
            store.load_program(PROGRAMS[i]).unwrap();
        }
    }
}

fn assert_consistent(store: &ProgressStore) {
    for (program_id, progress) in store.programs_progress() {
        let program = store.registry().load_program(program_id.as_str()).unwrap();

        let sum: u32 = progress.loops.values().map(|lp| lp.xp_earned).sum();
        assert_eq!(progress.total_xp, sum, "total of {}", program_id);

        for (loop_id, entry) in &progress.loops {
            let lp = program.find_loop(loop_id.as_str()).unwrap();
            assert_eq!(entry.xp_earned, calculate_loop_xp(lp, entry), "loop {}", loop_id);
            assert!(loop_xp_remaining(lp, Some(entry)) >= 0, "loop {}", loop_id);
            assert!(
                entry.completed_exercises.iter().all(|e| lp.contains_exercise(e.as_str())),
                "only curriculum exercises are checked"
            );
        }
    }
}

proptest! {
    #[test]
    fn xp_matches_curriculum_after_any_sequence(ops in prop::collection::vec(op(), 1..60)) {
        let mut store = new_store();
        for op in &ops {
            apply(&mut store, op);
            assert_consistent(&store);
        }
    }

    #[test]
    fn other_programs_are_untouched(ops in prop::collection::vec(op(), 1..60)) {
        let mut store = new_store();
        for op in &ops {
            let current = store.current_program_id().cloned().unwrap();
            let before: Vec<_> = store
                .programs_progress()
                .iter()
                .filter(|(id, _)| **id != current)
                .map(|(id, p)| (id.clone(), p.clone()))
                .collect();

            apply(&mut store, op);

            for (id, progress) in before {
                prop_assert_eq!(&store.programs_progress()[&id], &progress);
            }
        }
    }

    #[test]
    fn complete_is_idempotent(ops in prop::collection::vec(op(), 0..30), i in 0..5usize) {
        let mut store = new_store();
        for op in &ops {
            apply(&mut store, op);
        }
        store.load_program(PROGRAMS[0]).unwrap();

        let (loop_id, exercise_id, xp) = EXERCISES[i];
        store.complete_exercise(loop_id, exercise_id, xp);
        let once = store.current_progress().cloned();
        prop_assert!(!store.complete_exercise(loop_id, exercise_id, xp));
        prop_assert_eq!(store.current_progress().cloned(), once);
    }
}
