//! Benchmarks for SkillLoop store operations.
//!
//! Run with: `cargo bench`
//!
//! Every mutation writes a full snapshot through the backend, so the
//! durable numbers are dominated by the redb commit.

use criterion::{criterion_group, criterion_main, Criterion};
use skillloop::registry::JsonStrLoader;
use skillloop::storage::snapshot;
use skillloop::{Config, ProgramId, ProgramMetadata, ProgramRegistry, ProgressStore, SyncMode};
use tempfile::tempdir;

const AI: &str = "skillloop-ai-foundations";

fn registry() -> ProgramRegistry {
    ProgramRegistry::new()
        .with_program(
            ProgramMetadata::new(AI, "AI Foundations"),
            JsonStrLoader::new(include_str!("../tests/fixtures/ai-foundations.json")),
        )
        .unwrap()
}

/// Benchmark opening an existing store with progress in it.
fn bench_open_existing(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.db");

    let mut store = ProgressStore::open(&path, registry(), Config::default()).unwrap();
    store.load_program(AI).unwrap();
    store.complete_exercise("loop-1", "ex-1", 10);
    store.close().unwrap();

    c.bench_function("open_existing_store", |b| {
        b.iter(|| {
            let store = ProgressStore::open(&path, registry(), Config::default()).unwrap();
            store.close().unwrap();
        });
    });
}

/// Benchmark a check/uncheck pair against each backend.
fn bench_toggle_exercise(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_exercise");

    let mut store = ProgressStore::in_memory(registry(), Config::default()).unwrap();
    store.load_program(AI).unwrap();
    group.bench_function("memory", |b| {
        b.iter(|| {
            store.complete_exercise("loop-1", "ex-1", 10);
            store.uncomplete_exercise("loop-1", "ex-1");
        });
    });

    for mode in [SyncMode::Normal, SyncMode::Fast] {
        let dir = tempdir().unwrap();
        let config = Config {
            sync_mode: mode,
            ..Default::default()
        };
        let mut store = ProgressStore::open(dir.path().join("progress.db"), registry(), config)
            .unwrap();
        store.load_program(AI).unwrap();

        group.bench_function(format!("redb_{:?}", mode).to_lowercase(), |b| {
            b.iter(|| {
                store.complete_exercise("loop-1", "ex-1", 10);
                store.uncomplete_exercise("loop-1", "ex-1");
            });
        });
        store.close().unwrap();
    }

    group.finish();
}

/// Benchmark decoding a version 1 snapshot, migration included.
fn bench_decode_legacy(c: &mut Criterion) {
    let legacy = br#"{ "state": { "totalXp": 40, "loops": { "loop-1": {
        "loopId": "loop-1", "completedExercises": ["ex-1", "ex-2"], "xpEarned": 40, "completed": false
    } } }, "version": 1 }"#;
    let program_id = ProgramId::new(AI);

    c.bench_function("decode_legacy_snapshot", |b| {
        b.iter(|| snapshot::decode(legacy, &program_id).unwrap());
    });
}

criterion_group!(
    benches,
    bench_open_existing,
    bench_toggle_exercise,
    bench_decode_legacy
);
criterion_main!(benches);
