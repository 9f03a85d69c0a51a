/// Golden scenario test: replays the frozen fixtures and asserts
/// every verdict, witness and invariant still holds.
///
/// Fixture expectations are hand-checked against classroom calculation.
/// If one fails, the engine's behaviour has changed.

use std::path::PathBuf;

use deadlock_kernel::engine::DeadlockEngine;
use deadlock_kernel::fixtures::{load_fixtures, run_fixture, Fixture};
use deadlock_kernel::hashing::canonical_hash;
use deadlock_kernel::ENGINE_VERSION;

fn golden() -> Vec<Fixture> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("golden")
        .join("scenarios.json");
    load_fixtures(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

#[test]
fn golden_scenarios_match() {
    let engine = DeadlockEngine::default();
    let fixtures = golden();
    assert!(!fixtures.is_empty());
    for fixture in &fixtures {
        let report = run_fixture(&engine, fixture).expect("fixture run");
        assert!(
            report.passed(),
            "GOLDEN SCENARIO FAILED: {}\n{}",
            report.name,
            report.mismatches.join("\n")
        );
    }
}

#[test]
fn golden_results_are_deterministic_across_engines() {
    for fixture in &golden() {
        let h1 = canonical_hash(&DeadlockEngine::default().detect(&fixture.snapshot)).unwrap();
        let h2 = canonical_hash(&DeadlockEngine::default().detect(&fixture.snapshot)).unwrap();
        assert_eq!(
            h1, h2,
            "DETERMINISM FAILURE in {}:\n Run 1: {}\n Run 2: {}",
            fixture.name, h1, h2
        );
    }
}

#[test]
fn golden_names_are_unique() {
    let fixtures = golden();
    let mut names: Vec<&str> = fixtures.iter().map(|f| f.name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), fixtures.len());
}

#[test]
fn engine_version_is_one() {
    assert_eq!(ENGINE_VERSION, 1, "ENGINE_VERSION is part of every hash");
}
