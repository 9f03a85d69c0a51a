//! Deadlock Kernel v1: Scenario Fixtures
//!
//! Named snapshots with expected verdicts. Shared by the `check` command
//! and the golden tests.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::SystemSnapshot;
use crate::engine::DeadlockEngine;
use crate::error::KernelError;
use crate::hashing::canonical_hash;
use crate::invariants::try_validate_result;
use crate::state::SystemState;

/// Expected outcome. Absent fields are not checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Expectation {
    pub is_deadlocked: bool,
    #[serde(default)]
    pub safe_sequence: Option<Vec<usize>>,
    #[serde(default)]
    pub deadlocked_processes: Option<Vec<usize>>,
    #[serde(default)]
    pub sequence_count: Option<usize>,
    #[serde(default)]
    pub circular_wait: Option<bool>,
    #[serde(default)]
    pub hold_and_wait: Option<bool>,
    #[serde(default)]
    pub cycle: Option<Vec<usize>>,
    #[serde(default)]
    pub final_available: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    pub name: String,
    pub snapshot: SystemSnapshot,
    pub expected: Expectation,
}

/// Outcome of running one fixture.
#[derive(Debug, Clone)]
pub struct FixtureReport {
    pub name: String,
    pub hash: String,
    pub mismatches: Vec<String>,
}

impl FixtureReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

pub fn load_fixtures(path: &Path) -> Result<Vec<Fixture>, KernelError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn compare<T: PartialEq + std::fmt::Debug>(
    mismatches: &mut Vec<String>,
    field: &str,
    expected: Option<&T>,
    actual: &T,
) {
    if let Some(expected) = expected {
        if expected != actual {
            mismatches.push(format!("{}: expected {:?}, got {:?}", field, expected, actual));
        }
    }
}

/// Analyze the fixture twice, compare both hashes, check the expectation
/// and the result invariants.
pub fn run_fixture(engine: &DeadlockEngine, fixture: &Fixture) -> Result<FixtureReport, KernelError> {
    let state = SystemState::from_snapshot(&fixture.snapshot);
    let first = engine.detect_state(&state);
    let second = engine.detect_state(&state);
    let hash = canonical_hash(&first)?;
    let rerun_hash = canonical_hash(&second)?;

    let mut mismatches = Vec::new();
    if hash != rerun_hash {
        mismatches.push(format!("determinism: run1={} run2={}", hash, rerun_hash));
    }
    if let Err(err) = try_validate_result(&state, &first) {
        mismatches.push(err.to_string());
    }

    let exp = &fixture.expected;
    compare(&mut mismatches, "isDeadlocked", Some(&exp.is_deadlocked), &first.is_deadlocked);
    compare(&mut mismatches, "safeSequence", exp.safe_sequence.as_ref(), &first.safe_sequence);
    compare(
        &mut mismatches,
        "deadlockedProcesses",
        exp.deadlocked_processes.as_ref(),
        &first.deadlocked_processes,
    );
    compare(
        &mut mismatches,
        "sequenceCount",
        exp.sequence_count.as_ref(),
        &first.all_safe_sequences.len(),
    );
    compare(
        &mut mismatches,
        "circularWait",
        exp.circular_wait.as_ref(),
        &first.analysis.coffman_status.circular_wait,
    );
    compare(
        &mut mismatches,
        "holdAndWait",
        exp.hold_and_wait.as_ref(),
        &first.analysis.coffman_status.hold_and_wait,
    );
    compare(&mut mismatches, "cycle", exp.cycle.as_ref(), &first.analysis.cycle);
    compare(
        &mut mismatches,
        "finalAvailable",
        exp.final_available.as_ref(),
        &first.final_available,
    );

    Ok(FixtureReport {
        name: fixture.name.clone(),
        hash,
        mismatches,
    })
}
