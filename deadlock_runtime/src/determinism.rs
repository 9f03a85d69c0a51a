//! Determinism verification and result comparison.

use std::collections::BTreeSet;

use thiserror::Error;

use deadlock_kernel::domain::{DetectionResult, SystemSnapshot};
use deadlock_kernel::engine::DeadlockEngine;
use deadlock_kernel::error::KernelError;
use deadlock_kernel::hashing::canonical_hash;

#[derive(Error, Debug)]
pub enum DeterminismError {
    #[error("DETERMINISM FAILURE: two runs produced different hashes.\n Run 1: {first}\n Run 2: {second}")]
    HashMismatch { first: String, second: String },

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Analyze `snapshot` twice and return the shared canonical hash.
pub fn verify_determinism(engine: &DeadlockEngine, snapshot: &SystemSnapshot) -> Result<String, DeterminismError> {
    let first = canonical_hash(&engine.detect(snapshot))?;
    let second = canonical_hash(&engine.detect(snapshot))?;
    if first != second {
        return Err(DeterminismError::HashMismatch { first, second });
    }
    Ok(first)
}

/// What changed between two analyses, usually of an edited form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultDrift {
    pub verdict_changed: bool,
    pub primary_sequence_changed: bool,
    /// Stuck in `b` but not in `a`.
    pub newly_deadlocked: Vec<usize>,
    /// Stuck in `a` but not in `b`.
    pub released: Vec<usize>,
    pub sequence_count_delta: i64,
}

impl ResultDrift {
    pub fn is_empty(&self) -> bool {
        !self.verdict_changed
            && !self.primary_sequence_changed
            && self.newly_deadlocked.is_empty()
            && self.released.is_empty()
            && self.sequence_count_delta == 0
    }
}

pub fn compare_results(a: &DetectionResult, b: &DetectionResult) -> ResultDrift {
    let stuck_a: BTreeSet<usize> = a.deadlocked_processes.iter().copied().collect();
    let stuck_b: BTreeSet<usize> = b.deadlocked_processes.iter().copied().collect();

    ResultDrift {
        verdict_changed: a.is_deadlocked != b.is_deadlocked,
        primary_sequence_changed: a.safe_sequence != b.safe_sequence,
        newly_deadlocked: stuck_b.difference(&stuck_a).copied().collect(),
        released: stuck_a.difference(&stuck_b).copied().collect(),
        sequence_count_delta: b.all_safe_sequences.len() as i64 - a.all_safe_sequences.len() as i64,
    }
}
