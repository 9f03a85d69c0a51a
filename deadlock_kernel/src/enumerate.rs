//! Deadlock Kernel v1: Safe-Sequence Enumerator
//!
//! Depth-first backtracking over every eligible process at each level.
//! Candidates are tried in index order, so the first complete sequence
//! equals the lowest-index sequence of the safety pass.
//!
//! Each recursive call receives its own prefix and work vector; nothing
//! is shared between calls or between top-level invocations.

use std::collections::BTreeSet;

use tracing::debug;

use crate::state::SystemState;
use crate::vector::{add_into, fits};

/// All distinct complete safe sequences, in discovery order, at most `limit`.
pub fn enumerate_safe_sequences(state: &SystemState, limit: usize) -> Vec<Vec<usize>> {
    let mut found = Collector {
        limit,
        seen: BTreeSet::new(),
        sequences: Vec::new(),
    };
    if limit > 0 {
        backtrack(state, &[], state.available(), &mut found);
    }
    found.sequences
}

struct Collector {
    limit: usize,
    seen: BTreeSet<Vec<usize>>,
    sequences: Vec<Vec<usize>>,
}

impl Collector {
    fn full(&self) -> bool {
        self.sequences.len() >= self.limit
    }

    fn record(&mut self, sequence: &[usize]) {
        if self.seen.insert(sequence.to_vec()) {
            debug!(sequence = ?sequence, "safe sequence found");
            self.sequences.push(sequence.to_vec());
        }
    }
}

fn backtrack(state: &SystemState, prefix: &[usize], work: &[u32], found: &mut Collector) {
    if found.full() {
        return;
    }
    if prefix.len() == state.process_count() {
        found.record(prefix);
        return;
    }

    for p in 0..state.process_count() {
        if found.full() {
            return;
        }
        if prefix.contains(&p) || !fits(&state.need()[p], work) {
            continue;
        }
        let mut next_work = work.to_vec();
        add_into(&mut next_work, &state.allocation()[p]);
        let mut next_prefix = prefix.to_vec();
        next_prefix.push(p);
        backtrack(state, &next_prefix, &next_work, found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic() -> SystemState {
        SystemState::from_max(
            5,
            3,
            &[3, 3, 2],
            &[vec![0, 1, 0], vec![2, 0, 0], vec![3, 0, 2], vec![2, 1, 1], vec![0, 0, 2]],
            &[vec![7, 5, 3], vec![3, 2, 2], vec![9, 0, 2], vec![2, 2, 2], vec![4, 3, 3]],
        )
    }

    #[test]
    fn test_classic_first_ten() {
        let seqs = enumerate_safe_sequences(&classic(), 10);
        assert_eq!(seqs.len(), 10);
        assert_eq!(seqs[0], vec![1, 3, 0, 2, 4]);
        assert_eq!(seqs[9], vec![3, 1, 0, 4, 2]);
    }

    #[test]
    fn test_classic_uncapped_count() {
        // 16 valid orders exist for this state.
        let seqs = enumerate_safe_sequences(&classic(), 100);
        assert_eq!(seqs.len(), 16);
        let unique: BTreeSet<_> = seqs.iter().cloned().collect();
        assert_eq!(unique.len(), 16);
    }

    #[test]
    fn test_limit_respected() {
        assert_eq!(enumerate_safe_sequences(&classic(), 3).len(), 3);
        assert!(enumerate_safe_sequences(&classic(), 0).is_empty());
    }

    #[test]
    fn test_single_process() {
        let state = SystemState::from_need(1, 1, &[0], &[vec![0]], &[vec![0]]);
        assert_eq!(enumerate_safe_sequences(&state, 10), vec![vec![0]]);
    }

    #[test]
    fn test_deadlocked_state_yields_nothing() {
        let state = SystemState::from_max(
            3,
            3,
            &[0, 0, 0],
            &[vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]],
            &[vec![1, 1, 0], vec![0, 1, 1], vec![1, 0, 1]],
        );
        assert!(enumerate_safe_sequences(&state, 10).is_empty());
    }

    #[test]
    fn test_all_permutations_when_unconstrained() {
        let state = SystemState::from_need(3, 1, &[1], &[vec![1], vec![1], vec![1]], &[vec![1], vec![1], vec![1]]);
        let seqs = enumerate_safe_sequences(&state, 10);
        assert_eq!(
            seqs,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0],
            ]
        );
    }
}
