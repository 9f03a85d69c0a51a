//! Deadlock Kernel v1: Banker's Safety Algorithm
//!
//! Lowest-index rule: every round rescans from P0 and runs the first
//! unfinished process whose Need fits in Work. Results therefore match a
//! hand calculation done the same way.

use tracing::debug;

use crate::domain::{SimulationStep, StepAction, StepStatus};
use crate::state::SystemState;
use crate::vector::{
    add_into, first_shortfall, fits, format_vector, join_processes, process_label, ResourceVector,
};

/// Raw output of the safety pass, consumed by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyOutcome {
    pub safe_sequence: Vec<usize>,
    pub deadlocked: Vec<usize>,
    /// Work vector when the pass stopped.
    pub work: ResourceVector,
    pub steps: Vec<SimulationStep>,
}

impl SafetyOutcome {
    pub fn is_deadlocked(&self) -> bool {
        !self.deadlocked.is_empty()
    }
}

/// Append-only step log with contiguous indices.
struct StepLog {
    steps: Vec<SimulationStep>,
}

impl StepLog {
    fn push(
        &mut self,
        description: String,
        process_index: Option<usize>,
        action: StepAction,
        work: &[u32],
        status: StepStatus,
    ) {
        self.steps.push(SimulationStep {
            index: self.steps.len(),
            description,
            process_index,
            action,
            available_snapshot: work.to_vec(),
            status,
        });
    }
}

/// Run the safety check over a normalized state.
pub fn run_safety(state: &SystemState) -> SafetyOutcome {
    let n = state.process_count();
    let mut work = state.available().to_vec();
    let mut finish = vec![false; n];
    let mut safe_sequence = Vec::with_capacity(n);
    let mut log = StepLog { steps: Vec::new() };

    log.push(
        format!(
            "INITIALIZATION: Simulation starts with Initial Available Vector {}.",
            format_vector(&work)
        ),
        None,
        StepAction::Check,
        &work,
        StepStatus::Neutral,
    );

    while safe_sequence.len() < n {
        let Some(p) = (0..n).find(|&p| !finish[p] && fits(&state.need()[p], &work)) else {
            break;
        };

        let before = work.clone();
        add_into(&mut work, &state.allocation()[p]);
        finish[p] = true;
        safe_sequence.push(p);
        debug!(process = p, work = ?work, "process runs to completion");

        log.push(
            format!(
                "STEP {}: {} Need {} ≤ Available {}. {} runs and releases {}. New Available: {}.",
                safe_sequence.len(),
                process_label(p),
                format_vector(&state.need()[p]),
                format_vector(&before),
                process_label(p),
                format_vector(&state.allocation()[p]),
                format_vector(&work),
            ),
            Some(p),
            StepAction::Release,
            &work,
            StepStatus::Safe,
        );
    }

    let deadlocked: Vec<usize> = (0..n).filter(|&p| !finish[p]).collect();

    if deadlocked.is_empty() {
        log.push(
            format!(
                "SUCCESS: System is SAFE. Safe Sequence: < {} >.",
                join_processes(&safe_sequence, ", ")
            ),
            None,
            StepAction::Check,
            &work,
            StepStatus::Safe,
        );
    } else {
        for &p in &deadlocked {
            let description = match first_shortfall(&state.need()[p], &work) {
                Some(r) => format!(
                    "FAILURE: {} cannot proceed. Need for R{} ({}) > Available ({}).",
                    process_label(p),
                    r,
                    state.need()[p][r],
                    work[r]
                ),
                None => format!("FAILURE: {} cannot proceed.", process_label(p)),
            };
            log.push(description, Some(p), StepAction::Wait, &work, StepStatus::Unsafe);
        }
        log.push(
            format!(
                "DEADLOCK CONFIRMED: Processes {{ {} }} are stuck.",
                join_processes(&deadlocked, ", ")
            ),
            None,
            StepAction::Check,
            &work,
            StepStatus::Unsafe,
        );
    }

    SafetyOutcome {
        safe_sequence,
        deadlocked,
        work,
        steps: log.steps,
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
    fn test_classic_sequence() {
        let out = run_safety(&classic());
        assert!(!out.is_deadlocked());
        assert_eq!(out.safe_sequence, vec![1, 3, 0, 2, 4]);
        assert_eq!(out.work, vec![10, 5, 7]);
    }

    #[test]
    fn test_classic_step_log() {
        let out = run_safety(&classic());
        // init + 5 runs + summary
        assert_eq!(out.steps.len(), 7);
        assert_eq!(out.steps[0].status, StepStatus::Neutral);
        assert_eq!(
            out.steps[1].description,
            "STEP 1: P1 Need [1, 2, 2] ≤ Available [3, 3, 2]. P1 runs and releases [2, 0, 0]. New Available: [5, 3, 2]."
        );
        assert_eq!(out.steps[1].available_snapshot, vec![5, 3, 2]);
        assert_eq!(out.steps[1].action, StepAction::Release);
        assert_eq!(
            out.steps[6].description,
            "SUCCESS: System is SAFE. Safe Sequence: < P1, P3, P0, P2, P4 >."
        );
        for (i, step) in out.steps.iter().enumerate() {
            assert_eq!(step.index, i);
        }
    }

    #[test]
    fn test_empty_system_is_safe() {
        let state = SystemState::from_need(0, 2, &[1, 1], &[], &[]);
        let out = run_safety(&state);
        assert!(!out.is_deadlocked());
        assert!(out.safe_sequence.is_empty());
        assert_eq!(out.steps.len(), 2);
    }

    #[test]
    fn test_zero_need_always_eligible() {
        let state = SystemState::from_need(2, 1, &[0], &[vec![0], vec![4]], &[vec![3], vec![0]]);
        let out = run_safety(&state);
        assert_eq!(out.safe_sequence, vec![1, 0]);
    }

    #[test]
    fn test_deadlock_steps() {
        let state = SystemState::from_max(
            3,
            3,
            &[0, 0, 0],
            &[vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]],
            &[vec![1, 1, 0], vec![0, 1, 1], vec![1, 0, 1]],
        );
        let out = run_safety(&state);
        assert_eq!(out.deadlocked, vec![0, 1, 2]);
        // init + 3 failures + summary
        assert_eq!(out.steps.len(), 5);
        assert_eq!(
            out.steps[1].description,
            "FAILURE: P0 cannot proceed. Need for R1 (1) > Available (0)."
        );
        assert_eq!(out.steps[1].action, StepAction::Wait);
        assert_eq!(
            out.steps[4].description,
            "DEADLOCK CONFIRMED: Processes { P0, P1, P2 } are stuck."
        );
        assert!(out.steps[1..].iter().all(|s| s.status == StepStatus::Unsafe));
    }
}
