//! Deadlock Kernel v1: Result Invariants
//!
//! Independent re-checks of a `DetectionResult` against the state it was
//! computed from. Nothing here trusts the engine's own bookkeeping: every
//! check replays the matrices from scratch.

use std::collections::BTreeSet;

use crate::analysis::{hold_and_wait_processes, wait_adjacency};
use crate::domain::{DetectionResult, StepAction};
use crate::error::KernelError;
use crate::state::SystemState;
use crate::vector::{add_into, fits};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. Returns the first failure as `InvariantViolation`.
pub fn try_validate_result(state: &SystemState, result: &DetectionResult) -> Result<(), KernelError> {
    check_step_indices(result)
        .and_then(|_| check_partition(state, result))
        .and_then(|_| check_conservation(state, result))
        .and_then(|_| check_lowest_index(state, result))
        .and_then(|_| check_enumeration(state, result))
        .and_then(|_| check_coffman(state, result))
        .map_err(KernelError::InvariantViolation)
}

/// Panicking variant of `try_validate_result`.
pub fn validate_result(state: &SystemState, result: &DetectionResult) {
    if let Err(err) = try_validate_result(state, result) {
        panic!("{}", err);
    }
}

/// Replay `sequence` from `available`. True iff every process in it can
/// run in turn, each appears once, and all are in range.
pub fn is_valid_completion_order(state: &SystemState, sequence: &[usize]) -> bool {
    let mut work = state.available().to_vec();
    let mut seen = BTreeSet::new();
    for &p in sequence {
        if p >= state.process_count() || !seen.insert(p) || !fits(&state.need()[p], &work) {
            return false;
        }
        add_into(&mut work, &state.allocation()[p]);
    }
    true
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// Step indices are 0, 1, 2, ... with no gaps.
fn check_step_indices(result: &DetectionResult) -> Result<(), String> {
    for (i, step) in result.steps.iter().enumerate() {
        if step.index != i {
            return Err(format!(
                "[INVARIANT:step_indices] Step at position {} carries index {}",
                i, step.index
            ));
        }
    }
    Ok(())
}

/// Safe sequence and deadlocked set partition the processes.
fn check_partition(state: &SystemState, result: &DetectionResult) -> Result<(), String> {
    let finished: BTreeSet<usize> = result.safe_sequence.iter().copied().collect();
    let stuck: BTreeSet<usize> = result.deadlocked_processes.iter().copied().collect();

    if finished.len() != result.safe_sequence.len() {
        return Err("[INVARIANT:partition] Safe sequence repeats a process".to_string());
    }
    if finished.len() + stuck.len() != state.process_count()
        || finished.intersection(&stuck).next().is_some()
        || finished.iter().chain(&stuck).any(|p| *p >= state.process_count())
    {
        return Err(format!(
            "[INVARIANT:partition] Finished {:?} and deadlocked {:?} do not partition {} processes",
            finished, stuck, state.process_count()
        ));
    }
    if result.is_deadlocked == stuck.is_empty() {
        return Err(format!(
            "[INVARIANT:partition] is_deadlocked={} but {} processes are stuck",
            result.is_deadlocked,
            stuck.len()
        ));
    }
    Ok(())
}

/// Available after each release equals initial available plus everything
/// released so far. Nothing is created or destroyed.
fn check_conservation(state: &SystemState, result: &DetectionResult) -> Result<(), String> {
    let mut work = state.available().to_vec();
    let releases = result
        .steps
        .iter()
        .filter(|s| s.action == StepAction::Release);

    for (step, &p) in releases.zip(&result.safe_sequence) {
        add_into(&mut work, &state.allocation()[p]);
        if step.process_index != Some(p) || step.available_snapshot != work {
            return Err(format!(
                "[INVARIANT:conservation] Step {} shows {:?} for P{}, expected {:?}",
                step.index, step.available_snapshot, p, work
            ));
        }
    }
    if result.final_available != work {
        return Err(format!(
            "[INVARIANT:conservation] Final available {:?} differs from replayed {:?}",
            result.final_available, work
        ));
    }
    Ok(())
}

/// Each chosen process is the smallest eligible index at its round, and
/// no unfinished process was eligible when the pass stopped.
fn check_lowest_index(state: &SystemState, result: &DetectionResult) -> Result<(), String> {
    let mut work = state.available().to_vec();
    let mut finished = vec![false; state.process_count()];
    let eligible = |finished: &[bool], work: &[u32]| {
        (0..state.process_count()).find(|&q| !finished[q] && fits(&state.need()[q], work))
    };

    for (round, &p) in result.safe_sequence.iter().enumerate() {
        let expected = eligible(finished.as_slice(), work.as_slice());
        if expected != Some(p) {
            return Err(format!(
                "[INVARIANT:lowest_index] Round {} chose P{} but lowest eligible is {:?}",
                round + 1,
                p,
                expected
            ));
        }
        finished[p] = true;
        add_into(&mut work, &state.allocation()[p]);
    }
    if let Some(q) = eligible(finished.as_slice(), work.as_slice()) {
        return Err(format!(
            "[INVARIANT:lowest_index] Pass stopped while P{} was still eligible",
            q
        ));
    }
    Ok(())
}

/// Every enumerated sequence is a complete, valid, distinct order, and the
/// first one is the lowest-index sequence.
fn check_enumeration(state: &SystemState, result: &DetectionResult) -> Result<(), String> {
    if result.is_deadlocked && !result.all_safe_sequences.is_empty() {
        return Err("[INVARIANT:enumeration] Deadlocked state lists safe sequences".to_string());
    }
    let mut seen = BTreeSet::new();
    for seq in &result.all_safe_sequences {
        if seq.len() != state.process_count() || !is_valid_completion_order(state, seq) {
            return Err(format!(
                "[INVARIANT:enumeration] {:?} is not a valid completion order",
                seq
            ));
        }
        if !seen.insert(seq) {
            return Err(format!("[INVARIANT:enumeration] {:?} listed twice", seq));
        }
    }
    if let Some(first) = result.all_safe_sequences.first() {
        if *first != result.safe_sequence {
            return Err(format!(
                "[INVARIANT:enumeration] First sequence {:?} differs from primary {:?}",
                first, result.safe_sequence
            ));
        }
    }
    Ok(())
}

/// Coffman flags agree with the witnesses they are derived from.
fn check_coffman(state: &SystemState, result: &DetectionResult) -> Result<(), String> {
    let report = &result.analysis;
    let status = &report.coffman_status;

    if !status.mutual_exclusion || !status.no_preemption {
        return Err("[INVARIANT:coffman] Structural conditions must always hold".to_string());
    }

    let expected_hw = hold_and_wait_processes(state, &result.deadlocked_processes);
    if report.hold_and_wait_processes != expected_hw || status.hold_and_wait == expected_hw.is_empty() {
        return Err(format!(
            "[INVARIANT:coffman] Hold-and-wait witnesses {:?}, expected {:?}",
            report.hold_and_wait_processes, expected_hw
        ));
    }

    if status.circular_wait == report.cycle.is_empty() {
        return Err("[INVARIANT:coffman] circular_wait disagrees with cycle witness".to_string());
    }
    if !report.cycle.is_empty() {
        let adjacency = wait_adjacency(state, &result.final_available, &result.deadlocked_processes);
        for (i, from) in report.cycle.iter().enumerate() {
            let to = report.cycle[(i + 1) % report.cycle.len()];
            if !adjacency.get(*from).is_some_and(|succ| succ.contains(&to)) {
                return Err(format!(
                    "[INVARIANT:coffman] Cycle edge P{} -> P{} is not a wait edge",
                    from, to
                ));
            }
        }
    }
    Ok(())
}
