//! Deadlock Kernel v1: Deadlock Analyzer
//!
//! Coffman-condition evaluation over the final state of the safety pass.
//! Mutual exclusion and no preemption are properties of the resource
//! model and always hold; hold-and-wait and circular wait are computed.
//!
//! Narrative order is part of the interface: verdict, hold-and-wait,
//! then cycle or scarcity note.

use crate::domain::{AnalysisReport, CoffmanStatus};
use crate::graph::find_cycles;
use crate::safety::SafetyOutcome;
use crate::state::SystemState;
use crate::vector::{any_positive, join_processes, process_label};

/// Deadlocked processes that hold some instance and still need some.
pub fn hold_and_wait_processes(state: &SystemState, deadlocked: &[usize]) -> Vec<usize> {
    deadlocked
        .iter()
        .copied()
        .filter(|&p| any_positive(&state.allocation()[p]) && any_positive(&state.need()[p]))
        .collect()
}

/// Wait adjacency among deadlocked processes, indexed by process.
///
/// `p -> q` when `need[p][r] > work[r]` and another process `q` holds some
/// of `r`. `q` ranges over all processes, so a target may be one that
/// already finished; such targets have no outgoing edges. Successors keep
/// first-insertion order (resource, then holder index).
pub fn wait_adjacency(state: &SystemState, work: &[u32], deadlocked: &[usize]) -> Vec<Vec<usize>> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); state.process_count()];
    for &p in deadlocked {
        for r in 0..state.resource_count() {
            if state.need()[p][r] <= work[r] {
                continue;
            }
            for q in 0..state.process_count() {
                if q != p && state.allocation()[q][r] > 0 && !adjacency[p].contains(&q) {
                    adjacency[p].push(q);
                }
            }
        }
    }
    adjacency
}

/// Build the analysis report for a finished safety pass.
pub fn analyze(
    state: &SystemState,
    outcome: &SafetyOutcome,
    all_safe_sequences: &[Vec<usize>],
) -> AnalysisReport {
    let mut narrative = Vec::new();
    let mut cycle_description = None;
    let mut cycle = Vec::new();
    let mut hold_and_wait = Vec::new();

    if !outcome.is_deadlocked() {
        narrative.push("State is SAFE. Need ≤ Available satisfied for all processes.".to_string());
        narrative.push(format!(
            "Primary Safe Sequence (Lowest Index Rule): {}.",
            join_processes(&outcome.safe_sequence, " → ")
        ));
        if all_safe_sequences.len() > 1 {
            narrative.push(format!(
                "Total valid sequences found: {}. (See list below)",
                all_safe_sequences.len()
            ));
        }
    } else {
        narrative.push("State is UNSAFE / DEADLOCKED.".to_string());

        hold_and_wait = hold_and_wait_processes(state, &outcome.deadlocked);
        if hold_and_wait.is_empty() {
            narrative.push(
                "\"Hold and Wait\" not explicitly violated (stuck processes might not hold anything, just waiting)."
                    .to_string(),
            );
        } else {
            narrative.push(format!(
                "\"Hold and Wait\" condition violated by: {}.",
                join_processes(&hold_and_wait, ", ")
            ));
        }

        let adjacency = wait_adjacency(state, &outcome.work, &outcome.deadlocked);
        if let Some(found) = find_cycles(&adjacency, &outcome.deadlocked, true).into_iter().next() {
            let chain = format!(
                "{} → {}",
                join_processes(&found, " → "),
                process_label(found[0])
            );
            narrative.push("\"Circular Wait\" detected.".to_string());
            narrative.push(format!("Cycle chain: {}", chain));
            cycle_description = Some(chain);
            cycle = found;
        } else {
            narrative.push(
                "Deadlock exists due to resource scarcity, but no simple single-resource P->Q cycle detected (possibly complex multi-instance dependency)."
                    .to_string(),
            );
        }
    }

    AnalysisReport {
        coffman_status: CoffmanStatus {
            mutual_exclusion: true,
            hold_and_wait: !hold_and_wait.is_empty(),
            no_preemption: true,
            circular_wait: !cycle.is_empty(),
        },
        narrative,
        cycle_description,
        cycle,
        hold_and_wait_processes: hold_and_wait,
        stuck_processes: outcome.deadlocked.clone(),
    }
}
