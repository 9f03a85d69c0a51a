//! Deadlock Kernel v1: Engine
//!
//! Top-level orchestrator. Normalizes input, runs the safety pass,
//! enumerates sequences when safe, and always runs the analyzer.
//!
//! Holds configuration only. Every call is a pure function of its input.

use tracing::{error, info, warn};

use crate::analysis::analyze;
use crate::config::EngineConfig;
use crate::domain::{DetectionResult, GraphModels, ResourceInfo, SystemSnapshot};
use crate::enumerate::enumerate_safe_sequences;
use crate::graph::build_graph_models;
use crate::invariants::try_validate_result;
use crate::safety::run_safety;
use crate::state::SystemState;

#[derive(Debug, Clone, Default)]
pub struct DeadlockEngine {
    config: EngineConfig,
}

impl DeadlockEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Analyze a wire snapshot.
    pub fn detect(&self, snapshot: &SystemSnapshot) -> DetectionResult {
        self.detect_state(&SystemState::from_snapshot(snapshot))
    }

    /// Analyze an already normalized state:
    ///   1. Safety pass (lowest-index rule)
    ///   2. Enumerate safe sequences, only when safe
    ///   3. Coffman analysis
    pub fn detect_state(&self, state: &SystemState) -> DetectionResult {
        for clamp in state.clamped() {
            warn!(
                process = clamp.process,
                resource = clamp.resource,
                max = clamp.max,
                allocation = clamp.allocation,
                "Max below Allocation; Need clamped to 0"
            );
        }

        let outcome = run_safety(state);

        let all_safe_sequences = if !outcome.is_deadlocked() && self.config.enumerate_safe_sequences {
            enumerate_safe_sequences(state, self.config.max_safe_sequences)
        } else {
            Vec::new()
        };

        let analysis = analyze(state, &outcome, &all_safe_sequences);

        info!(
            processes = state.process_count(),
            resources = state.resource_count(),
            deadlocked = outcome.is_deadlocked(),
            stuck = outcome.deadlocked.len(),
            sequences = all_safe_sequences.len(),
            "analysis complete"
        );

        let result = DetectionResult {
            is_deadlocked: outcome.is_deadlocked(),
            safe_sequence: outcome.safe_sequence,
            all_safe_sequences,
            deadlocked_processes: outcome.deadlocked,
            steps: outcome.steps,
            final_available: outcome.work,
            analysis,
            diagnostics: state.clamped().to_vec(),
        };

        if self.config.verify_results {
            if let Err(err) = try_validate_result(state, &result) {
                error!(%err, "result failed verification");
            }
        }

        result
    }

    /// Graph models for rendering. Independent of any verdict.
    pub fn graphs(
        &self,
        process_count: usize,
        resources: &[ResourceInfo],
        allocation: &[Vec<u32>],
        need: &[Vec<u32>],
    ) -> GraphModels {
        build_graph_models(process_count, resources, allocation, need)
    }
}

/// One-shot analysis with the default configuration.
pub fn detect_deadlock(
    process_count: usize,
    resource_count: usize,
    available: &[u32],
    allocation: &[Vec<u32>],
    need: &[Vec<u32>],
) -> DetectionResult {
    let state = SystemState::from_need(process_count, resource_count, available, allocation, need);
    DeadlockEngine::default().detect_state(&state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_single_process() {
        let result = detect_deadlock(1, 1, &[0], &[vec![0]], &[vec![0]]);
        assert!(!result.is_deadlocked);
        assert_eq!(result.safe_sequence, vec![0]);
        assert_eq!(result.all_safe_sequences, vec![vec![0]]);
    }

    #[test]
    fn test_deadlock_skips_enumeration() {
        let result = detect_deadlock(
            2,
            1,
            &[0],
            &[vec![1], vec![1]],
            &[vec![1], vec![1]],
        );
        assert!(result.is_deadlocked);
        assert!(result.all_safe_sequences.is_empty());
        assert!(result.safe_sequence.is_empty());
        assert_eq!(result.analysis.stuck_processes, vec![0, 1]);
    }

    #[test]
    fn test_config_disables_enumeration() {
        let cfg = EngineConfig {
            enumerate_safe_sequences: false,
            ..EngineConfig::default()
        };
        let state = SystemState::from_need(1, 1, &[0], &[vec![0]], &[vec![0]]);
        let result = DeadlockEngine::new(cfg).detect_state(&state);
        assert!(result.all_safe_sequences.is_empty());
        assert_eq!(result.safe_sequence, vec![0]);
    }

    #[test]
    fn test_config_caps_enumeration() {
        let engine = DeadlockEngine::new(EngineConfig::default().with_max_safe_sequences(2));
        let state = SystemState::from_need(3, 1, &[3], &vec![vec![0]; 3], &vec![vec![1]; 3]);
        assert_eq!(engine.detect_state(&state).all_safe_sequences.len(), 2);
    }

    #[test]
    fn test_clamp_surfaces_as_diagnostic() {
        let snapshot = SystemSnapshot {
            num_processes: 1,
            num_resources: 1,
            available: vec![0],
            allocation: vec![vec![2]],
            max: Some(vec![vec![1]]),
            need: None,
        };
        let result = DeadlockEngine::default().detect(&snapshot);
        assert!(!result.is_deadlocked);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].allocation, 2);
    }

    #[test]
    fn test_inputs_untouched() {
        let alloc = vec![vec![1, 0], vec![0, 1]];
        let need = vec![vec![0, 1], vec![1, 0]];
        let before = (alloc.clone(), need.clone());
        let _ = detect_deadlock(2, 2, &[0, 0], &alloc, &need);
        assert_eq!((alloc, need), before);
    }

    #[test]
    fn test_short_rows_treated_as_zero() {
        // Two processes declared, one row supplied: P1 holds and needs nothing.
        let result = detect_deadlock(2, 1, &[0], &[vec![1]], &[]);
        assert!(!result.is_deadlocked);
        assert_eq!(result.safe_sequence, vec![0, 1]);
        assert_eq!(result.final_available, vec![1]);
    }
}
