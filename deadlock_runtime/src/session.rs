//! Detector session: the editable form behind one analysis.
//!
//! Holds the counts, the free-text Available input and the Allocation and
//! Max matrices. Matrices always match the current counts; resizing keeps
//! every overlapping cell. Running the session hands the form to the
//! kernel and produces the snapshot the graph views read.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use deadlock_kernel::domain::DetectionResult;
use deadlock_kernel::engine::DeadlockEngine;
use deadlock_kernel::state::{derive_need, SystemState};
use deadlock_kernel::vector::{add_into, resize_matrix, resize_vector, Matrix, ResourceVector};

use crate::handoff::HandoffSnapshot;

/// Smallest and largest process or resource count the form accepts.
pub const MIN_DIMENSION: usize = 1;
pub const MAX_DIMENSION: usize = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("cell (P{process}, R{resource}) is outside a {processes}x{resources} form")]
    CellOutOfRange {
        process: usize,
        resource: usize,
        processes: usize,
        resources: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DetectorSession {
    num_processes: usize,
    num_resources: usize,
    resources_input: String,
    allocation: Matrix,
    max: Matrix,
}

impl Default for DetectorSession {
    /// Five processes, three resources, Available `3 3 2`, empty matrices.
    fn default() -> Self {
        Self {
            num_processes: 5,
            num_resources: 3,
            resources_input: "3 3 2".to_string(),
            allocation: vec![vec![0; 3]; 5],
            max: vec![vec![0; 3]; 5],
        }
    }
}

impl DetectorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_processes(&self) -> usize {
        self.num_processes
    }

    pub fn num_resources(&self) -> usize {
        self.num_resources
    }

    pub fn resources_input(&self) -> &str {
        &self.resources_input
    }

    pub fn allocation(&self) -> &Matrix {
        &self.allocation
    }

    pub fn max(&self) -> &Matrix {
        &self.max
    }

    /// Change both counts, clamped to `MIN_DIMENSION..=MAX_DIMENSION`.
    pub fn set_dimensions(&mut self, processes: usize, resources: usize) {
        let n = processes.clamp(MIN_DIMENSION, MAX_DIMENSION);
        let m = resources.clamp(MIN_DIMENSION, MAX_DIMENSION);
        if n == self.num_processes && m == self.num_resources {
            return;
        }
        self.allocation = resize_matrix(&self.allocation, n, m);
        self.max = resize_matrix(&self.max, n, m);
        self.num_processes = n;
        self.num_resources = m;
        debug!(processes = n, resources = m, "session resized");
    }

    /// Accepts text such as `"3 3 2"` or `"3,3,2"`. Parsed by `available`.
    pub fn set_resources_input(&mut self, text: impl Into<String>) {
        self.resources_input = text.into();
    }

    pub fn set_allocation(&mut self, process: usize, resource: usize, value: u32) -> Result<(), SessionError> {
        let cell = self.cell_mut(Which::Allocation, process, resource)?;
        *cell = value;
        Ok(())
    }

    pub fn set_max(&mut self, process: usize, resource: usize, value: u32) -> Result<(), SessionError> {
        let cell = self.cell_mut(Which::Max, process, resource)?;
        *cell = value;
        Ok(())
    }

    fn cell_mut(&mut self, which: Which, process: usize, resource: usize) -> Result<&mut u32, SessionError> {
        let err = SessionError::CellOutOfRange {
            process,
            resource,
            processes: self.num_processes,
            resources: self.num_resources,
        };
        let matrix = match which {
            Which::Allocation => &mut self.allocation,
            Which::Max => &mut self.max,
        };
        matrix
            .get_mut(process)
            .and_then(|row| row.get_mut(resource))
            .ok_or(err)
    }

    /// Available parsed from the text input: tokens split on whitespace
    /// and commas, non-numbers dropped, then zero-padded or truncated to
    /// the resource count.
    pub fn available(&self) -> ResourceVector {
        let parsed: Vec<u32> = self
            .resources_input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|tok| !tok.is_empty())
            .filter_map(|tok| tok.parse().ok())
            .collect();
        resize_vector(&parsed, self.num_resources)
    }

    /// `max(0, Max - Allocation)` per cell.
    pub fn need(&self) -> Matrix {
        derive_need(&self.max, &self.allocation).0
    }

    /// Available plus the column sums of Allocation.
    pub fn total_resources(&self) -> ResourceVector {
        let mut totals = self.available();
        for row in &self.allocation {
            add_into(&mut totals, row);
        }
        totals
    }

    pub fn state(&self) -> SystemState {
        SystemState::from_max(
            self.num_processes,
            self.num_resources,
            &self.available(),
            &self.allocation,
            &self.max,
        )
    }

    /// Analyze the form and produce the handoff for the graph views.
    pub fn run(&self, engine: &DeadlockEngine) -> (DetectionResult, HandoffSnapshot) {
        let state = self.state();
        let result = engine.detect_state(&state);
        let handoff = HandoffSnapshot::from_state(&state);
        info!(
            processes = self.num_processes,
            resources = self.num_resources,
            deadlocked = result.is_deadlocked,
            "detector run"
        );
        (result, handoff)
    }

    /// The five-process textbook problem. Safe, P1 runs first.
    pub fn load_exam_problem(&mut self) {
        self.load(
            "3 3 2",
            vec![vec![0, 1, 0], vec![2, 0, 0], vec![3, 0, 2], vec![2, 1, 1], vec![0, 0, 2]],
            vec![vec![7, 5, 3], vec![3, 2, 2], vec![9, 0, 2], vec![2, 2, 2], vec![4, 3, 3]],
        );
    }

    /// Three processes each holding one resource and wanting the next.
    pub fn load_deadlock_example(&mut self) {
        self.load(
            "0 0 0",
            vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]],
            vec![vec![1, 1, 0], vec![0, 1, 1], vec![1, 0, 1]],
        );
    }

    fn load(&mut self, available: &str, allocation: Matrix, max: Matrix) {
        self.num_processes = allocation.len();
        self.num_resources = allocation.first().map_or(0, Vec::len);
        self.resources_input = available.to_string();
        self.allocation = allocation;
        self.max = max;
    }
}

enum Which {
    Allocation,
    Max,
}
