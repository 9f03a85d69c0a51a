//! Deadlock Kernel v1: State Construction
//!
//! Turns a caller snapshot into consistently dimensioned working data.
//! Nothing here fails: missing cells become 0, negative Need becomes 0.

use crate::domain::{NeedClamp, SystemSnapshot};
use crate::vector::{resize_matrix, resize_vector, Matrix, ResourceVector};

/// Normalized snapshot: every vector has `resource_count` entries and every
/// matrix is `process_count x resource_count`. Only the constructors
/// below can build one, so every row index below `process_count` exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemState {
    process_count: usize,
    resource_count: usize,
    available: ResourceVector,
    allocation: Matrix,
    need: Matrix,
    clamped: Vec<NeedClamp>,
}

impl SystemState {
    /// Build from raw parts where Need is already known.
    pub fn from_need(
        process_count: usize,
        resource_count: usize,
        available: &[u32],
        allocation: &[Vec<u32>],
        need: &[Vec<u32>],
    ) -> Self {
        Self {
            process_count,
            resource_count,
            available: resize_vector(available, resource_count),
            allocation: resize_matrix(allocation, process_count, resource_count),
            need: resize_matrix(need, process_count, resource_count),
            clamped: Vec::new(),
        }
    }

    /// Build from raw parts, deriving `Need = max(0, Max - Allocation)`.
    pub fn from_max(
        process_count: usize,
        resource_count: usize,
        available: &[u32],
        allocation: &[Vec<u32>],
        max: &[Vec<u32>],
    ) -> Self {
        let allocation = resize_matrix(allocation, process_count, resource_count);
        let max = resize_matrix(max, process_count, resource_count);
        let (need, clamped) = derive_need(&max, &allocation);
        Self {
            process_count,
            resource_count,
            available: resize_vector(available, resource_count),
            allocation,
            need,
            clamped,
        }
    }

    /// Build from a wire snapshot. An explicit `need` wins over `max`;
    /// with neither, Need is all zero.
    pub fn from_snapshot(snapshot: &SystemSnapshot) -> Self {
        let n = snapshot.num_processes;
        let m = snapshot.num_resources;
        match (&snapshot.need, &snapshot.max) {
            (Some(need), _) => {
                Self::from_need(n, m, &snapshot.available, &snapshot.allocation, need)
            }
            (None, Some(max)) => {
                Self::from_max(n, m, &snapshot.available, &snapshot.allocation, max)
            }
            (None, None) => Self::from_need(n, m, &snapshot.available, &snapshot.allocation, &[]),
        }
    }

    pub fn process_count(&self) -> usize {
        self.process_count
    }

    pub fn resource_count(&self) -> usize {
        self.resource_count
    }

    pub fn available(&self) -> &[u32] {
        &self.available
    }

    pub fn allocation(&self) -> &[Vec<u32>] {
        &self.allocation
    }

    pub fn need(&self) -> &[Vec<u32>] {
        &self.need
    }

    /// Cells where Max < Allocation forced a clamp.
    pub fn clamped(&self) -> &[NeedClamp] {
        &self.clamped
    }

    /// `available + Σ_p allocation[p]`, the conserved quantity of the simulation.
    pub fn total_instances(&self) -> Vec<u64> {
        let mut totals: Vec<u64> = self.available.iter().map(|v| u64::from(*v)).collect();
        for row in &self.allocation {
            for (t, a) in totals.iter_mut().zip(row) {
                *t += u64::from(*a);
            }
        }
        totals
    }
}

/// Clamped subtraction of two equally sized matrices.
/// Returns the Need matrix and one `NeedClamp` per clamped cell, row-major.
pub fn derive_need(max: &[Vec<u32>], allocation: &[Vec<u32>]) -> (Matrix, Vec<NeedClamp>) {
    let mut clamped = Vec::new();
    let need = max
        .iter()
        .enumerate()
        .map(|(p, row)| {
            row.iter()
                .enumerate()
                .map(|(r, m)| {
                    let a = allocation.get(p).and_then(|row| row.get(r)).copied().unwrap_or(0);
                    if *m < a {
                        clamped.push(NeedClamp {
                            process: p,
                            resource: r,
                            max: *m,
                            allocation: a,
                        });
                    }
                    m.saturating_sub(a)
                })
                .collect()
        })
        .collect();
    (need, clamped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_need_classic() {
        let alloc = vec![vec![0, 1, 0], vec![2, 0, 0]];
        let max = vec![vec![7, 5, 3], vec![3, 2, 2]];
        let (need, clamped) = derive_need(&max, &alloc);
        assert_eq!(need, vec![vec![7, 4, 3], vec![1, 2, 2]]);
        assert!(clamped.is_empty());
    }

    #[test]
    fn test_derive_need_clamps_and_reports() {
        let alloc = vec![vec![3, 1]];
        let max = vec![vec![1, 1]];
        let (need, clamped) = derive_need(&max, &alloc);
        assert_eq!(need, vec![vec![0, 0]]);
        assert_eq!(
            clamped,
            vec![NeedClamp { process: 0, resource: 0, max: 1, allocation: 3 }]
        );
        assert!(clamped[0].message().contains("P0"));
    }

    #[test]
    fn test_from_snapshot_prefers_explicit_need() {
        let snap = SystemSnapshot {
            num_processes: 1,
            num_resources: 2,
            available: vec![1],
            allocation: vec![vec![1, 1]],
            max: Some(vec![vec![9, 9]]),
            need: Some(vec![vec![0, 1]]),
        };
        let state = SystemState::from_snapshot(&snap);
        assert_eq!(state.need(), vec![vec![0, 1]]);
        assert_eq!(state.available(), vec![1, 0]);
    }

    #[test]
    fn test_from_snapshot_zero_need_without_max() {
        let snap = SystemSnapshot {
            num_processes: 2,
            num_resources: 1,
            available: vec![],
            allocation: vec![],
            max: None,
            need: None,
        };
        let state = SystemState::from_snapshot(&snap);
        assert_eq!(state.need(), vec![vec![0], vec![0]]);
        assert_eq!(state.allocation(), vec![vec![0], vec![0]]);
    }

    #[test]
    fn test_total_instances() {
        let state = SystemState::from_need(
            2,
            2,
            &[1, 2],
            &[vec![1, 0], vec![2, 3]],
            &[],
        );
        assert_eq!(state.total_instances(), vec![4, 5]);
    }

    #[test]
    fn test_short_matrices_padded_to_process_count() {
        let state = SystemState::from_need(3, 2, &[1], &[vec![1]], &[vec![0, 2]]);
        assert_eq!(state.allocation().len(), 3);
        assert_eq!(state.need(), vec![vec![0, 2], vec![0, 0], vec![0, 0]]);
        assert_eq!(state.available(), vec![1, 0]);
    }
}
