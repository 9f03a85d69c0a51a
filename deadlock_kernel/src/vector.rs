//! Deadlock Kernel v1: Vector and Matrix Primitives
//!
//! All quantities are non-negative instance counts (`u32`).
//! Sums saturate instead of wrapping; the engine stays total.

/// Instance count per resource type. Index `r` is resource `r`.
pub type ResourceVector = Vec<u32>;

/// `process_count x resource_count` matrix of instance counts.
pub type Matrix = Vec<Vec<u32>>;

/// Cell lookup that treats missing rows and columns as zero.
pub fn cell(matrix: &[Vec<u32>], process: usize, resource: usize) -> u32 {
    matrix
        .get(process)
        .and_then(|row| row.get(resource))
        .copied()
        .unwrap_or(0)
}

/// Copy `v` into a vector of exactly `len` entries.
/// Excess entries are dropped, a shortfall is zero-filled.
pub fn resize_vector(v: &[u32], len: usize) -> ResourceVector {
    (0..len).map(|i| v.get(i).copied().unwrap_or(0)).collect()
}

/// Copy `m` into an exactly `rows x cols` matrix, zero-filling ragged
/// or missing cells.
pub fn resize_matrix(m: &[Vec<u32>], rows: usize, cols: usize) -> Matrix {
    (0..rows)
        .map(|p| resize_vector(m.get(p).map(|r| r.as_slice()).unwrap_or(&[]), cols))
        .collect()
}

/// Elementwise `demand <= supply`. Resources absent from `supply` count as 0.
pub fn fits(demand: &[u32], supply: &[u32]) -> bool {
    demand
        .iter()
        .enumerate()
        .all(|(r, d)| *d <= supply.get(r).copied().unwrap_or(0))
}

/// First resource index where `demand` exceeds `supply`.
pub fn first_shortfall(demand: &[u32], supply: &[u32]) -> Option<usize> {
    demand
        .iter()
        .enumerate()
        .find(|(r, d)| **d > supply.get(*r).copied().unwrap_or(0))
        .map(|(r, _)| r)
}

/// `acc += v` elementwise, saturating at `u32::MAX`.
pub fn add_into(acc: &mut [u32], v: &[u32]) {
    for (a, b) in acc.iter_mut().zip(v) {
        *a = a.saturating_add(*b);
    }
}

/// Column sums of a matrix over `cols` resources, widened to `u64`.
pub fn column_sums(m: &[Vec<u32>], cols: usize) -> Vec<u64> {
    let mut sums = vec![0u64; cols];
    for row in m {
        for (r, sum) in sums.iter_mut().enumerate() {
            *sum += u64::from(row.get(r).copied().unwrap_or(0));
        }
    }
    sums
}

pub fn any_positive(v: &[u32]) -> bool {
    v.iter().any(|x| *x > 0)
}

/// `[a, b, c]` rendering used in step descriptions.
pub fn format_vector(v: &[u32]) -> String {
    let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// `P0`, `P1`, ... process label.
pub fn process_label(p: usize) -> String {
    format!("P{}", p)
}

/// Join process labels with `sep`, e.g. `P1 → P3 → P0`.
pub fn join_processes(processes: &[usize], sep: &str) -> String {
    processes
        .iter()
        .map(|p| process_label(*p))
        .collect::<Vec<_>>()
        .join(sep)
}
