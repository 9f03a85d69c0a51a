//! Deadlock Kernel v1: Error Types
//!
//! The analysis itself is total and never returns these. They cover
//! the edges: file and JSON handling, and result verification.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A produced result failed one of the checks in `invariants`.
    /// The message starts with `[INVARIANT:<name>]`.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
