#![forbid(unsafe_code)]

//! Deadlock Runtime v1
//!
//! Wraps the kernel with the detector form, the handoff snapshot that
//! feeds the graph views, and determinism checks.
//!
//! No decision logic lives here. Verdicts, sequences and graphs all
//! come from the kernel.

pub mod handoff;
pub mod session;
pub mod views;
pub mod determinism;
