#![forbid(unsafe_code)]

//! Deterministic deadlock detection kernel.
//!
//! Banker's safety check with a lowest-index rule, bounded safe-sequence
//! enumeration, Coffman-condition analysis, and RAG/WFG graph models.
//! Analysis is pure and synchronous with no shared state between calls;
//! only `config` and `fixtures` touch the filesystem.

/// Engine v1. Part of every canonical hash.
pub const ENGINE_VERSION: u32 = 1;

pub mod vector;
pub mod domain;
pub mod state;
pub mod config;
pub mod error;
pub mod safety;
pub mod enumerate;
pub mod analysis;
pub mod graph;
pub mod invariants;
pub mod hashing;
pub mod engine;
pub mod fixtures;
