//! Handoff Codec: the snapshot the detector leaves for the graph views.
//!
//! Pure codec layer. No timestamps, no envelope.
//!
//! - `encode_handoff`:  HandoffSnapshot → compact JSON string
//! - `decode_handoff`:  JSON string → HandoffSnapshot (strict, no defaults)
//! - `restore_handoff`: decode + dimension validation
//! - `export_handoff_to_file` / `import_handoff_from_file`: file I/O
//! - `handoff_hash`:    SHA-256 of the encoded JSON (lowercase hex)

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use deadlock_kernel::hashing::hex_digest;
use deadlock_kernel::state::SystemState;
use deadlock_kernel::vector::{Matrix, ResourceVector};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// What the graph views need: totals instead of Available, and the Need
/// matrix under its rendering name `request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HandoffSnapshot {
    pub num_processes: usize,
    pub num_resources: usize,
    pub total_resources: ResourceVector,
    pub allocation: Matrix,
    pub request: Matrix,
}

impl HandoffSnapshot {
    /// Totals are `available + Σ allocation`, saturated to `u32`.
    pub fn from_state(state: &SystemState) -> Self {
        Self {
            num_processes: state.process_count(),
            num_resources: state.resource_count(),
            total_resources: state
                .total_instances()
                .into_iter()
                .map(|t| u32::try_from(t).unwrap_or(u32::MAX))
                .collect(),
            allocation: state.allocation().to_vec(),
            request: state.need().to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("SerializationError: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Malformed JSON, a missing field or an unknown field.
    #[error("DeserializationError: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Decoded snapshot whose shapes disagree with its declared counts.
    #[error("DimensionMismatch: {0}")]
    DimensionMismatch(String),

    #[error("IoError: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Encoder / decoder
// ---------------------------------------------------------------------------

/// Field order is declaration order, so identical snapshots encode
/// byte-for-byte identically.
pub fn encode_handoff(snapshot: &HandoffSnapshot) -> Result<String, HandoffError> {
    serde_json::to_string(snapshot).map_err(HandoffError::Serialization)
}

/// Strict decoding only. Use `restore_handoff` for validated loading.
pub fn decode_handoff(json: &str) -> Result<HandoffSnapshot, HandoffError> {
    serde_json::from_str(json).map_err(HandoffError::Deserialization)
}

/// Decode and check every shape against `numProcesses`/`numResources`.
pub fn restore_handoff(json: &str) -> Result<HandoffSnapshot, HandoffError> {
    let snapshot = decode_handoff(json)?;
    validate_dimensions(&snapshot)?;
    Ok(snapshot)
}

fn validate_dimensions(snapshot: &HandoffSnapshot) -> Result<(), HandoffError> {
    let n = snapshot.num_processes;
    let m = snapshot.num_resources;

    if snapshot.total_resources.len() != m {
        return Err(HandoffError::DimensionMismatch(format!(
            "totalResources has {} entries, expected {}",
            snapshot.total_resources.len(),
            m
        )));
    }
    for (name, matrix) in [("allocation", &snapshot.allocation), ("request", &snapshot.request)] {
        if matrix.len() != n {
            return Err(HandoffError::DimensionMismatch(format!(
                "{} has {} rows, expected {}",
                name,
                matrix.len(),
                n
            )));
        }
        if let Some((p, row)) = matrix.iter().enumerate().find(|(_, row)| row.len() != m) {
            return Err(HandoffError::DimensionMismatch(format!(
                "{} row P{} has {} columns, expected {}",
                name,
                p,
                row.len(),
                m
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Creates parent directories if needed.
pub fn export_handoff_to_file(snapshot: &HandoffSnapshot, path: &Path) -> Result<(), HandoffError> {
    let json = encode_handoff(snapshot)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, json.as_bytes())?;
    debug!(path = %path.display(), bytes = json.len(), "handoff exported");
    Ok(())
}

pub fn import_handoff_from_file(path: &Path) -> Result<HandoffSnapshot, HandoffError> {
    let content = fs::read_to_string(path)?;
    restore_handoff(&content)
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// SHA-256 of `encode_handoff`. Matches the hash of an exported file's bytes.
pub fn handoff_hash(snapshot: &HandoffSnapshot) -> Result<String, HandoffError> {
    let json = encode_handoff(snapshot)?;
    Ok(hex_digest(json.as_bytes()))
}
