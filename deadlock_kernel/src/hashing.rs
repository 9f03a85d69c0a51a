//! Deadlock Kernel v1: Canonical Hashing
//!
//! Deterministic serialization + SHA-256 fingerprint of a result.
//!
//! Rules:
//!   - `engine_version` first, then the result
//!   - struct fields in declaration order (serde_json `preserve_order`)
//!   - UTF-8 JSON, no whitespace, no float

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::DetectionResult;
use crate::error::KernelError;
use crate::ENGINE_VERSION;

/// Canonical serialization of a result to compact UTF-8 JSON bytes.
pub fn canonical_serialize(result: &DetectionResult) -> Result<Vec<u8>, KernelError> {
    let mut root = Map::new();
    root.insert(
        "engine_version".to_string(),
        Value::Number(u64::from(ENGINE_VERSION).into()),
    );
    root.insert("result".to_string(), serde_json::to_value(result)?);
    Ok(serde_json::to_vec(&Value::Object(root))?)
}

/// SHA-256 of the canonical serialization. Lowercase hex string.
pub fn canonical_hash(result: &DetectionResult) -> Result<String, KernelError> {
    let bytes = canonical_serialize(result)?;
    Ok(hex_digest(&bytes))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
