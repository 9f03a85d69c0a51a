//! Deadlock Kernel v1: Engine Configuration
//!
//! Injected at engine construction. Every field has a default so a
//! partial JSON document is enough.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// Default cap on enumerated safe sequences.
pub const DEFAULT_MAX_SAFE_SEQUENCES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound on `all_safe_sequences`. Bounds enumeration cost.
    pub max_safe_sequences: usize,
    /// Skip the enumerator entirely when false.
    pub enumerate_safe_sequences: bool,
    /// Run result invariants after every analysis and log violations.
    pub verify_results: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_safe_sequences: DEFAULT_MAX_SAFE_SEQUENCES,
            enumerate_safe_sequences: true,
            verify_results: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, KernelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, KernelError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn with_max_safe_sequences(mut self, max: usize) -> Self {
        self.max_safe_sequences = max;
        self
    }
}
