//! Deadlock Kernel v1: Core Domain Types
//!
//! Pure data. No behaviour, no analysis logic.
//! Wire names are camelCase to match the rendering layer.

use serde::{Deserialize, Serialize};

use crate::vector::{Matrix, ResourceVector};

// ── Input ──────────────────────────────────────────────────────────

/// Caller-supplied snapshot of the system.
///
/// `need` may be given directly; otherwise it is derived from `max`.
/// Ragged or missing rows are accepted and zero-filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SystemSnapshot {
    pub num_processes: usize,
    pub num_resources: usize,
    #[serde(default)]
    pub available: ResourceVector,
    #[serde(default)]
    pub allocation: Matrix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Matrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need: Option<Matrix>,
}

// ── Simulation trace ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepAction {
    Allocate,
    Release,
    Wait,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Safe,
    Unsafe,
    Neutral,
}

/// One append-only record of the safety simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStep {
    pub index: usize,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_index: Option<usize>,
    pub action: StepAction,
    pub available_snapshot: ResourceVector,
    pub status: StepStatus,
}

// ── Analysis ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoffmanStatus {
    pub mutual_exclusion: bool,
    pub hold_and_wait: bool,
    pub no_preemption: bool,
    pub circular_wait: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub coffman_status: CoffmanStatus,
    /// Ordered findings: verdict, condition violations, cycle or scarcity note.
    pub narrative: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_description: Option<String>,
    /// Cycle witness as process indices, first node not repeated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<usize>,
    /// Deadlocked processes holding and still needing instances.
    #[serde(default)]
    pub hold_and_wait_processes: Vec<usize>,
    pub stuck_processes: Vec<usize>,
}

/// A Need cell clamped to zero because Max < Allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedClamp {
    pub process: usize,
    pub resource: usize,
    pub max: u32,
    pub allocation: u32,
}

impl NeedClamp {
    pub fn message(&self) -> String {
        format!(
            "P{} declares Max {} for R{} but already holds {}; Need clamped to 0",
            self.process, self.max, self.resource, self.allocation
        )
    }
}

/// Complete, immutable outcome of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub is_deadlocked: bool,
    /// Deterministic witness chosen by the lowest-index rule.
    pub safe_sequence: Vec<usize>,
    pub all_safe_sequences: Vec<Vec<usize>>,
    pub deadlocked_processes: Vec<usize>,
    pub steps: Vec<SimulationStep>,
    pub final_available: ResourceVector,
    pub analysis: AnalysisReport,
    #[serde(default)]
    pub diagnostics: Vec<NeedClamp>,
}

// ── Graph models ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
    Process,
    Resource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_instances: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_count: Option<u64>,
    /// Signed: an inconsistent snapshot may allocate more than its total.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_count: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EdgeKind {
    Request,
    Allocation,
    Wait,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub label: String,
}

/// A resource as known to the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub name: String,
    pub total_instances: u32,
}

/// Resource-Allocation-Graph and Wait-For-Graph of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphModels {
    pub rag_nodes: Vec<GraphNode>,
    pub rag_links: Vec<GraphEdge>,
    pub wag_nodes: Vec<GraphNode>,
    pub wag_links: Vec<GraphEdge>,
}
