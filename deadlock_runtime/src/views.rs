//! Graph views built from a handoff snapshot.

use serde::Serialize;
use tracing::debug;

use deadlock_kernel::domain::{GraphModels, ResourceInfo};
use deadlock_kernel::graph::{build_graph_models, find_wait_cycles, CycleHighlight};

use crate::handoff::HandoffSnapshot;

/// Everything a renderer needs for both graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphViews {
    pub resources: Vec<ResourceInfo>,
    #[serde(flatten)]
    pub models: GraphModels,
    /// Wait-for cycle members. Not serialized; renderers ask for it directly.
    #[serde(skip)]
    pub highlight: CycleHighlight,
}

impl GraphViews {
    pub fn has_wait_cycle(&self) -> bool {
        self.highlight.has_cycle()
    }
}

/// Resources are named `R0`, `R1`, ... with the snapshot's totals.
pub fn build_views(snapshot: &HandoffSnapshot) -> GraphViews {
    let resources: Vec<ResourceInfo> = snapshot
        .total_resources
        .iter()
        .enumerate()
        .map(|(r, total)| ResourceInfo {
            name: format!("R{}", r),
            total_instances: *total,
        })
        .collect();

    let models = build_graph_models(
        snapshot.num_processes,
        &resources,
        &snapshot.allocation,
        &snapshot.request,
    );
    let highlight = find_wait_cycles(&models.wag_nodes, &models.wag_links);
    debug!(
        rag_links = models.rag_links.len(),
        wait_links = models.wag_links.len(),
        cycle_nodes = highlight.nodes.len(),
        "graph views built"
    );

    GraphViews {
        resources,
        models,
        highlight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deadlock_kernel::domain::EdgeKind;

    #[test]
    fn test_circular_views() {
        let snap = HandoffSnapshot {
            num_processes: 3,
            num_resources: 3,
            total_resources: vec![1, 1, 1],
            allocation: vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]],
            request: vec![vec![0, 1, 0], vec![0, 0, 1], vec![1, 0, 0]],
        };
        let views = build_views(&snap);
        assert_eq!(views.resources[2].name, "R2");
        assert_eq!(views.models.rag_nodes.len(), 6);
        assert_eq!(views.models.wag_links.len(), 3);
        assert!(views.models.wag_links.iter().all(|e| e.kind == EdgeKind::Wait));
        assert!(views.has_wait_cycle());
        assert_eq!(views.highlight.first_path, vec!["P0", "P1", "P2"]);
    }

    #[test]
    fn test_no_cycle_when_resources_free() {
        let snap = HandoffSnapshot {
            num_processes: 2,
            num_resources: 1,
            total_resources: vec![3],
            allocation: vec![vec![1], vec![1]],
            request: vec![vec![1], vec![1]],
        };
        let views = build_views(&snap);
        assert!(views.models.wag_links.is_empty());
        assert!(!views.has_wait_cycle());
    }

    #[test]
    fn test_views_json_is_flat() {
        let snap = HandoffSnapshot {
            num_processes: 1,
            num_resources: 1,
            total_resources: vec![2],
            allocation: vec![vec![1]],
            request: vec![vec![0]],
        };
        let v = serde_json::to_value(build_views(&snap)).unwrap();
        assert_eq!(v["resources"][0]["totalInstances"], 2);
        assert_eq!(v["ragNodes"][1]["type"], "RESOURCE");
        assert_eq!(v["ragNodes"][1]["availableCount"], 1);
        assert!(v.get("highlight").is_none());
    }
}
