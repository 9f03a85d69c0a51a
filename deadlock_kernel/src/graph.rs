//! Deadlock Kernel v1: Graph Utilities
//!
//! Builds the Resource-Allocation-Graph and Wait-For-Graph models of a
//! snapshot, and finds cycles with an iterative colour DFS.
//! Traversal order is fixed (node index, then edge insertion order).

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{EdgeKind, GraphEdge, GraphModels, GraphNode, NodeKind, ResourceInfo};
use crate::vector::{cell, column_sums, process_label};

// ---------------------------------------------------------------------------
// Cycle search
// ---------------------------------------------------------------------------

const WHITE: u8 = 0;
const GREY: u8 = 1;
const BLACK: u8 = 2;

/// Cycles closed by back edges, as forward node paths (first node not repeated).
///
/// `adjacency[u]` lists successors of `u` in traversal order; nodes outside
/// `adjacency` have none. DFS starts from each of `roots` in turn. With
/// `stop_at_first` the search ends at the first back edge.
pub fn find_cycles(adjacency: &[Vec<usize>], roots: &[usize], stop_at_first: bool) -> Vec<Vec<usize>> {
    let node_count = adjacency
        .iter()
        .flatten()
        .chain(roots)
        .map(|n| n + 1)
        .max()
        .unwrap_or(0)
        .max(adjacency.len());
    let mut colour = vec![WHITE; node_count];
    let mut cycles = Vec::new();
    let no_edges: Vec<usize> = Vec::new();

    for &start in roots {
        if colour[start] != WHITE {
            continue;
        }

        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        colour[start] = GREY;

        while let Some(&(node, idx)) = stack.last() {
            let neighbours = adjacency.get(node).unwrap_or(&no_edges);

            if idx < neighbours.len() {
                if let Some(top) = stack.last_mut() {
                    top.1 = idx + 1;
                }
                let nbr = neighbours[idx];

                if colour[nbr] == GREY {
                    let from = stack.iter().position(|(n, _)| *n == nbr).unwrap_or(0);
                    cycles.push(stack[from..].iter().map(|(n, _)| *n).collect());
                    if stop_at_first {
                        return cycles;
                    }
                } else if colour[nbr] == WHITE {
                    colour[nbr] = GREY;
                    stack.push((nbr, 0));
                }
            } else {
                colour[node] = BLACK;
                stack.pop();
            }
        }
    }

    cycles
}

// ---------------------------------------------------------------------------
// Graph model builder
// ---------------------------------------------------------------------------

fn resource_id(r: usize) -> String {
    format!("R{}", r)
}

fn process_node(p: usize) -> GraphNode {
    GraphNode {
        id: process_label(p),
        kind: NodeKind::Process,
        label: process_label(p),
        sub_label: None,
        total_instances: None,
        allocated_count: None,
        available_count: None,
    }
}

/// Derive both graph models from one snapshot.
///
/// RAG: ALLOCATION edge `R -> P` per positive Allocation cell, REQUEST
/// edge `P -> R` per positive Need cell.
///
/// WFG: with `current = total - Σ allocation`, a process needing more of
/// `r` than `current[r]` gets a WAIT edge to every other holder of `r`.
/// Edges between the same ordered pair are merged and their labels list
/// each resource once. This over-approximates blocking for multi-instance
/// resources and is not a deadlock verdict.
pub fn build_graph_models(
    process_count: usize,
    resources: &[ResourceInfo],
    allocation: &[Vec<u32>],
    need: &[Vec<u32>],
) -> GraphModels {
    let resource_count = resources.len();
    let allocated = column_sums(allocation, resource_count);
    let current_available: Vec<i64> = resources
        .iter()
        .zip(&allocated)
        .map(|(res, a)| i64::from(res.total_instances) - *a as i64)
        .collect();

    // -- RAG ---
    let mut rag_nodes: Vec<GraphNode> = (0..process_count).map(process_node).collect();
    for (r, res) in resources.iter().enumerate() {
        rag_nodes.push(GraphNode {
            id: resource_id(r),
            kind: NodeKind::Resource,
            label: res.name.clone(),
            sub_label: Some(res.total_instances.to_string()),
            total_instances: Some(res.total_instances),
            allocated_count: Some(allocated[r]),
            available_count: Some(current_available[r]),
        });
    }

    let mut rag_links = Vec::new();
    for p in 0..process_count {
        for r in 0..resource_count {
            let held = cell(allocation, p, r);
            if held > 0 {
                rag_links.push(GraphEdge {
                    source: resource_id(r),
                    target: process_label(p),
                    kind: EdgeKind::Allocation,
                    label: held.to_string(),
                });
            }
        }
    }
    for p in 0..process_count {
        for r in 0..resource_count {
            let wanted = cell(need, p, r);
            if wanted > 0 {
                rag_links.push(GraphEdge {
                    source: process_label(p),
                    target: resource_id(r),
                    kind: EdgeKind::Request,
                    label: wanted.to_string(),
                });
            }
        }
    }

    // -- WFG ---
    let wag_nodes: Vec<GraphNode> = (0..process_count).map(process_node).collect();
    let mut wag_links: Vec<GraphEdge> = Vec::new();
    let mut pair_index: BTreeMap<(usize, usize), usize> = BTreeMap::new();

    for p in 0..process_count {
        for (r, res) in resources.iter().enumerate() {
            let wanted = cell(need, p, r);
            if wanted == 0 || i64::from(wanted) <= current_available[r] {
                continue;
            }
            for holder in 0..process_count {
                if holder == p || cell(allocation, holder, r) == 0 {
                    continue;
                }
                match pair_index.get(&(p, holder)) {
                    Some(&i) => {
                        let edge = &mut wag_links[i];
                        if !edge.label.split(", ").any(|name| name == res.name) {
                            edge.label.push_str(", ");
                            edge.label.push_str(&res.name);
                        }
                    }
                    None => {
                        pair_index.insert((p, holder), wag_links.len());
                        wag_links.push(GraphEdge {
                            source: process_label(p),
                            target: process_label(holder),
                            kind: EdgeKind::Wait,
                            label: res.name.clone(),
                        });
                    }
                }
            }
        }
    }

    GraphModels {
        rag_nodes,
        rag_links,
        wag_nodes,
        wag_links,
    }
}

// ---------------------------------------------------------------------------
// Wait-for cycle highlighting
// ---------------------------------------------------------------------------

/// Nodes and links that lie on some wait-for cycle, for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleHighlight {
    pub nodes: BTreeSet<String>,
    pub links: BTreeSet<(String, String)>,
    /// Node ids of the first cycle found, in traversal order.
    pub first_path: Vec<String>,
}

impl CycleHighlight {
    pub fn has_cycle(&self) -> bool {
        !self.nodes.is_empty()
    }
}

/// Every cycle closed by a back edge in the given graph, starting DFS from
/// each node in order. Links referring to unknown nodes are ignored.
pub fn find_wait_cycles(nodes: &[GraphNode], links: &[GraphEdge]) -> CycleHighlight {
    let index: BTreeMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for link in links {
        if let (Some(&s), Some(&t)) = (index.get(link.source.as_str()), index.get(link.target.as_str())) {
            adjacency[s].push(t);
        }
    }

    let roots: Vec<usize> = (0..nodes.len()).collect();
    let mut highlight = CycleHighlight::default();
    for cycle in find_cycles(&adjacency, &roots, false) {
        let ids: Vec<String> = cycle.iter().map(|i| nodes[*i].id.clone()).collect();
        for (i, from) in ids.iter().enumerate() {
            let to = &ids[(i + 1) % ids.len()];
            highlight.links.insert((from.clone(), to.clone()));
            highlight.nodes.insert(from.clone());
        }
        if highlight.first_path.is_empty() {
            highlight.first_path = ids;
        }
    }
    highlight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources(totals: &[u32]) -> Vec<ResourceInfo> {
        totals
            .iter()
            .enumerate()
            .map(|(i, t)| ResourceInfo {
                name: format!("R{}", i),
                total_instances: *t,
            })
            .collect()
    }

    fn circular() -> (Vec<Vec<u32>>, Vec<Vec<u32>>) {
        (
            vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]],
            vec![vec![0, 1, 0], vec![0, 0, 1], vec![1, 0, 0]],
        )
    }

    #[test]
    fn test_find_cycles_simple_loop() {
        let adj = vec![vec![1], vec![2], vec![0]];
        assert_eq!(find_cycles(&adj, &[0, 1, 2], true), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_find_cycles_acyclic() {
        let adj = vec![vec![1, 2], vec![2], vec![]];
        assert!(find_cycles(&adj, &[0, 1, 2], false).is_empty());
    }

    #[test]
    fn test_find_cycles_suffix_only() {
        // 0 -> 1 -> 2 -> 1: the cycle excludes the tail node 0.
        let adj = vec![vec![1], vec![2], vec![1]];
        assert_eq!(find_cycles(&adj, &[0], true), vec![vec![1, 2]]);
    }

    #[test]
    fn test_find_cycles_successor_outside_adjacency() {
        let adj = vec![vec![3]];
        assert!(find_cycles(&adj, &[0], false).is_empty());
    }

    #[test]
    fn test_rag_edges() {
        let (alloc, need) = circular();
        let g = build_graph_models(3, &resources(&[1, 1, 1]), &alloc, &need);
        assert_eq!(g.rag_nodes.len(), 6);
        let allocs = g.rag_links.iter().filter(|e| e.kind == EdgeKind::Allocation).count();
        let reqs = g.rag_links.iter().filter(|e| e.kind == EdgeKind::Request).count();
        assert_eq!((allocs, reqs), (3, 3));
        assert_eq!(g.rag_links[0].source, "R0");
        assert_eq!(g.rag_links[0].target, "P0");
        assert_eq!(g.rag_links[0].label, "1");
    }

    #[test]
    fn test_rag_resource_accounting() {
        let g = build_graph_models(2, &resources(&[5]), &[vec![1], vec![2]], &[vec![0], vec![0]]);
        let r0 = &g.rag_nodes[2];
        assert_eq!(r0.kind, NodeKind::Resource);
        assert_eq!(r0.total_instances, Some(5));
        assert_eq!(r0.allocated_count, Some(3));
        assert_eq!(r0.available_count, Some(2));
        assert_eq!(r0.sub_label.as_deref(), Some("5"));
    }

    #[test]
    fn test_wfg_circular() {
        let (alloc, need) = circular();
        let g = build_graph_models(3, &resources(&[1, 1, 1]), &alloc, &need);
        assert_eq!(g.wag_nodes.len(), 3);
        let pairs: Vec<(&str, &str)> = g
            .wag_links
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("P0", "P1"), ("P1", "P2"), ("P2", "P0")]);
        assert!(g.wag_links.iter().all(|e| e.kind == EdgeKind::Wait));
    }

    #[test]
    fn test_wfg_merges_labels() {
        // P0 waits on R0 and R1, both held only by P1.
        let alloc = vec![vec![0, 0], vec![1, 1]];
        let need = vec![vec![1, 1], vec![0, 0]];
        let g = build_graph_models(2, &resources(&[1, 1]), &alloc, &need);
        assert_eq!(g.wag_links.len(), 1);
        assert_eq!(g.wag_links[0].label, "R0, R1");
    }

    #[test]
    fn test_wfg_no_wait_when_available() {
        let alloc = vec![vec![0], vec![1]];
        let need = vec![vec![1], vec![0]];
        let g = build_graph_models(2, &resources(&[2]), &alloc, &need);
        assert!(g.wag_links.is_empty());
    }

    #[test]
    fn test_wfg_edges_to_every_holder() {
        let alloc = vec![vec![0], vec![1], vec![1]];
        let need = vec![vec![1], vec![0], vec![0]];
        let g = build_graph_models(3, &resources(&[2]), &alloc, &need);
        let targets: Vec<&str> = g.wag_links.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["P1", "P2"]);
    }

    #[test]
    fn test_wait_cycle_highlight() {
        let (alloc, need) = circular();
        let g = build_graph_models(3, &resources(&[1, 1, 1]), &alloc, &need);
        let h = find_wait_cycles(&g.wag_nodes, &g.wag_links);
        assert!(h.has_cycle());
        assert_eq!(h.first_path, vec!["P0", "P1", "P2"]);
        assert_eq!(h.nodes.len(), 3);
        assert!(h.links.contains(&("P2".to_string(), "P0".to_string())));
    }
}
