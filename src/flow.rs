//! Genome flow accounting
//!
//! Each node's genomes are split over its outgoing edges: children are
//! visited in ascending id order and every genome goes to the first child
//! that also carries it. Flows are keyed by the real edge, so a chain of
//! bridges shares the entry of the edge it stands for.

use crate::store::{GenomeSet, NodeId};
use crate::window::Window;

/// Recompute the flow map of the whole window
pub fn compute_flows(window: &mut Window) -> usize {
    window.flows.clear();
    let ids = window.ids_in_layer_order();
    compute_flows_for(window, &ids)
}

/// Recompute the outgoing flows of the given nodes.
///
/// Bridges are skipped: their edge is accounted for at its real source.
/// Returns the number of edges written.
pub fn compute_flows_for(window: &mut Window, ids: &[NodeId]) -> usize {
    let mut written = 0;

    for &id in ids {
        let Some(node) = window.get(id) else {
            continue;
        };
        if node.is_bridge() {
            continue;
        }

        let mut children: Vec<NodeId> = window
            .children_in_window(id)
            .into_iter()
            .map(|c| window.child_segment(c))
            .filter(|c| window.contains(*c))
            .collect();
        children.sort_unstable();
        children.dedup();

        let mut remaining = node.genomes.clone();
        let mut outgoing: Vec<(NodeId, GenomeSet)> = Vec::with_capacity(children.len());
        for child in children {
            let Some(child_node) = window.get(child) else {
                continue;
            };
            let flow: GenomeSet = remaining.intersection(&child_node.genomes).copied().collect();
            remaining.retain(|g| !flow.contains(g));
            outgoing.push((child, flow));
        }

        let stale: Vec<_> = window
            .flows
            .range((id, NodeId::MIN)..=(id, NodeId::MAX))
            .map(|(key, _)| *key)
            .collect();
        for key in stale {
            window.flows.remove(&key);
        }
        for (child, flow) in outgoing {
            window.flows.insert((id, child), flow);
            written += 1;
        }
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::insert_all_bridges;
    use crate::collect::collect;
    use crate::config::LayoutConfig;
    use crate::store::GenomeGraph;
    use crate::topo::assign_layers;
    use std::collections::HashSet;

    fn prepared(graph: &GenomeGraph, center: NodeId) -> Window {
        let config = LayoutConfig::default();
        let hood = collect(graph, &[center], &HashSet::new(), 5, 1.0, &config);
        let mut window = Window::from_neighborhood(hood, 1.0, graph.genome_names.len());
        assign_layers(&mut window).unwrap();
        insert_all_bridges(&mut window).unwrap();
        window
    }

    fn set(ids: &[u32]) -> GenomeSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_lowest_child_wins() {
        let mut graph = GenomeGraph::new();
        graph.add_node(1, "ACGT", [1, 2]);
        graph.add_node(2, "A", [1]);
        graph.add_node(3, "C", [2]);
        graph.add_edge(1, 2);
        graph.add_edge(1, 3);

        let mut window = prepared(&graph, 1);
        compute_flows(&mut window);

        assert_eq!(window.flows[&(1, 2)], set(&[1]));
        assert_eq!(window.flows[&(1, 3)], set(&[2]));
    }

    #[test]
    fn test_outgoing_flows_disjoint() {
        let mut graph = GenomeGraph::new();
        graph.add_node(1, "ACGT", [0, 1, 2, 3]);
        graph.add_node(2, "A", [0, 1]);
        graph.add_node(3, "C", [1, 2]);
        graph.add_node(4, "G", [2, 5]);
        for child in 2..=4 {
            graph.add_edge(1, child);
        }

        let mut window = prepared(&graph, 1);
        compute_flows(&mut window);

        let flows: Vec<&GenomeSet> = (2..=4).map(|c| &window.flows[&(1, c)]).collect();
        assert_eq!(*flows[0], set(&[0, 1]));
        assert_eq!(*flows[1], set(&[2]));
        assert!(flows[2].is_empty());

        let parent = &window.get(1).unwrap().genomes;
        let mut union = GenomeSet::new();
        for flow in &flows {
            assert!(flow.is_subset(parent));
            assert!(union.is_disjoint(flow));
            union.extend(flow.iter().copied());
        }
    }

    #[test]
    fn test_bridged_edge_keyed_by_real_endpoints() {
        // 0 -> 1 -> 2 and 0 -> 2 bridged through layer 1
        let mut graph = GenomeGraph::new();
        graph.add_node(0, "AAAA", [0, 1]);
        graph.add_node(1, "C", [0]);
        graph.add_node(2, "GGGG", [0, 1]);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(0, 2);

        let mut window = prepared(&graph, 0);
        compute_flows(&mut window);

        assert_eq!(window.flows[&(0, 1)], set(&[0]));
        assert_eq!(window.flows[&(0, 2)], set(&[1]));
        assert!(window.flows.keys().all(|(from, to)| *from >= 0 && *to >= 0));

        let bridge = window.children_in_window(0).into_iter().find(|c| *c < 0).unwrap();
        assert_eq!(window.flow_between(0, bridge), Some(&set(&[1])));
        assert_eq!(window.flow_between(bridge, 2), Some(&set(&[1])));
    }

    #[test]
    fn test_refresh_replaces_stale_entries() {
        let mut graph = GenomeGraph::new();
        graph.add_node(1, "ACGT", [1, 2]);
        graph.add_node(2, "A", [1]);
        graph.add_node(3, "C", [2]);
        graph.add_edge(1, 2);
        graph.add_edge(1, 3);

        let mut window = prepared(&graph, 1);
        compute_flows(&mut window);
        window.nodes.remove(&2);
        compute_flows_for(&mut window, &[1]);

        assert!(!window.flows.contains_key(&(1, 2)));
        assert_eq!(window.flows[&(1, 3)], set(&[2]));
    }
}
