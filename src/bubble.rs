//! SNP bubble collapsing
//!
//! A bubble is a parent `P` and child `C` joined by two or more alternative
//! single-node paths `P -> m -> C`, where each `m` has `P` as its only parent
//! and `C` as its only child. The members are replaced by one bubble node of
//! fixed width that carries the union of their genomes.

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::node::{BubbleMember, DrawableNode, NodeKind};
use crate::store::NodeId;
use crate::window::Window;

/// Collapse every bubble of a layered, bridged window.
///
/// Only members whose child is reached by a direct one-layer edge qualify,
/// so the layering invariants still hold afterward. Returns the number of
/// bubbles created.
pub fn collapse_bubbles(window: &mut Window, config: &LayoutConfig) -> Result<usize> {
    let mut created = 0;

    for layer in 0..window.layers.len() {
        let parents = window.layers[layer].nodes.clone();
        for parent in parents {
            for (child, members) in find_bubbles(window, parent) {
                collapse(window, parent, child, &members, config)?;
                created += 1;
            }
        }
    }

    if created > 0 {
        log::debug!("Collapsed {} bubbles", created);
    }
    Ok(created)
}

/// Groups of qualifying members below `parent`, keyed by their shared child
fn find_bubbles(window: &Window, parent: NodeId) -> Vec<(NodeId, Vec<NodeId>)> {
    let mut groups: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
    if window.get(parent).map_or(true, |p| p.is_bridge()) {
        return groups;
    }

    for member in window.children_in_window(parent) {
        let Some(node) = window.get(member) else {
            continue;
        };
        if !node.is_segment() || node.parents != [parent] || node.children.len() != 1 {
            continue;
        }
        let child = node.children[0];
        let qualifies = window.get(child).is_some_and(|c| {
            !c.is_bridge() && c.layer.is_some() && c.layer == node.layer.map(|l| l + 1)
        });
        if !qualifies {
            continue;
        }

        match groups.iter_mut().find(|(c, _)| *c == child) {
            Some((_, members)) => members.push(member),
            None => groups.push((child, vec![member])),
        }
    }

    groups.retain(|(_, members)| members.len() >= 2);
    groups
}

fn collapse(
    window: &mut Window,
    parent: NodeId,
    child: NodeId,
    member_ids: &[NodeId],
    config: &LayoutConfig,
) -> Result<()> {
    let layer = window
        .layer_of(member_ids[0])
        .ok_or(LayoutError::UnknownNode(member_ids[0]))?;

    let mut members = Vec::with_capacity(member_ids.len());
    for &id in member_ids {
        let node = window.nodes.remove(&id).ok_or(LayoutError::UnknownNode(id))?;
        let sequence = match node.kind {
            NodeKind::Segment { sequence } => sequence,
            _ => String::new(),
        };
        members.push(BubbleMember {
            id,
            sequence,
            genomes: node.genomes,
        });
        window.roots.remove(&id);
        window.ends.remove(&id);
    }

    let bubble_id = window.allocate_id();
    let mut bubble = DrawableNode::bubble(bubble_id, parent, child, members, window.zoom, config);
    bubble.layer = Some(layer);

    let parent_node = window
        .get_mut(parent)
        .ok_or(LayoutError::UnknownNode(parent))?;
    parent_node.replace_child(member_ids[0], bubble_id)?;
    for &id in &member_ids[1..] {
        parent_node.remove_child(id)?;
    }

    let child_node = window.get_mut(child).ok_or(LayoutError::UnknownNode(child))?;
    child_node.replace_parent(member_ids[0], bubble_id)?;
    for &id in &member_ids[1..] {
        child_node.remove_parent(id)?;
    }

    let nodes = &mut window.layers[layer].nodes;
    let slot = nodes
        .iter()
        .position(|id| member_ids.contains(id))
        .unwrap_or(nodes.len());
    nodes.retain(|id| !member_ids.contains(id));
    nodes.insert(slot.min(nodes.len()), bubble_id);

    window.nodes.insert(bubble_id, bubble);
    window.refresh_layer_width(layer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::insert_all_bridges;
    use crate::collect::collect;
    use crate::store::{GenomeGraph, GenomeSet};
    use crate::topo::assign_layers;
    use std::collections::HashSet;

    fn layered(graph: &GenomeGraph, center: NodeId) -> Window {
        let config = LayoutConfig::default();
        let hood = collect(graph, &[center], &HashSet::new(), 6, 1.0, &config);
        let mut window = Window::from_neighborhood(hood, 1.0, graph.genome_names.len());
        assign_layers(&mut window).unwrap();
        insert_all_bridges(&mut window).unwrap();
        window
    }

    /// P=1 -> {A=2, B=3} -> C=4
    fn snp() -> GenomeGraph {
        let mut graph = GenomeGraph::new();
        graph.add_node(1, "ACGT", [0, 1, 2]);
        graph.add_node(2, "A", [0]);
        graph.add_node(3, "C", [1, 2]);
        graph.add_node(4, "TTTT", [0, 1, 2]);
        graph.add_edge(1, 2);
        graph.add_edge(1, 3);
        graph.add_edge(2, 4);
        graph.add_edge(3, 4);
        graph
    }

    #[test]
    fn test_collapse_simple_snp() {
        let graph = snp();
        let mut window = layered(&graph, 1);
        let config = LayoutConfig::default();

        assert_eq!(collapse_bubbles(&mut window, &config).unwrap(), 1);

        let bubbles: Vec<&DrawableNode> = window.nodes.values().filter(|n| n.is_bubble()).collect();
        assert_eq!(bubbles.len(), 1);
        let bubble = bubbles[0];
        let expected: GenomeSet = [0, 1, 2].into_iter().collect();
        assert_eq!(bubble.genomes, expected);
        assert_eq!(bubble.width, config.bubble_width);

        assert!(!window.contains(2));
        assert!(!window.contains(3));
        assert_eq!(window.children_in_window(1), vec![bubble.id]);
        assert_eq!(window.parents_in_window(4), vec![bubble.id]);
        assert_eq!(window.children_in_window(bubble.id), vec![4]);
        assert_eq!(window.layers[1].nodes, vec![bubble.id]);
        assert!(window.layering_violation().is_none());
    }

    #[test]
    fn test_single_path_left_alone() {
        let mut graph = snp();
        // B gains a second child, so only A qualifies
        graph.add_node(5, "G", [2]);
        graph.add_edge(3, 5);
        let mut window = layered(&graph, 1);

        let created = collapse_bubbles(&mut window, &LayoutConfig::default()).unwrap();
        assert_eq!(created, 0);
        assert!(window.contains(2));
        assert!(window.contains(3));
    }

    #[test]
    fn test_member_with_bridged_child_does_not_qualify() {
        let mut graph = snp();
        // 4 is pushed one layer deeper, so 2 -> 4 and 3 -> 4 become bridged
        graph.add_node(6, "GG", [0]);
        graph.add_node(7, "GG", [0]);
        graph.add_edge(1, 6);
        graph.add_edge(6, 7);
        graph.add_edge(7, 4);
        let mut window = layered(&graph, 1);

        let created = collapse_bubbles(&mut window, &LayoutConfig::default()).unwrap();
        assert_eq!(created, 0);
        assert!(window.layering_violation().is_none());
    }
}
