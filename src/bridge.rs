//! Bridge nodes for layer-skipping edges
//!
//! After layering, an edge may jump over several layers. Each skipped layer
//! gets one bridge node so that every drawn edge crosses exactly one layer
//! gap. A chain of bridges all remember the real edge they stand for.

use crate::error::{LayoutError, Result};
use crate::node::DrawableNode;
use crate::window::Window;
use std::ops::Range;

/// Insert bridges for edges leaving the layers in `range`.
///
/// Layers are processed in increasing order, so a bridge created in layer
/// `L + 1` is itself extended when layer `L + 1` is visited. Returns the
/// number of bridges created.
pub fn insert_bridges(window: &mut Window, range: Range<usize>) -> Result<usize> {
    let mut created = 0;
    let end = range.end.min(window.layers.len().saturating_sub(1));

    for layer in range.start..end {
        let next = layer + 1;
        let members = window.layers[layer].nodes.clone();

        for id in members {
            for child in window.children_in_window(id) {
                match window.layer_of(child) {
                    Some(l) if l > next => {}
                    _ => continue,
                }

                let edge = window
                    .get(id)
                    .and_then(|n| n.bridged_edge())
                    .unwrap_or((id, child));
                let bridge_id = window.allocate_id();
                let mut bridge = DrawableNode::bridge(bridge_id, edge, id, child);
                bridge.width = window.layers[next].width;
                bridge.layer = Some(next);

                window
                    .get_mut(id)
                    .ok_or(LayoutError::UnknownNode(id))?
                    .replace_child(child, bridge_id)?;
                window
                    .get_mut(child)
                    .ok_or(LayoutError::UnknownNode(child))?
                    .replace_parent(id, bridge_id)?;

                window.layers[next].push(bridge_id, bridge.width);
                window.nodes.insert(bridge_id, bridge);
                created += 1;
            }
        }
    }

    Ok(created)
}

/// Insert bridges across the whole window
pub fn insert_all_bridges(window: &mut Window) -> Result<usize> {
    let count = window.layers.len();
    insert_bridges(window, 0..count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect;
    use crate::config::LayoutConfig;
    use crate::store::{GenomeGraph, NodeId};
    use crate::topo::assign_layers;
    use std::collections::HashSet;

    /// 0 -> 1 -> 2 -> 3 plus the shortcut 0 -> 3
    fn shortcut_window() -> Window {
        let mut graph = GenomeGraph::new();
        for id in 0..4 {
            graph.add_node(id, "ACGT", [0, 1]);
        }
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(0, 3);

        let config = LayoutConfig::default();
        let hood = collect(&graph, &[0], &HashSet::new(), 5, 1.0, &config);
        let mut window = Window::from_neighborhood(hood, 1.0, 2);
        assign_layers(&mut window).unwrap();
        window
    }

    #[test]
    fn test_bridge_chain_spans_skipped_layers() {
        let mut window = shortcut_window();
        assert_eq!(window.layer_of(3), Some(3));

        let created = insert_all_bridges(&mut window).unwrap();
        assert_eq!(created, 2);

        let bridges: Vec<&DrawableNode> = window.nodes.values().filter(|n| n.is_bridge()).collect();
        assert_eq!(bridges.len(), 2);
        let mut bridge_layers: Vec<usize> = bridges.iter().filter_map(|b| b.layer).collect();
        bridge_layers.sort();
        assert_eq!(bridge_layers, vec![1, 2]);
        for bridge in &bridges {
            assert_eq!(bridge.bridged_edge(), Some((0, 3)));
        }

        assert!(window.layering_violation().is_none());
        assert!(!window.children_in_window(0).contains(&3));
    }

    #[test]
    fn test_bridges_chain_through_rewired_ends() {
        let mut window = shortcut_window();
        insert_all_bridges(&mut window).unwrap();

        let first: NodeId = window
            .children_in_window(0)
            .into_iter()
            .find(|c| *c < 0)
            .unwrap();
        let second = window.children_in_window(first)[0];
        assert!(second < 0);
        assert_eq!(window.children_in_window(second), vec![3]);
        assert!(window.parents_in_window(3).contains(&second));
        assert_eq!(window.parent_segment(second), 0);
        assert_eq!(window.child_segment(first), 3);
    }

    #[test]
    fn test_bridge_width_matches_layer() {
        let mut window = shortcut_window();
        insert_all_bridges(&mut window).unwrap();
        for layer in &window.layers {
            for id in &layer.nodes {
                let node = window.get(*id).unwrap();
                if node.is_bridge() {
                    assert_eq!(node.width, layer.width);
                }
            }
        }
    }

    #[test]
    fn test_inconsistent_rewire_is_reported() {
        let mut window = shortcut_window();
        // node 3 no longer records 0 as a parent
        window.get_mut(3).unwrap().parents.retain(|p| *p != 0);
        let err = insert_all_bridges(&mut window).unwrap_err();
        assert!(matches!(err, LayoutError::Rewire { node: 3, target: 0, .. }));
    }
}
