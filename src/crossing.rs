//! Barycenter crossing reduction
//!
//! Layers are reordered in place, never moving a node to another layer. The
//! sweep starts at the layer with the fewest nodes and walks outward; each
//! visited layer is ordered by the mean position of its neighbors in the
//! layer visited just before it.

use crate::store::NodeId;
use crate::window::Window;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Index of the layer with the fewest nodes, earliest on ties
pub fn min_layer_index(window: &Window) -> Option<usize> {
    window
        .layers
        .iter()
        .enumerate()
        .min_by_key(|(index, layer)| (layer.len(), *index))
        .map(|(index, _)| index)
}

/// Sort every layer, sweeping outward from the smallest one.
///
/// Returns the index of the anchor layer, which keeps its discovery order.
pub fn sort_layers(window: &mut Window) -> Option<usize> {
    let anchor = min_layer_index(window)?;
    sort_left_from(window, anchor);
    sort_right_from(window, anchor);
    Some(anchor)
}

/// Sort the layers after `index` by their parents' positions.
///
/// Layer `index` itself is not touched.
pub fn sort_right_from(window: &mut Window, index: usize) {
    for layer in index + 1..window.layers.len() {
        let keys = barycenters(window, layer, layer - 1, |w, id| w.parents_in_window(id));
        reorder(window, layer, &keys);
    }
}

/// Sort the layers before `index` by their children's positions.
///
/// Layer `index` itself is not touched.
pub fn sort_left_from(window: &mut Window, index: usize) {
    let start = index.min(window.layers.len());
    for layer in (0..start).rev() {
        let keys = barycenters(window, layer, layer + 1, |w, id| w.children_in_window(id));
        reorder(window, layer, &keys);
    }
}

/// Mean position of each node's neighbors in the reference layer. Nodes
/// without a neighbor there sort last.
fn barycenters<F>(
    window: &Window,
    layer: usize,
    reference: usize,
    neighbors: F,
) -> HashMap<NodeId, f64>
where
    F: Fn(&Window, NodeId) -> Vec<NodeId>,
{
    let positions: HashMap<NodeId, usize> = window.layers[reference]
        .nodes
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();

    window.layers[layer]
        .nodes
        .iter()
        .map(|&id| {
            let placed: Vec<usize> = neighbors(window, id)
                .iter()
                .filter_map(|n| positions.get(n).copied())
                .collect();
            let key = if placed.is_empty() {
                f64::INFINITY
            } else {
                placed.iter().sum::<usize>() as f64 / placed.len() as f64
            };
            (id, key)
        })
        .collect()
}

fn reorder(window: &mut Window, layer: usize, keys: &HashMap<NodeId, f64>) {
    let key = |id: &NodeId| keys.get(id).copied().unwrap_or(f64::INFINITY);
    window.layers[layer].nodes.sort_by(|a, b| match key(a).total_cmp(&key(b)) {
        Ordering::Equal => a.cmp(b),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use crate::node::DrawableNode;

    /// Build a window from explicit layers and edges, bypassing the store
    fn window_from(layers: &[&[NodeId]], edges: &[(NodeId, NodeId)]) -> Window {
        let mut window = Window::new(1.0, 1);
        for (index, ids) in layers.iter().enumerate() {
            let mut layer = Layer::new();
            for &id in *ids {
                let mut node = DrawableNode::bridge(id, (id, id), id, id);
                node.parents.clear();
                node.children.clear();
                node.layer = Some(index);
                window.nodes.insert(id, node);
                layer.push(id, 10.0);
            }
            window.layers.push(layer);
        }
        for &(from, to) in edges {
            window.get_mut(from).unwrap().children.push(to);
            window.get_mut(to).unwrap().parents.push(from);
        }
        window
    }

    fn crossings(window: &Window) -> usize {
        let mut count = 0;
        for pair in window.layers.windows(2) {
            let pos = |layer: &Layer, id: NodeId| layer.index_of(id).unwrap();
            let mut edges = Vec::new();
            for &id in &pair[0].nodes {
                for child in window.children_in_window(id) {
                    edges.push((pos(&pair[0], id), pos(&pair[1], child)));
                }
            }
            for (i, a) in edges.iter().enumerate() {
                for b in &edges[i + 1..] {
                    if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    #[test]
    fn test_min_layer_prefers_earliest() {
        let window = window_from(&[&[1, 2], &[3], &[4]], &[]);
        assert_eq!(min_layer_index(&window), Some(1));
        assert_eq!(min_layer_index(&Window::new(1.0, 1)), None);
    }

    #[test]
    fn test_sweep_untangles_crossing() {
        // 1 -> 4, 2 -> 3: the second layer is drawn crossed
        let mut window = window_from(&[&[0], &[1, 2], &[3, 4]], &[(0, 1), (0, 2), (1, 4), (2, 3)]);
        assert_eq!(crossings(&window), 1);

        let anchor = sort_layers(&mut window);
        assert_eq!(anchor, Some(0));
        assert_eq!(window.layers[2].nodes, vec![4, 3]);
        assert_eq!(crossings(&window), 0);
    }

    #[test]
    fn test_anchor_layer_keeps_order() {
        let mut window = window_from(&[&[5, 6], &[7], &[9, 8]], &[(5, 7), (6, 7), (7, 8), (7, 9)]);
        sort_layers(&mut window);
        assert_eq!(window.layers[1].nodes, vec![7]);
        // equal barycenters fall back to ascending id
        assert_eq!(window.layers[0].nodes, vec![5, 6]);
        assert_eq!(window.layers[2].nodes, vec![8, 9]);
    }

    #[test]
    fn test_unconnected_nodes_sort_last() {
        let mut window = window_from(&[&[1, 2], &[4, 3, 5]], &[(2, 3), (1, 5)]);
        sort_right_from(&mut window, 0);
        assert_eq!(window.layers[1].nodes, vec![5, 3, 4]);
    }
}
