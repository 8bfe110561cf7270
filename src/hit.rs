//! Hit testing of canvas points against a laid-out window

use crate::config::LayoutConfig;
use crate::layer::layer_index_near;
use crate::node::DrawableNode;
use crate::store::NodeId;
use crate::window::Window;
use serde::Serialize;

/// What a canvas point landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Hit {
    Node(NodeId),
    /// A drawn edge, named by the real segments it connects
    Edge { from: NodeId, to: NodeId },
}

/// Stroke width of an edge carrying `flow` of `total` genomes
pub fn edge_stroke_width(flow: usize, total: usize, config: &LayoutConfig) -> f64 {
    if total == 0 {
        return config.min_edge_stroke;
    }
    let fraction = (flow as f64 / total as f64).min(1.0);
    config.min_edge_stroke + fraction * (config.max_edge_stroke - config.min_edge_stroke)
}

fn edge_threshold(window: &Window, from: NodeId, to: NodeId, config: &LayoutConfig) -> f64 {
    let flow = window.flow_between(from, to).map_or(0, |f| f.len());
    edge_stroke_width(flow, window.total_genomes, config) * window.zoom
}

fn edge_hit(window: &Window, from: NodeId, to: NodeId) -> Hit {
    Hit::Edge {
        from: window.parent_segment(from),
        to: window.child_segment(to),
    }
}

/// Find the node or edge under `(x, y)`.
///
/// Node boxes are tried first, inflated by half their stroke. Otherwise the
/// layer at or left of `x` is found; right of that layer the straight edges
/// to the next layer are tested, inside it the horizontal run from a node to
/// the layer's right edge.
pub fn locate(window: &Window, x: f64, y: f64, config: &LayoutConfig) -> Option<Hit> {
    let node_hit = window
        .nodes
        .values()
        .filter(|n| !n.is_bridge())
        .find(|n| n.contains_point(x, y, n.stroke_width / 2.0));
    if let Some(node) = node_hit {
        return Some(Hit::Node(node.id));
    }

    let mut index = layer_index_near(&window.layers, x)?;
    if window.layers[index].x > x {
        index = index.checked_sub(1)?;
    }
    let layer = &window.layers[index];
    let nodes = layer.nodes.iter().filter_map(|id| window.get(*id));

    if x > layer.right() {
        for node in nodes {
            let start = (layer.right(), node.right_border_center().1);
            for child in window.children_in_window(node.id) {
                let Some(child_node) = window.get(child) else {
                    continue;
                };
                let end = child_node.left_border_center();
                if x > end.0 || end.0 <= start.0 {
                    continue;
                }
                let line_y = start.1 + (x - start.0) / (end.0 - start.0) * (end.1 - start.1);
                if (y - line_y).abs() <= edge_threshold(window, node.id, child, config) {
                    return Some(edge_hit(window, node.id, child));
                }
            }
        }
    } else {
        for node in nodes {
            if let Some(hit) = within_layer_hit(window, node, layer.right(), x, y, config) {
                return Some(hit);
            }
        }
    }
    None
}

/// Hit on the horizontal run between a node's right border and the layer end
fn within_layer_hit(
    window: &Window,
    node: &DrawableNode,
    layer_right: f64,
    x: f64,
    y: f64,
    config: &LayoutConfig,
) -> Option<Hit> {
    let (start_x, line_y) = node.right_border_center();
    let start_x = if node.is_bridge() { node.x } else { start_x };
    if x < start_x || x > layer_right {
        return None;
    }
    window
        .children_in_window(node.id)
        .into_iter()
        .find(|child| (y - line_y).abs() <= edge_threshold(window, node.id, *child, config))
        .map(|child| edge_hit(window, node.id, child))
}
