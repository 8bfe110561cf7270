//! Drawing coordinates
//!
//! Layers are spaced left to right. The gap between two neighbors is the
//! base padding plus an extra amount for every node of difference in their
//! sizes, so sharp changes in occupancy get more room. Inside a layer nodes
//! are stacked from `start_y` downward and centered on the layer's width.

use crate::config::LayoutConfig;
use crate::window::Window;

/// Horizontal gap between two adjacent layers of the given sizes
fn gap(config: &LayoutConfig, zoom: f64, left_size: usize, right_size: usize) -> f64 {
    let diff = left_size.abs_diff(right_size) as f64;
    config.layer_padding * zoom + config.diff_layer_padding * zoom * diff
}

/// Assign coordinates to every layer, starting at x = 0
pub fn place(window: &mut Window, config: &LayoutConfig) -> usize {
    if window.layers.is_empty() {
        return 0;
    }
    window.layers[0].x = 0.0;
    place_layer_nodes(window, 0, config);
    place_right_from(window, 0, config) + 1
}

/// Assign coordinates to the layers after `index`, which must be placed.
pub fn place_right_from(window: &mut Window, index: usize, config: &LayoutConfig) -> usize {
    let zoom = window.zoom;
    let mut placed = 0;
    for layer in index + 1..window.layers.len() {
        let prev = &window.layers[layer - 1];
        let x = prev.right() + gap(config, zoom, prev.len(), window.layers[layer].len());
        window.layers[layer].x = x;
        place_layer_nodes(window, layer, config);
        placed += 1;
    }
    placed
}

/// Assign coordinates to the layers before `index`, which must be placed.
pub fn place_left_from(window: &mut Window, index: usize, config: &LayoutConfig) -> usize {
    let zoom = window.zoom;
    let start = index.min(window.layers.len());
    let mut placed = 0;
    for layer in (0..start).rev() {
        window.refresh_layer_width(layer);
        let next = &window.layers[layer + 1];
        let current = &window.layers[layer];
        let x = next.x - gap(config, zoom, current.len(), next.len()) - current.width;
        window.layers[layer].x = x;
        place_layer_nodes(window, layer, config);
        placed += 1;
    }
    placed
}

/// Stack the nodes of one layer vertically and center them horizontally.
///
/// Bridges are stretched to the full layer width so edges run straight
/// through the layer.
pub fn place_layer_nodes(window: &mut Window, index: usize, config: &LayoutConfig) {
    window.refresh_layer_width(index);
    let zoom = window.zoom;
    let Some(layer) = window.layers.get(index) else {
        return;
    };
    let (layer_x, layer_width) = (layer.x, layer.width);
    let ids = layer.nodes.clone();

    let mut y = config.start_y * zoom;
    for id in ids {
        let Some(node) = window.get_mut(id) else {
            continue;
        };
        if node.is_bridge() {
            node.width = layer_width;
            node.height = config.node_height * zoom;
        }
        node.x = layer_x + (layer_width - node.width) / 2.0;
        node.y = y;
        y += node.height + config.node_vertical_padding * zoom;
    }
}
