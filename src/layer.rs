//! Layers of a laid-out window

use crate::store::NodeId;
use serde::{Deserialize, Serialize};

/// Nodes sharing one topological depth, drawn at the same x
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Node ids from top to bottom
    pub nodes: Vec<NodeId>,
    /// Widest member
    pub width: f64,
    /// Left edge of the layer
    pub x: f64,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node of the given width
    pub fn push(&mut self, id: NodeId, width: f64) {
        if width > self.width {
            self.width = width;
        }
        self.nodes.push(id);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| *n == id)
    }

    /// Right edge of the layer
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Index of the layer closest to `x`.
///
/// When `x` lies exactly between the end of one layer and the start of the
/// next, the right layer wins. Returns `None` for an empty list.
pub fn layer_index_near(layers: &[Layer], x: f64) -> Option<usize> {
    if layers.is_empty() {
        return None;
    }

    let insertion = layers.partition_point(|l| l.x < x);
    if insertion < layers.len() && layers[insertion].x == x {
        return Some(insertion);
    }
    if insertion >= layers.len() {
        return Some(layers.len() - 1);
    }
    if insertion == 0 {
        return Some(0);
    }

    let right = &layers[insertion];
    let left = &layers[insertion - 1];
    if right.x - x > x - left.right() {
        Some(insertion - 1)
    } else {
        Some(insertion)
    }
}
