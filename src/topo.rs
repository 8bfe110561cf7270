//! Topological ordering and layer assignment

use crate::error::{LayoutError, Result};
use crate::layer::Layer;
use crate::store::NodeId;
use crate::window::Window;
use std::collections::{HashMap, HashSet};

/// Topologically sort the nodes of a window.
///
/// Depth-first: before a node is emitted, all of its in-window parents are
/// emitted. The input must be a DAG; a cycle yields an order that is not
/// topological, which [`assign_layers`] reports.
pub fn topo_sort(window: &Window) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(window.len());
    let mut visited: HashSet<NodeId> = HashSet::with_capacity(window.len());

    for &start in window.nodes.keys() {
        if !visited.insert(start) {
            continue;
        }

        // (node, index of the next parent to look at)
        let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
        while let Some(&(id, cursor)) = stack.last() {
            let parents = window
                .get(id)
                .map(|n| n.parents.as_slice())
                .unwrap_or_default();

            let next = parents
                .iter()
                .enumerate()
                .skip(cursor)
                .find(|(_, p)| window.contains(**p) && !visited.contains(*p));

            match next {
                Some((offset, &parent)) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 = offset + 1;
                    }
                    visited.insert(parent);
                    stack.push((parent, 0));
                }
                None => {
                    stack.pop();
                    order.push(id);
                }
            }
        }
    }

    order
}

/// Put every node one layer after its deepest in-window parent.
///
/// Nodes without in-window parents land in layer 0. Replaces the window's
/// layer list and returns the number of layers.
pub fn assign_layers(window: &mut Window) -> Result<usize> {
    let order = topo_sort(window);
    let mut levels: HashMap<NodeId, usize> = HashMap::with_capacity(order.len());
    let mut layers: Vec<Layer> = Vec::new();

    for id in order {
        let mut level = 0;
        for parent in window.parents_in_window(id) {
            match levels.get(&parent) {
                Some(&l) => level = level.max(l + 1),
                None => return Err(LayoutError::Cycle { node: id }),
            }
        }
        levels.insert(id, level);

        while layers.len() <= level {
            layers.push(Layer::new());
        }
        if let Some(node) = window.get_mut(id) {
            node.layer = Some(level);
            layers[level].push(id, node.width);
        }
    }

    window.layers = layers;
    Ok(window.layers.len())
}
