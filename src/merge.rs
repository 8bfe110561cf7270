//! Incremental growth and shrinking of a window
//!
//! A fragment collected beyond one boundary is laid out on its own, then its
//! layers are concatenated onto that end of the window. Only the new layers
//! are re-sorted and placed. Edges crossing the seam are bridged afterward.
//!
//! Pruning drops whole layers from one end. Synthetic nodes that lose an
//! endpoint go with them, and the survivors' references to dropped synthetic
//! nodes are pointed back at the real segments they stood for.

use crate::bridge::insert_all_bridges;
use crate::collect::Neighborhood;
use crate::config::LayoutConfig;
use crate::coords::{place, place_layer_nodes, place_left_from, place_right_from};
use crate::crossing::{sort_layers, sort_left_from, sort_right_from};
use crate::error::Result;
use crate::flow::compute_flows_for;
use crate::node::{DrawableNode, NodeKind};
use crate::store::NodeId;
use crate::window::Window;
use std::collections::{BTreeSet, HashMap, HashSet};

/// An end of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The root (parent-ward) end
    Left,
    /// The end (child-ward) end
    Right,
}

/// Drop fragment nodes whose edges would run backward across the seam.
///
/// A left fragment may not have parents inside the window, a right fragment
/// may not have children inside it.
pub fn drop_backward_nodes(hood: &mut Neighborhood, window: &Window, side: Side) -> usize {
    let dropped = hood.retain(|node| {
        let across = match side {
            Side::Left => &node.parents,
            Side::Right => &node.children,
        };
        !across.iter().any(|id| window.contains(*id))
    });
    if dropped > 0 {
        log::debug!("Dropped {} fragment nodes pointing back into the window", dropped);
    }
    dropped
}

fn layer_sizes(window: &Window) -> Vec<usize> {
    window.layers.iter().map(|l| l.len()).collect()
}

/// Move the fragment's nodes and flows into the window
fn absorb(window: &mut Window, fragment: &mut Window) {
    window.set_next_synthetic(fragment.next_synthetic());
    window.nodes.append(&mut fragment.nodes);
    window.flows.append(&mut fragment.flows);
}

/// Re-stack layers that gained bridges while stitching the seam
fn restack_grown(window: &mut Window, offset: usize, old_sizes: &[usize], config: &LayoutConfig) {
    for (i, &old) in old_sizes.iter().enumerate() {
        let index = i + offset;
        if window.layers.get(index).is_some_and(|l| l.len() != old) {
            place_layer_nodes(window, index, config);
        }
    }
}

/// Merge a laid-out fragment in front of the window's first layer.
///
/// The fragment's roots become the window's roots, plus any fragment end
/// that has no parent inside the merged window. Returns the number of
/// fragment nodes merged.
pub fn merge_left(window: &mut Window, mut fragment: Window, config: &LayoutConfig) -> Result<usize> {
    let seam = fragment.layers.len();
    let fragment_ids = fragment.ids_in_layer_order();
    let old_sizes = layer_sizes(window);
    let roots = std::mem::take(&mut fragment.roots);
    let ends = std::mem::take(&mut fragment.ends);

    absorb(window, &mut fragment);
    let mut layers = std::mem::take(&mut fragment.layers);
    layers.append(&mut window.layers);
    window.layers = layers;
    window.reindex_layers();

    let bridges = insert_all_bridges(window)?;
    compute_flows_for(window, &fragment_ids);

    if seam < window.layers.len() && seam > 0 {
        sort_left_from(window, seam);
        place_left_from(window, seam, config);
        restack_grown(window, seam, &old_sizes, config);
    } else {
        sort_layers(window);
        place(window, config);
    }

    let extra: Vec<NodeId> = ends
        .into_iter()
        .filter(|id| window.contains(*id) && window.parents_in_window(*id).is_empty())
        .collect();
    window.roots = roots
        .into_iter()
        .filter(|id| window.contains(*id))
        .chain(extra)
        .collect();

    log::debug!(
        "Merged {} nodes on the left ({} seam bridges), {} roots",
        fragment_ids.len(),
        bridges,
        window.roots.len()
    );
    Ok(fragment_ids.len())
}

/// Merge a laid-out fragment after the window's last layer.
///
/// Mirror image of [`merge_left`]: the fragment's ends become the window's
/// ends, and flows are refreshed for window nodes that gained children.
pub fn merge_right(window: &mut Window, mut fragment: Window, config: &LayoutConfig) -> Result<usize> {
    let seam = window.layers.len();
    let fragment_ids = fragment.ids_in_layer_order();
    let incoming: HashSet<NodeId> = fragment_ids.iter().copied().collect();
    let feeders: Vec<NodeId> = window
        .nodes
        .values()
        .filter(|n| n.children.iter().any(|c| incoming.contains(c)))
        .map(|n| n.id)
        .collect();
    let old_sizes = layer_sizes(window);
    let roots = std::mem::take(&mut fragment.roots);
    let ends = std::mem::take(&mut fragment.ends);

    absorb(window, &mut fragment);
    window.layers.append(&mut fragment.layers);
    window.reindex_layers();

    let bridges = insert_all_bridges(window)?;
    compute_flows_for(window, &feeders);

    if seam > 0 {
        sort_right_from(window, seam - 1);
        place_right_from(window, seam - 1, config);
        restack_grown(window, 0, &old_sizes, config);
    } else {
        sort_layers(window);
        place(window, config);
    }

    let extra: Vec<NodeId> = roots
        .into_iter()
        .filter(|id| window.contains(*id) && window.children_in_window(*id).is_empty())
        .collect();
    window.ends = ends
        .into_iter()
        .filter(|id| window.contains(*id))
        .chain(extra)
        .collect();

    log::debug!(
        "Merged {} nodes on the right ({} seam bridges), {} ends",
        fragment_ids.len(),
        bridges,
        window.ends.len()
    );
    Ok(fragment_ids.len())
}

/// A synthetic node that lost one of the nodes it connects
fn is_orphan(window: &Window, node: &DrawableNode) -> bool {
    match &node.kind {
        NodeKind::Segment { .. } => false,
        NodeKind::Bridge { from, to } => !window.contains(*from) || !window.contains(*to),
        NodeKind::Bubble { .. } => node
            .parents
            .iter()
            .chain(&node.children)
            .any(|id| !window.contains(*id)),
    }
}

fn remove_node(window: &mut Window, id: NodeId) -> Option<DrawableNode> {
    let node = window.nodes.remove(&id)?;
    if let Some(layer) = node.layer.and_then(|l| window.layers.get_mut(l)) {
        layer.nodes.retain(|n| *n != id);
    }
    Some(node)
}

/// Point references to dropped synthetic nodes back at real segments
fn restore_references(window: &mut Window, dropped: &[DrawableNode]) {
    let replaced: HashMap<NodeId, (Vec<NodeId>, Vec<NodeId>)> = dropped
        .iter()
        .filter(|n| !n.is_segment())
        .map(|n| (n.id, (n.source_ids(), n.target_ids())))
        .collect();
    if replaced.is_empty() {
        return;
    }

    for node in window.nodes.values_mut() {
        if node.parents.iter().any(|p| replaced.contains_key(p)) {
            node.parents = node
                .parents
                .iter()
                .flat_map(|p| replaced.get(p).map_or_else(|| vec![*p], |(s, _)| s.clone()))
                .collect();
        }
        if node.children.iter().any(|c| replaced.contains_key(c)) {
            node.children = node
                .children
                .iter()
                .flat_map(|c| replaced.get(c).map_or_else(|| vec![*c], |(_, t)| t.clone()))
                .collect();
        }
    }
}

/// Recompute the boundary on a pruned side.
///
/// Expansions whose segments are all gone hand their seeds back. When the
/// prune cut into anything else, the segments of the new edge layer and every
/// segment with a neighbor beyond that side join the boundary as well.
fn reset_boundary(window: &mut Window, side: Side, dropped: &[DrawableNode]) {
    let inside = window.real_ids();
    let mut undone = BTreeSet::new();
    let mut restored = BTreeSet::new();
    let mut reseated = BTreeSet::new();
    window.expansions.retain_mut(|record| {
        if record.side != side {
            return true;
        }
        if record.added.iter().any(|id| inside.contains(id)) {
            record.added.retain(|id| inside.contains(id));
            return true;
        }
        undone.extend(record.added.iter().copied());
        restored.extend(record.seeds.iter().copied());
        reseated.extend(record.unseated.iter().copied());
        false
    });

    let cut_deeper = dropped
        .iter()
        .filter(|n| !n.is_bridge())
        .flat_map(|n| n.source_ids())
        .any(|id| !undone.contains(&id));

    let mut fresh: BTreeSet<NodeId> = restored
        .into_iter()
        .filter(|id| window.contains(*id))
        .collect();
    if cut_deeper {
        let beyond = |node: &DrawableNode| {
            let across = match side {
                Side::Left => &node.parents,
                Side::Right => &node.children,
            };
            across.iter().any(|id| *id >= 0 && !inside.contains(id))
        };
        let edge = match side {
            Side::Left => window.layers.first(),
            Side::Right => window.layers.last(),
        };
        fresh.extend(
            edge.into_iter()
                .flat_map(|l| l.nodes.iter())
                .filter(|id| window.get(**id).is_some_and(|n| n.is_segment())),
        );
        fresh.extend(
            window
                .nodes
                .values()
                .filter(|n| n.is_segment() && beyond(n))
                .map(|n| n.id),
        );
    }
    let reseated: BTreeSet<NodeId> = reseated
        .into_iter()
        .filter(|id| window.contains(*id))
        .collect();

    match side {
        Side::Left => {
            window.roots.extend(fresh);
            window.ends.extend(reseated);
        }
        Side::Right => {
            window.ends.extend(fresh);
            window.roots.extend(reseated);
        }
    }
}

/// Drop `count` layers from one end of the window.
///
/// Expansions pruned away entirely get their boundary back. Otherwise the
/// new edge layer, and any segment left with a neighbor outside on that
/// side, become boundary nodes. Returns the number of nodes removed.
pub fn prune(window: &mut Window, side: Side, count: usize) -> usize {
    let count = count.min(window.layers.len());
    if count == 0 {
        return 0;
    }

    let drained: Vec<NodeId> = match side {
        Side::Left => window.layers.drain(..count),
        Side::Right => {
            let at = window.layers.len() - count;
            window.layers.drain(at..)
        }
    }
    .flat_map(|layer| layer.nodes)
    .collect();
    let mut dropped: Vec<DrawableNode> = drained
        .iter()
        .filter_map(|id| window.nodes.remove(id))
        .collect();
    window.reindex_layers();

    loop {
        let orphans: Vec<NodeId> = window
            .nodes
            .values()
            .filter(|n| is_orphan(window, n))
            .map(|n| n.id)
            .collect();
        let edge_empty = match side {
            Side::Left => window.layers.first(),
            Side::Right => window.layers.last(),
        }
        .is_some_and(|l| l.is_empty());
        if orphans.is_empty() && !edge_empty {
            break;
        }

        for id in orphans {
            dropped.extend(remove_node(window, id));
        }
        match side {
            Side::Left => {
                while window.layers.first().is_some_and(|l| l.is_empty()) {
                    window.layers.remove(0);
                }
            }
            Side::Right => {
                while window.layers.last().is_some_and(|l| l.is_empty()) {
                    window.layers.pop();
                }
            }
        }
        window.reindex_layers();
    }

    restore_references(window, &dropped);
    let present: BTreeSet<NodeId> = window.nodes.keys().copied().collect();
    window
        .flows
        .retain(|(from, to), _| present.contains(from) && present.contains(to));
    window.roots.retain(|id| present.contains(id));
    window.ends.retain(|id| present.contains(id));
    reset_boundary(window, side, &dropped);

    log::debug!(
        "Pruned {} nodes from the {:?} side, {} layers left",
        dropped.len(),
        side,
        window.layers.len()
    );
    dropped.len()
}
