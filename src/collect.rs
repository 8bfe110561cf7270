//! Bounded neighborhood collection
//!
//! A multi-source breadth-first search from a set of seed nodes, following
//! both child and parent edges, stopping after `radius` rings. Nodes met on
//! the last ring form the boundary of the neighborhood: those reached from a
//! parent become end nodes, those reached from a child become root nodes.

use crate::config::LayoutConfig;
use crate::node::DrawableNode;
use crate::store::{GraphStore, NodeId};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// How a queued node was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FoundFrom {
    Seed,
    Parent,
    Child,
}

enum Entry {
    Node(NodeId, FoundFrom),
    /// Marks the end of a BFS ring
    RingEnd,
}

/// Nodes of a neighborhood plus its boundary sets
#[derive(Debug, Clone, Default)]
pub struct Neighborhood {
    /// Discovered nodes in discovery order
    pub nodes: Vec<DrawableNode>,
    pub roots: BTreeSet<NodeId>,
    pub ends: BTreeSet<NodeId>,
}

impl Neighborhood {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Keep only the nodes matching `keep`, returning how many were dropped
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&DrawableNode) -> bool,
    {
        let before = self.nodes.len();
        self.nodes.retain(|n| keep(n));
        let kept: HashSet<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        self.roots.retain(|id| kept.contains(id));
        self.ends.retain(|id| kept.contains(id));
        before - self.nodes.len()
    }
}

/// Collect every node within `radius` steps of the seeds.
///
/// Nodes in `excluded` are skipped unless they are seeds; excluded seeds are
/// expanded but not returned. Ids unknown to the store are ignored. Children
/// are explored before parents so identical input gives identical output.
pub fn collect<S: GraphStore + ?Sized>(
    store: &S,
    seeds: &[NodeId],
    excluded: &HashSet<NodeId>,
    radius: usize,
    zoom: f64,
    config: &LayoutConfig,
) -> Neighborhood {
    let mut hood = Neighborhood::default();
    let mut collected: HashSet<NodeId> = HashSet::new();
    let mut queued: HashSet<(NodeId, FoundFrom)> = HashSet::new();
    let seed_set: HashSet<NodeId> = seeds.iter().copied().collect();

    let mut queue: VecDeque<Entry> = VecDeque::new();
    for &seed in seeds {
        if store.contains(seed) && queued.insert((seed, FoundFrom::Seed)) {
            queue.push_back(Entry::Node(seed, FoundFrom::Seed));
        }
    }
    queue.push_back(Entry::RingEnd);

    let mut remaining = radius as isize;
    let mut last_row = radius == 0;

    while let Some(entry) = queue.pop_front() {
        let (id, found_from) = match entry {
            Entry::RingEnd => {
                remaining -= 1;
                if remaining < 0 || queue.is_empty() {
                    break;
                }
                if remaining == 0 {
                    last_row = true;
                }
                queue.push_back(Entry::RingEnd);
                continue;
            }
            Entry::Node(id, found_from) => (id, found_from),
        };

        let is_new = if excluded.contains(&id) {
            if !seed_set.contains(&id) {
                continue;
            }
            true
        } else if !collected.insert(id) {
            false
        } else {
            hood.nodes.push(DrawableNode::segment(store, id, zoom, config));
            true
        };

        if last_row {
            if excluded.contains(&id) {
                continue;
            }
            match found_from {
                FoundFrom::Seed => {
                    hood.roots.insert(id);
                    hood.ends.insert(id);
                }
                FoundFrom::Child if is_new || hood.ends.contains(&id) => {
                    hood.roots.insert(id);
                }
                FoundFrom::Parent if is_new || hood.roots.contains(&id) => {
                    hood.ends.insert(id);
                }
                _ => {}
            }
        } else if is_new {
            for child in store.children_of(id) {
                if child >= 0 && store.contains(child) && queued.insert((child, FoundFrom::Parent))
                {
                    queue.push_back(Entry::Node(child, FoundFrom::Parent));
                }
            }
            for parent in store.parents_of(id) {
                if parent >= 0
                    && store.contains(parent)
                    && queued.insert((parent, FoundFrom::Child))
                {
                    queue.push_back(Entry::Node(parent, FoundFrom::Child));
                }
            }
        }
    }

    log::debug!(
        "Collected {} nodes ({} roots, {} ends) from {} seeds at radius {}",
        hood.nodes.len(),
        hood.roots.len(),
        hood.ends.len(),
        seeds.len(),
        radius
    );
    hood
}
