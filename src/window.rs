//! The materialized portion of the graph being laid out
//!
//! A [`Window`] is an arena of [`DrawableNode`]s keyed by id. Adjacency is
//! stored as id lists on each node and resolved through the arena, and layer
//! membership is an index into `layers`, so the window has no reference
//! cycles and can be moved between threads as one owned value.

use crate::collect::Neighborhood;
use crate::layer::Layer;
use crate::merge::Side;
use crate::node::DrawableNode;
use crate::store::{GenomeId, GenomeSet, NodeId};
use std::collections::{BTreeMap, BTreeSet};

/// A real (segment level) edge
pub type EdgeKey = (NodeId, NodeId);

/// Genomes assigned to each real edge
pub type FlowMap = BTreeMap<EdgeKey, GenomeSet>;

/// Boundary state set aside by one expansion.
///
/// Pruning the expansion's segments away again hands the seeds back to the
/// boundary they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionRecord {
    pub side: Side,
    /// Boundary nodes the expansion was seeded from
    pub seeds: BTreeSet<NodeId>,
    /// Seeds that also sat on the opposite boundary
    pub unseated: BTreeSet<NodeId>,
    /// Real segments the expansion brought in
    pub added: BTreeSet<NodeId>,
}

/// A bounded, laid-out neighborhood of the genome graph
#[derive(Debug, Clone)]
pub struct Window {
    /// All occupants, indexed by id
    pub nodes: BTreeMap<NodeId, DrawableNode>,
    /// Layers from left to right
    pub layers: Vec<Layer>,
    /// Parent-ward boundary
    pub roots: BTreeSet<NodeId>,
    /// Child-ward boundary
    pub ends: BTreeSet<NodeId>,
    /// Genome flow per real edge
    pub flows: FlowMap,
    /// Expansions not yet pruned away, oldest first
    pub expansions: Vec<ExpansionRecord>,
    pub zoom: f64,
    pub total_genomes: usize,
    next_synthetic: NodeId,
}

impl Window {
    /// Create an empty window
    pub fn new(zoom: f64, total_genomes: usize) -> Self {
        Self {
            nodes: BTreeMap::new(),
            layers: Vec::new(),
            roots: BTreeSet::new(),
            ends: BTreeSet::new(),
            flows: FlowMap::new(),
            expansions: Vec::new(),
            zoom,
            total_genomes,
            next_synthetic: -1,
        }
    }

    /// Create a window holding a collected neighborhood
    pub fn from_neighborhood(hood: Neighborhood, zoom: f64, total_genomes: usize) -> Self {
        let mut window = Self::new(zoom, total_genomes);
        window.absorb_neighborhood(hood);
        window
    }

    /// An empty window whose synthetic ids continue after this one's, so the
    /// two can later be merged without id clashes
    pub fn continuing(&self) -> Self {
        let mut window = Self::new(self.zoom, self.total_genomes);
        window.next_synthetic = self.next_synthetic;
        window
    }

    pub(crate) fn absorb_neighborhood(&mut self, hood: Neighborhood) {
        for node in hood.nodes {
            self.nodes.insert(node.id, node);
        }
        self.roots = hood.roots;
        self.ends = hood.ends;
    }

    pub(crate) fn next_synthetic(&self) -> NodeId {
        self.next_synthetic
    }

    pub(crate) fn set_next_synthetic(&mut self, next: NodeId) {
        self.next_synthetic = self.next_synthetic.min(next);
    }

    /// Hand out a fresh synthetic id
    pub fn allocate_id(&mut self) -> NodeId {
        let id = self.next_synthetic;
        self.next_synthetic -= 1;
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&DrawableNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DrawableNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Real segment ids drawn in the window, including those folded into bubbles
    pub fn real_ids(&self) -> BTreeSet<NodeId> {
        self.nodes
            .values()
            .filter(|n| !n.is_bridge())
            .flat_map(|n| n.source_ids())
            .collect()
    }

    /// Layer index of a node
    pub fn layer_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.get(&id).and_then(|n| n.layer)
    }

    /// Parents of a node that are present in the window
    pub fn parents_in_window(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .map(|n| self.present(&n.parents))
            .unwrap_or_default()
    }

    /// Children of a node that are present in the window
    pub fn children_in_window(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .map(|n| self.present(&n.children))
            .unwrap_or_default()
    }

    fn present(&self, ids: &[NodeId]) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        ids.iter()
            .copied()
            .filter(|id| self.nodes.contains_key(id) && seen.insert(*id))
            .collect()
    }

    /// The real segment an edge leaving `id` starts from
    pub fn parent_segment(&self, id: NodeId) -> NodeId {
        self.nodes
            .get(&id)
            .and_then(|n| n.bridged_edge())
            .map(|(from, _)| from)
            .unwrap_or(id)
    }

    /// The real segment an edge entering `id` ends at
    pub fn child_segment(&self, id: NodeId) -> NodeId {
        self.nodes
            .get(&id)
            .and_then(|n| n.bridged_edge())
            .map(|(_, to)| to)
            .unwrap_or(id)
    }

    /// Genomes flowing along the drawn edge `left -> right`
    pub fn flow_between(&self, left: NodeId, right: NodeId) -> Option<&GenomeSet> {
        let key = (self.parent_segment(left), self.child_segment(right));
        self.flows.get(&key)
    }

    /// Segments and bubbles carrying `genome`, in layer order
    pub fn nodes_with_genome(&self, genome: GenomeId) -> Vec<NodeId> {
        self.drawn_nodes()
            .filter(|n| n.genomes.contains(&genome))
            .map(|n| n.id)
            .collect()
    }

    /// Real edges whose flow includes `genome`
    pub fn edges_with_genome(&self, genome: GenomeId) -> Vec<EdgeKey> {
        self.flows
            .iter()
            .filter(|(_, genomes)| genomes.contains(&genome))
            .map(|(edge, _)| *edge)
            .collect()
    }

    /// Segments and bubbles carrying between `min` and `max` genomes, inclusive
    pub fn nodes_by_genome_count(&self, min: usize, max: usize) -> Vec<NodeId> {
        self.drawn_nodes()
            .filter(|n| (min..=max).contains(&n.genomes.len()))
            .map(|n| n.id)
            .collect()
    }

    fn drawn_nodes(&self) -> impl Iterator<Item = &DrawableNode> {
        self.layers
            .iter()
            .flat_map(|l| l.nodes.iter())
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| !n.is_bridge())
    }

    /// Node ids layer by layer, top to bottom. This is a topological order.
    pub fn ids_in_layer_order(&self) -> Vec<NodeId> {
        self.layers
            .iter()
            .flat_map(|l| l.nodes.iter().copied())
            .collect()
    }

    /// Recompute a layer's width from its members
    pub fn refresh_layer_width(&mut self, index: usize) {
        let Some(layer) = self.layers.get(index) else {
            return;
        };
        let width = layer
            .nodes
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|n| n.width)
            .fold(0.0, f64::max);
        self.layers[index].width = width;
    }

    /// Re-point every node's layer index at its position in `layers`
    pub fn reindex_layers(&mut self) {
        for (index, layer) in self.layers.iter().enumerate() {
            for id in &layer.nodes {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.layer = Some(index);
                }
            }
        }
    }

    /// Describe the first broken layering invariant, if any.
    ///
    /// Every in-window parent must sit exactly one layer before its child.
    pub fn layering_violation(&self) -> Option<String> {
        for (index, layer) in self.layers.iter().enumerate() {
            for id in &layer.nodes {
                let Some(node) = self.nodes.get(id) else {
                    return Some(format!("layer {} lists missing node {}", index, id));
                };
                if node.layer != Some(index) {
                    return Some(format!(
                        "node {} is in layer {} but records {:?}",
                        id, index, node.layer
                    ));
                }
                for parent in self.parents_in_window(*id) {
                    match self.layer_of(parent) {
                        Some(p) if p + 1 == index => {}
                        other => {
                            return Some(format!(
                                "edge {} -> {} spans layers {:?} -> {}",
                                parent, id, other, index
                            ))
                        }
                    }
                }
            }
        }
        None
    }

    /// Shift all coordinates
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for layer in &mut self.layers {
            layer.x += dx;
        }
        for node in self.nodes.values_mut() {
            node.x += dx;
            node.y += dy;
        }
    }

    /// Divide all coordinates and sizes by `scale`
    pub fn zoom(&mut self, scale: f64) {
        self.zoom /= scale;
        for layer in &mut self.layers {
            layer.x /= scale;
            layer.width /= scale;
        }
        for node in self.nodes.values_mut() {
            node.x /= scale;
            node.y /= scale;
            node.width /= scale;
            node.height /= scale;
            node.stroke_width /= scale;
        }
    }

    /// A segment near canvas x that can serve as the new center of the view.
    ///
    /// Prefers segments longer than one base in the nearest layer, then in its
    /// neighbor; falls back to `current` when none qualifies.
    pub fn center_node(&self, x: f64, current: NodeId) -> NodeId {
        let Some(index) = crate::layer::layer_index_near(&self.layers, x) else {
            return current;
        };

        let pick = |layer: usize, min_len: usize| {
            self.layers.get(layer).and_then(|l| {
                l.nodes.iter().copied().find(|id| {
                    matches!(
                        self.nodes.get(id).map(|n| &n.kind),
                        Some(crate::node::NodeKind::Segment { sequence }) if sequence.len() > min_len
                    )
                })
            })
        };

        if let Some(id) = pick(index, 1) {
            return id;
        }
        let neighbor = if index + 1 >= self.layers.len() {
            index.checked_sub(1)
        } else {
            Some(index + 1)
        };
        neighbor.and_then(|n| pick(n, 1)).unwrap_or(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::store::GenomeGraph;

    fn chain_window() -> Window {
        let mut graph = GenomeGraph::new();
        graph.add_node(1, "AAAA", [0]);
        graph.add_node(2, "C", [0]);
        graph.add_node(3, "GGGG", [0]);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);

        let config = LayoutConfig::default();
        let mut window = Window::new(1.0, 1);
        for (index, id) in [1, 2, 3].into_iter().enumerate() {
            let mut node = DrawableNode::segment(&graph, id, 1.0, &config);
            node.layer = Some(index);
            node.x = index as f64 * 40.0;
            window.nodes.insert(id, node);
            let mut layer = Layer::new();
            layer.push(id, 10.0);
            layer.x = index as f64 * 40.0;
            window.layers.push(layer);
        }
        window
    }

    #[test]
    fn test_in_window_relations() {
        let mut window = chain_window();
        window.nodes.remove(&3);
        window.layers.pop();
        assert_eq!(window.children_in_window(2), Vec::<NodeId>::new());
        assert_eq!(window.parents_in_window(2), vec![1]);
        assert!(window.layering_violation().is_none());
    }

    #[test]
    fn test_layering_violation_reported() {
        let mut window = chain_window();
        if let Some(node) = window.get_mut(3) {
            node.parents.push(1);
        }
        let violation = window.layering_violation().unwrap();
        assert!(violation.contains("1 -> 3"));
    }

    #[test]
    fn test_synthetic_ids_continue() {
        let mut window = chain_window();
        assert_eq!(window.allocate_id(), -1);
        assert_eq!(window.allocate_id(), -2);
        let mut next = window.continuing();
        assert_eq!(next.allocate_id(), -3);
    }

    #[test]
    fn test_translate_and_zoom() {
        let mut window = chain_window();
        window.translate(10.0, 5.0);
        assert_eq!(window.layers[1].x, 50.0);
        assert_eq!(window.get(2).unwrap().y, 5.0);

        window.zoom(2.0);
        assert_eq!(window.zoom, 0.5);
        assert_eq!(window.layers[1].x, 25.0);
    }

    #[test]
    fn test_genome_queries_skip_bridges() {
        // 0 -> {1, 2} -> 3 collapses to a bubble, 0 -> 3 is bridged
        let mut graph = GenomeGraph::new();
        graph.add_node(0, "ACGT", [0, 1, 2]);
        graph.add_node(1, "A", [0]);
        graph.add_node(2, "C", [1]);
        graph.add_node(3, "ACGT", [0, 1, 2]);
        for (from, to) in [(0, 1), (0, 2), (1, 3), (2, 3), (0, 3)] {
            graph.add_edge(from, to);
        }
        let config = LayoutConfig {
            min_radius: 0,
            ..LayoutConfig::default()
        };
        let window = crate::pipeline::Pipeline::new(&graph, &config)
            .build_window(0, 3, 1.0)
            .unwrap();
        let bubble = window.nodes.values().find(|n| n.is_bubble()).unwrap().id;

        assert_eq!(window.nodes_with_genome(2), vec![0, 3]);
        assert_eq!(window.nodes_with_genome(0), vec![0, bubble, 3]);
        assert!(window.nodes_with_genome(7).is_empty());

        assert_eq!(window.edges_with_genome(2), vec![(0, 3)]);
        let mut through_bubble = window.edges_with_genome(1);
        through_bubble.sort_unstable();
        assert_eq!(through_bubble, vec![(bubble, 3), (0, bubble)]);

        assert_eq!(window.nodes_by_genome_count(2, 2), vec![bubble]);
        assert_eq!(window.nodes_by_genome_count(3, 3), vec![0, 3]);
        // the bridge carries no genomes but is never reported
        assert!(window.nodes_by_genome_count(0, 1).is_empty());
    }

    #[test]
    fn test_center_node_skips_single_bases() {
        let window = chain_window();
        // layer 1 holds node 2 with a one-base sequence
        assert_eq!(window.center_node(40.0, 99), 3);
        assert_eq!(window.center_node(0.0, 99), 1);
    }
}
