//! Window-local drawable nodes
//!
//! A [`DrawableNode`] decorates one occupant of a window: a real segment, a
//! bridge standing in for one layer hop of a longer edge, or a bubble that
//! collapses parallel single-node paths. Parent and child lists hold ids and
//! may point at synthetic nodes once the window has been rewired.

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Relation, Result};
use crate::store::{GenomeSet, GraphStore, NodeId};
use serde::{Deserialize, Serialize};

/// A segment folded into a bubble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleMember {
    pub id: NodeId,
    pub sequence: String,
    pub genomes: GenomeSet,
}

/// Variant-specific payload of a drawable node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A real segment of the genome graph
    Segment { sequence: String },
    /// One hop of the real edge `(from, to)` across an intermediate layer
    Bridge { from: NodeId, to: NodeId },
    /// Parallel single-node paths collapsed into one node
    Bubble { members: Vec<BubbleMember> },
}

impl NodeKind {
    /// Short tag used in exports and summaries
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Segment { .. } => "segment",
            NodeKind::Bridge { .. } => "bridge",
            NodeKind::Bubble { .. } => "bubble",
        }
    }
}

/// A node as it is laid out inside a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawableNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Parents as seen within the window
    pub parents: Vec<NodeId>,
    /// Children as seen within the window
    pub children: Vec<NodeId>,
    pub genomes: GenomeSet,
    /// Index into the window's layer list
    pub layer: Option<usize>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub stroke_width: f64,
}

impl DrawableNode {
    /// Materialize a real segment from the store
    pub fn segment<S: GraphStore + ?Sized>(
        store: &S,
        id: NodeId,
        zoom: f64,
        config: &LayoutConfig,
    ) -> Self {
        let sequence = store.sequence_of(id).unwrap_or_default();
        let width = (sequence.len() as f64)
            .clamp(config.min_segment_width, config.max_segment_width)
            * zoom;

        Self {
            id,
            parents: store.parents_of(id),
            children: store.children_of(id),
            genomes: store.genomes_of(id),
            kind: NodeKind::Segment { sequence },
            layer: None,
            x: 0.0,
            y: 0.0,
            width,
            height: config.node_height * zoom,
            stroke_width: config.segment_stroke * zoom,
        }
    }

    /// A bridge for the real edge `from -> to`, linking `parent` to `child`
    pub fn bridge(id: NodeId, edge: (NodeId, NodeId), parent: NodeId, child: NodeId) -> Self {
        Self {
            id,
            kind: NodeKind::Bridge {
                from: edge.0,
                to: edge.1,
            },
            parents: vec![parent],
            children: vec![child],
            genomes: GenomeSet::new(),
            layer: None,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            stroke_width: 0.0,
        }
    }

    /// A bubble between `parent` and `child` holding the collapsed members
    pub fn bubble(
        id: NodeId,
        parent: NodeId,
        child: NodeId,
        members: Vec<BubbleMember>,
        zoom: f64,
        config: &LayoutConfig,
    ) -> Self {
        let genomes = members
            .iter()
            .flat_map(|m| m.genomes.iter().copied())
            .collect();

        Self {
            id,
            kind: NodeKind::Bubble { members },
            parents: vec![parent],
            children: vec![child],
            genomes,
            layer: None,
            x: 0.0,
            y: 0.0,
            width: config.bubble_width * zoom,
            height: config.node_height * zoom,
            stroke_width: config.bubble_stroke * zoom,
        }
    }

    pub fn is_segment(&self) -> bool {
        matches!(self.kind, NodeKind::Segment { .. })
    }

    pub fn is_bridge(&self) -> bool {
        matches!(self.kind, NodeKind::Bridge { .. })
    }

    pub fn is_bubble(&self) -> bool {
        matches!(self.kind, NodeKind::Bubble { .. })
    }

    /// The real edge a bridge stands for
    pub fn bridged_edge(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Bridge { from, to } => Some((from, to)),
            _ => None,
        }
    }

    /// Real segment ids this node stands for when seen from a child
    pub fn source_ids(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Segment { .. } => vec![self.id],
            NodeKind::Bridge { from, .. } => vec![*from],
            NodeKind::Bubble { members } => members.iter().map(|m| m.id).collect(),
        }
    }

    /// Real segment ids this node stands for when seen from a parent
    pub fn target_ids(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Segment { .. } => vec![self.id],
            NodeKind::Bridge { to, .. } => vec![*to],
            NodeKind::Bubble { members } => members.iter().map(|m| m.id).collect(),
        }
    }

    /// Replace parent `old` with `new`
    pub fn replace_parent(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        let slot = self
            .parents
            .iter_mut()
            .find(|p| **p == old)
            .ok_or(LayoutError::Rewire {
                node: self.id,
                target: old,
                relation: Relation::Parent,
            })?;
        *slot = new;
        Ok(())
    }

    /// Replace child `old` with `new`
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        let slot = self
            .children
            .iter_mut()
            .find(|c| **c == old)
            .ok_or(LayoutError::Rewire {
                node: self.id,
                target: old,
                relation: Relation::Child,
            })?;
        *slot = new;
        Ok(())
    }

    /// Remove parent `old`
    pub fn remove_parent(&mut self, old: NodeId) -> Result<()> {
        let index = self
            .parents
            .iter()
            .position(|p| *p == old)
            .ok_or(LayoutError::Rewire {
                node: self.id,
                target: old,
                relation: Relation::Parent,
            })?;
        self.parents.remove(index);
        Ok(())
    }

    /// Remove child `old`
    pub fn remove_child(&mut self, old: NodeId) -> Result<()> {
        let index = self
            .children
            .iter()
            .position(|c| *c == old)
            .ok_or(LayoutError::Rewire {
                node: self.id,
                target: old,
                relation: Relation::Child,
            })?;
        self.children.remove(index);
        Ok(())
    }

    /// Center of the left border, where incoming edges end
    pub fn left_border_center(&self) -> (f64, f64) {
        (self.x, self.y + self.height / 2.0)
    }

    /// Center of the right border, where outgoing edges start
    pub fn right_border_center(&self) -> (f64, f64) {
        (self.x + self.width, self.y + self.height / 2.0)
    }

    /// Whether the point lies in the node's box inflated by `margin`
    pub fn contains_point(&self, x: f64, y: f64, margin: f64) -> bool {
        x >= self.x - margin
            && y >= self.y - margin
            && x <= self.x + self.width + margin
            && y <= self.y + self.height + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GenomeGraph;

    #[test]
    fn test_segment_from_store() {
        let mut graph = GenomeGraph::new();
        graph.add_node(1, "ACGTACGTACGTACGT", [0]);
        graph.add_node(2, "A", [0]);
        graph.add_edge(1, 2);

        let config = LayoutConfig::default();
        let node = DrawableNode::segment(&graph, 1, 2.0, &config);
        assert_eq!(node.children, vec![2]);
        assert!(node.parents.is_empty());
        assert_eq!(node.width, 32.0);
        assert_eq!(node.height, 20.0);

        let short = DrawableNode::segment(&graph, 2, 1.0, &config);
        assert_eq!(short.width, config.min_segment_width);
    }

    #[test]
    fn test_outline_stroke_from_config() {
        let mut graph = GenomeGraph::new();
        graph.add_node(1, "ACGT", [0]);
        let config = LayoutConfig {
            segment_stroke: 2.0,
            bubble_stroke: 4.0,
            ..LayoutConfig::default()
        };

        let segment = DrawableNode::segment(&graph, 1, 0.5, &config);
        assert_eq!(segment.stroke_width, 1.0);
        let bubble = DrawableNode::bubble(-1, 0, 2, Vec::new(), 1.0, &config);
        assert_eq!(bubble.stroke_width, 4.0);
        let bridge = DrawableNode::bridge(-2, (0, 2), 0, 2);
        assert_eq!(bridge.stroke_width, 0.0);
    }

    #[test]
    fn test_replace_missing_relation() {
        let mut node = DrawableNode::bridge(-1, (1, 5), 1, 5);
        assert!(node.replace_child(5, -2).is_ok());
        assert_eq!(node.children, vec![-2]);

        let err = node.replace_parent(7, -3).unwrap_err();
        match err {
            LayoutError::Rewire {
                node,
                target,
                relation,
            } => {
                assert_eq!(node, -1);
                assert_eq!(target, 7);
                assert_eq!(relation, Relation::Parent);
            }
            other => panic!("Expected Rewire error, got {other:?}"),
        }
    }

    #[test]
    fn test_bubble_genomes_union() {
        let config = LayoutConfig::default();
        let members = vec![
            BubbleMember {
                id: 2,
                sequence: "A".to_string(),
                genomes: [0, 1].into_iter().collect(),
            },
            BubbleMember {
                id: 3,
                sequence: "C".to_string(),
                genomes: [2].into_iter().collect(),
            },
        ];
        let bubble = DrawableNode::bubble(-1, 1, 4, members, 1.0, &config);
        assert_eq!(bubble.genomes, [0, 1, 2].into_iter().collect());
        assert_eq!(bubble.source_ids(), vec![2, 3]);
        assert_eq!(bubble.width, config.bubble_width);
    }
}
