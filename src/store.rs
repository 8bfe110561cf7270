//! Read-only access to the full genome graph
//!
//! The layout engine never owns the graph it draws. It asks a [`GraphStore`]
//! for the neighbors, sequence and genomes of each node it discovers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Node identifier. Real segments use ids `>= 0`; synthetic window nodes
/// use negative ids.
pub type NodeId = i64;

/// Genome (path) identifier
pub type GenomeId = u32;

/// Ordered set of genome ids
pub type GenomeSet = BTreeSet<GenomeId>;

/// Source of graph topology and node payloads
pub trait GraphStore {
    /// Whether the node exists in the store
    fn contains(&self, id: NodeId) -> bool;

    /// Ids of the parents of a node (empty for unknown ids)
    fn parents_of(&self, id: NodeId) -> Vec<NodeId>;

    /// Ids of the children of a node (empty for unknown ids)
    fn children_of(&self, id: NodeId) -> Vec<NodeId>;

    /// Sequence of a node
    fn sequence_of(&self, id: NodeId) -> Option<String>;

    /// Genomes traversing a node
    fn genomes_of(&self, id: NodeId) -> GenomeSet;

    /// Number of genomes in the whole graph
    fn total_genome_count(&self) -> usize;
}

/// A segment of the genome graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub sequence: String,
    pub genomes: GenomeSet,
    pub parents: Vec<NodeId>,
    pub children: Vec<NodeId>,
}

/// In-memory genome graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenomeGraph {
    /// Nodes indexed by id
    pub nodes: HashMap<NodeId, Node>,
    /// Genome names, indexed by genome id
    pub genome_names: Vec<String>,
}

impl GenomeGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, replacing the payload of an existing one but keeping its edges
    pub fn add_node<I>(&mut self, id: NodeId, sequence: &str, genomes: I)
    where
        I: IntoIterator<Item = GenomeId>,
    {
        let genomes: GenomeSet = genomes.into_iter().collect();
        if let Some(&max) = genomes.iter().next_back() {
            let needed = max as usize + 1;
            while self.genome_names.len() < needed {
                let next = self.genome_names.len();
                self.genome_names.push(format!("genome{}", next));
            }
        }

        let node = self.nodes.entry(id).or_insert_with(|| Node {
            id,
            sequence: String::new(),
            genomes: GenomeSet::new(),
            parents: Vec::new(),
            children: Vec::new(),
        });
        node.sequence = sequence.to_string();
        node.genomes = genomes;
    }

    /// Add an edge. Duplicate edges and edges between unknown nodes are ignored.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return false;
        }
        if self.nodes[&from].children.contains(&to) {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(&from) {
            node.children.push(to);
        }
        if let Some(node) = self.nodes.get_mut(&to) {
            node.parents.push(from);
        }
        true
    }

    /// Add a genome to a node's genome set
    pub fn add_genome(&mut self, id: NodeId, genome: GenomeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.genomes.insert(genome);
        }
    }

    /// Register a named genome and return its id
    pub fn add_genome_name(&mut self, name: &str) -> GenomeId {
        self.genome_names.push(name.to_string());
        (self.genome_names.len() - 1) as GenomeId
    }

    /// Get node by id
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get number of edges
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.children.len()).sum()
    }
}

impl GraphStore for GenomeGraph {
    fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn parents_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .map(|n| n.parents.clone())
            .unwrap_or_default()
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn sequence_of(&self, id: NodeId) -> Option<String> {
        self.nodes.get(&id).map(|n| n.sequence.clone())
    }

    fn genomes_of(&self, id: NodeId) -> GenomeSet {
        self.nodes
            .get(&id)
            .map(|n| n.genomes.clone())
            .unwrap_or_default()
    }

    fn total_genome_count(&self) -> usize {
        self.genome_names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_graph() {
        let mut graph = GenomeGraph::new();
        graph.add_node(1, "ACGT", [0, 1]);
        graph.add_node(2, "A", [0]);
        graph.add_node(3, "C", [1]);
        assert!(graph.add_edge(1, 2));
        assert!(graph.add_edge(1, 3));
        assert!(!graph.add_edge(1, 3));
        assert!(!graph.add_edge(1, 99));

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.children_of(1), vec![2, 3]);
        assert_eq!(graph.parents_of(3), vec![1]);
        assert_eq!(graph.total_genome_count(), 2);
    }

    #[test]
    fn test_unknown_node_lookups() {
        let graph = GenomeGraph::new();
        assert!(!graph.contains(5));
        assert!(graph.parents_of(5).is_empty());
        assert!(graph.children_of(5).is_empty());
        assert_eq!(graph.sequence_of(5), None);
        assert!(graph.genomes_of(5).is_empty());
    }
}
