//! Error types for pglayout

use crate::store::NodeId;
use thiserror::Error;

/// Result type alias for pglayout operations
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Which side of a node a relation lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Parent,
    Child,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Parent => write!(f, "parent"),
            Relation::Child => write!(f, "child"),
        }
    }
}

/// Main error type for pglayout
#[derive(Error, Debug)]
pub enum LayoutError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// GFA parsing errors
    #[error("GFA parse error at line {line}: {message}")]
    GfaParse { line: usize, message: String },

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File not found errors
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Snapshot file errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// The input graph is not a DAG
    #[error("Cycle detected through node {node}")]
    Cycle { node: NodeId },

    /// A relation to be replaced is not recorded on the node
    #[error("Node {target} is not a {relation} of node {node}")]
    Rewire {
        node: NodeId,
        target: NodeId,
        relation: Relation,
    },

    /// A requested node does not exist in the graph store
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// A layout was superseded before it finished
    #[error("Layout cancelled")]
    Cancelled,
}

impl From<bincode::Error> for LayoutError {
    fn from(err: bincode::Error) -> Self {
        LayoutError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(err: serde_json::Error) -> Self {
        LayoutError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewire_message() {
        let err = LayoutError::Rewire {
            node: 4,
            target: 9,
            relation: Relation::Child,
        };
        assert_eq!(err.to_string(), "Node 9 is not a child of node 4");
    }
}
