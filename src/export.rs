//! Render views and snapshot files
//!
//! A [`WindowSnapshot`] is the renderer's view of a window: layers, nodes with
//! their variant tag and box, and edges with their genomes and stroke width.
//! It is written as JSON, or as a binary snapshot file made of a magic
//! number, a format version and a bincode payload.

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::hit::edge_stroke_width;
use crate::node::NodeKind;
use crate::store::{GenomeId, NodeId};
use crate::window::Window;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Magic number for snapshot files
const SNAPSHOT_MAGIC: u64 = 0x50474C41594F5554; // "PGLAYOUT" in hex

/// Snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

/// Magic, version and payload length
const SNAPSHOT_HEADER_LEN: u64 = 8 + 4 + 8;

/// A layer as drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerView {
    pub index: usize,
    pub x: f64,
    pub width: f64,
    /// Node ids from top to bottom
    pub nodes: Vec<NodeId>,
}

/// A node as drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    /// "segment", "bridge" or "bubble"
    pub kind: String,
    pub layer: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Sequence of a segment, empty otherwise
    pub sequence: String,
    pub genomes: Vec<GenomeId>,
    /// Segments collapsed into a bubble
    pub members: Vec<NodeId>,
}

/// A drawn edge between two adjacent layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    /// Drawn endpoints, possibly synthetic
    pub from: NodeId,
    pub to: NodeId,
    /// The real edge this drawn edge belongs to
    pub segment_from: NodeId,
    pub segment_to: NodeId,
    pub genomes: Vec<GenomeId>,
    pub stroke_width: f64,
}

/// Everything a renderer needs to draw a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub zoom: f64,
    pub total_genomes: usize,
    pub roots: Vec<NodeId>,
    pub ends: Vec<NodeId>,
    pub layers: Vec<LayerView>,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl WindowSnapshot {
    /// Capture the current state of a window
    pub fn from_window(window: &Window, config: &LayoutConfig) -> Self {
        let layers = window
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| LayerView {
                index,
                x: layer.x,
                width: layer.width,
                nodes: layer.nodes.clone(),
            })
            .collect();

        let mut nodes = Vec::with_capacity(window.len());
        let mut edges = Vec::new();
        for id in window.ids_in_layer_order() {
            let Some(node) = window.get(id) else {
                continue;
            };
            let (sequence, members) = match &node.kind {
                NodeKind::Segment { sequence } => (sequence.clone(), Vec::new()),
                NodeKind::Bridge { .. } => (String::new(), Vec::new()),
                NodeKind::Bubble { members } => {
                    (String::new(), members.iter().map(|m| m.id).collect())
                }
            };
            nodes.push(NodeView {
                id,
                kind: node.kind.tag().to_string(),
                layer: node.layer.unwrap_or_default(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                sequence,
                genomes: node.genomes.iter().copied().collect(),
                members,
            });

            for child in window.children_in_window(id) {
                let genomes: Vec<GenomeId> = window
                    .flow_between(id, child)
                    .map(|f| f.iter().copied().collect())
                    .unwrap_or_default();
                edges.push(EdgeView {
                    from: id,
                    to: child,
                    segment_from: window.parent_segment(id),
                    segment_to: window.child_segment(child),
                    stroke_width: edge_stroke_width(genomes.len(), window.total_genomes, config),
                    genomes,
                });
            }
        }

        Self {
            zoom: window.zoom,
            total_genomes: window.total_genomes,
            roots: window.roots.iter().copied().collect(),
            ends: window.ends.iter().copied().collect(),
            layers,
            nodes,
            edges,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save as a binary snapshot file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_u64::<LittleEndian>(SNAPSHOT_MAGIC)?;
        writer.write_u32::<LittleEndian>(SNAPSHOT_VERSION)?;

        let data = bincode::serialize(self)?;
        writer.write_u64::<LittleEndian>(data.len() as u64)?;
        writer.write_all(&data)?;
        writer.flush()?;

        Ok(())
    }

    /// Load a binary snapshot file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LayoutError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let magic = reader.read_u64::<LittleEndian>()?;
        if magic != SNAPSHOT_MAGIC {
            return Err(LayoutError::Snapshot("Invalid snapshot file format".to_string()));
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version > SNAPSHOT_VERSION {
            return Err(LayoutError::Snapshot(format!(
                "Snapshot version {} not supported (max: {})",
                version, SNAPSHOT_VERSION
            )));
        }

        let data_len = reader.read_u64::<LittleEndian>()?;
        let remaining = file_len.saturating_sub(SNAPSHOT_HEADER_LEN);
        if data_len > remaining {
            return Err(LayoutError::Snapshot(format!(
                "Snapshot payload of {} bytes exceeds the {} bytes left in the file",
                data_len, remaining
            )));
        }
        let mut data = vec![0u8; data_len as usize];
        reader.read_exact(&mut data)?;

        Ok(bincode::deserialize(&data)?)
    }

    /// Short description of the snapshot
    pub fn summary(&self) -> String {
        let mut output = String::new();
        output.push_str("=== Snapshot Summary ===\n\n");
        output.push_str(&format!("Zoom: {}\n", self.zoom));
        output.push_str(&format!("Genomes: {}\n", self.total_genomes));
        output.push_str(&format!("Layers: {}\n", self.layers.len()));

        for kind in ["segment", "bridge", "bubble"] {
            let count = self.nodes.iter().filter(|n| n.kind == kind).count();
            output.push_str(&format!("{}s: {}\n", capitalize(kind), count));
        }
        output.push_str(&format!("Edges: {}\n", self.edges.len()));

        if let (Some(first), Some(last)) = (self.layers.first(), self.layers.last()) {
            output.push_str(&format!(
                "Extent: {:.1} .. {:.1}\n",
                first.x,
                last.x + last.width
            ));
        }
        output.push_str(&format!("Roots: {:?}\n", self.roots));
        output.push_str(&format!("Ends: {:?}\n", self.ends));
        output
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::store::GenomeGraph;
    use tempfile::tempdir;

    fn snapshot() -> WindowSnapshot {
        // 0 -> {1, 2} -> 3 -> 5 plus the longer 0 -> 4 -> 5
        let mut graph = GenomeGraph::new();
        graph.add_node(0, "ACGTACGT", [0, 1, 2]);
        graph.add_node(1, "A", [0]);
        graph.add_node(2, "C", [1]);
        graph.add_node(3, "GGGG", [0, 1]);
        graph.add_node(4, "TT", [2]);
        graph.add_node(5, "TTTT", [0, 1, 2]);
        for (from, to) in [(0, 1), (0, 2), (1, 3), (2, 3), (3, 5), (0, 4), (4, 5)] {
            graph.add_edge(from, to);
        }
        let config = LayoutConfig {
            min_radius: 0,
            ..LayoutConfig::default()
        };
        let window = Pipeline::new(&graph, &config).build_window(0, 4, 1.0).unwrap();
        WindowSnapshot::from_window(&window, &config)
    }

    #[test]
    fn test_snapshot_contents() {
        let snap = snapshot();
        assert_eq!(snap.layers.len(), 4);
        assert_eq!(snap.total_genomes, 3);

        let bubbles: Vec<&NodeView> = snap.nodes.iter().filter(|n| n.kind == "bubble").collect();
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].members, vec![1, 2]);
        assert_eq!(bubbles[0].genomes, vec![0, 1]);

        let bridges: Vec<&NodeView> = snap.nodes.iter().filter(|n| n.kind == "bridge").collect();
        assert_eq!(bridges.len(), 1);
        assert_eq!(bridges[0].layer, 2);

        // both halves of the bridged edge 4 -> 5 carry genome 2
        let into_bridge = snap.edges.iter().find(|e| e.from == 4).unwrap();
        assert_eq!((into_bridge.segment_from, into_bridge.segment_to), (4, 5));
        assert_eq!(into_bridge.genomes, vec![2]);
        let out_of_bridge = snap.edges.iter().find(|e| e.from == bridges[0].id).unwrap();
        assert_eq!(out_of_bridge.genomes, vec![2]);
        assert_eq!(out_of_bridge.stroke_width, into_bridge.stroke_width);

        let json = snap.to_json().unwrap();
        assert!(json.contains("\"kind\": \"bubble\""));
    }

    #[test]
    fn test_save_load_snapshot() {
        let snap = snapshot();
        let dir = tempdir().unwrap();
        let path = dir.path().join("window.snap");

        snap.save(&path).unwrap();
        let loaded = WindowSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snap);
        assert!(loaded.summary().contains("Bubbles: 1"));
    }

    #[test]
    fn test_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bogus.snap");
        std::fs::write(&path, [0u8; 32]).unwrap();

        let err = WindowSnapshot::load(&path).unwrap_err();
        assert!(matches!(err, LayoutError::Snapshot(_)));
    }

    #[test]
    fn test_rejects_oversized_payload_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncated.snap");
        let mut bytes = Vec::new();
        bytes.write_u64::<LittleEndian>(SNAPSHOT_MAGIC).unwrap();
        bytes.write_u32::<LittleEndian>(SNAPSHOT_VERSION).unwrap();
        bytes.write_u64::<LittleEndian>(u64::MAX).unwrap();
        bytes.extend_from_slice(&[0u8; 16]);
        std::fs::write(&path, bytes).unwrap();

        let err = WindowSnapshot::load(&path).unwrap_err();
        match err {
            LayoutError::Snapshot(msg) => assert!(msg.contains("exceeds")),
            other => panic!("Expected Snapshot error, got {other:?}"),
        }
    }
}
