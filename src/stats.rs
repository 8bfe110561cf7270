//! Statistics for laid-out windows

use crate::error::Result;
use crate::observer::PhaseTiming;
use crate::window::Window;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Statistics about a window
#[derive(Debug, Clone, Serialize)]
pub struct WindowStats {
    /// Number of layers
    pub layer_count: usize,
    /// Real segment nodes
    pub segment_count: usize,
    /// Synthetic bridge nodes
    pub bridge_count: usize,
    /// Collapsed bubbles
    pub bubble_count: usize,
    /// Segments hidden inside bubbles
    pub collapsed_segments: usize,
    /// Drawn edges between adjacent layers
    pub edge_count: usize,
    /// Real edges with a flow entry
    pub flow_count: usize,
    /// Most nodes in one layer
    pub widest_layer: usize,
    /// Average nodes per layer
    pub average_layer_size: f64,
    /// Horizontal extent from the first to the last layer
    pub extent: f64,
    /// Genomes known to the store
    pub total_genomes: usize,
    /// Genomes present in at least one node of the window
    pub genomes_present: usize,
    pub root_count: usize,
    pub end_count: usize,
    /// Layer size histogram: nodes per layer -> number of layers
    pub layer_size_distribution: BTreeMap<usize, usize>,
    /// Phase timings of the run that built the window, if recorded
    pub timings: Vec<PhaseTiming>,
}

impl WindowStats {
    /// Compute statistics from a window
    pub fn from_window(window: &Window) -> Self {
        let mut segment_count = 0;
        let mut bridge_count = 0;
        let mut bubble_count = 0;
        let mut collapsed_segments = 0;
        let mut edge_count = 0;
        let mut genomes = BTreeSet::new();

        for node in window.nodes.values() {
            if node.is_segment() {
                segment_count += 1;
            } else if node.is_bridge() {
                bridge_count += 1;
            } else {
                bubble_count += 1;
                collapsed_segments += node.source_ids().len();
            }
            edge_count += window.children_in_window(node.id).len();
            genomes.extend(node.genomes.iter().copied());
        }

        let mut layer_size_distribution = BTreeMap::new();
        for layer in &window.layers {
            *layer_size_distribution.entry(layer.len()).or_insert(0) += 1;
        }

        let widest_layer = window.layers.iter().map(|l| l.len()).max().unwrap_or(0);
        let average_layer_size = if window.layers.is_empty() {
            0.0
        } else {
            window.len() as f64 / window.layers.len() as f64
        };
        let extent = match (window.layers.first(), window.layers.last()) {
            (Some(first), Some(last)) => last.right() - first.x,
            _ => 0.0,
        };

        WindowStats {
            layer_count: window.layers.len(),
            segment_count,
            bridge_count,
            bubble_count,
            collapsed_segments,
            edge_count,
            flow_count: window.flows.len(),
            widest_layer,
            average_layer_size,
            extent,
            total_genomes: window.total_genomes,
            genomes_present: genomes.len(),
            root_count: window.roots.len(),
            end_count: window.ends.len(),
            layer_size_distribution,
            timings: Vec::new(),
        }
    }

    /// Attach phase timings
    pub fn with_timings(mut self, timings: Vec<PhaseTiming>) -> Self {
        self.timings = timings;
        self
    }

    /// Format statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut output = String::new();
        output.push_str("=== Window Statistics ===\n\n");

        output.push_str(&format!("Layers:                  {:>12}\n", self.layer_count));
        output.push_str(&format!("Segments:                {:>12}\n", self.segment_count));
        output.push_str(&format!("Bridges:                 {:>12}\n", self.bridge_count));
        output.push_str(&format!(
            "Bubbles:                 {:>12} ({} segments)\n",
            self.bubble_count, self.collapsed_segments
        ));
        output.push_str(&format!("Edges:                   {:>12}\n", self.edge_count));
        output.push_str(&format!("Flows:                   {:>12}\n", self.flow_count));
        output.push('\n');

        output.push_str("--- Shape ---\n");
        output.push_str(&format!("Widest layer:            {:>12}\n", self.widest_layer));
        output.push_str(&format!(
            "Average layer size:      {:>12.2}\n",
            self.average_layer_size
        ));
        output.push_str(&format!("Extent:                  {:>12.1}\n", self.extent));
        output.push_str(&format!("Roots:                   {:>12}\n", self.root_count));
        output.push_str(&format!("Ends:                    {:>12}\n", self.end_count));
        output.push_str(&format!(
            "Genomes:                 {:>12} of {}\n",
            self.genomes_present, self.total_genomes
        ));
        output.push('\n');

        output.push_str("--- Layer Size Distribution ---\n");
        for (size, count) in &self.layer_size_distribution {
            output.push_str(&format!("{:>15}: {:>8}\n", size, count));
        }

        if !self.timings.is_empty() {
            output.push('\n');
            output.push_str("--- Phase Timings ---\n");
            for timing in &self.timings {
                output.push_str(&format!(
                    "{:>15}: {:>10.3} ms {:>8}\n",
                    timing.phase.to_string(),
                    timing.elapsed_ms,
                    timing.count
                ));
            }
        }

        output
    }

    /// Export statistics as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::observer::{Phase, TimingRecorder};
    use crate::pipeline::Pipeline;
    use crate::store::GenomeGraph;

    /// 0 -> {1, 2} -> 3, and 0 -> 3 directly
    fn create_test_window(recorder: &TimingRecorder) -> Window {
        let mut graph = GenomeGraph::new();
        graph.add_node(0, "ACGTACGT", [0, 1, 2]);
        graph.add_node(1, "A", [0]);
        graph.add_node(2, "C", [1]);
        graph.add_node(3, "GGGGGGGG", [0, 1, 2]);
        for (from, to) in [(0, 1), (0, 2), (1, 3), (2, 3), (0, 3)] {
            graph.add_edge(from, to);
        }
        let config = LayoutConfig {
            min_radius: 0,
            ..LayoutConfig::default()
        };
        Pipeline::new(&graph, &config)
            .with_observer(recorder)
            .build_window(0, 3, 1.0)
            .unwrap()
    }

    #[test]
    fn test_basic_stats() {
        let recorder = TimingRecorder::new();
        let window = create_test_window(&recorder);
        let stats = WindowStats::from_window(&window).with_timings(recorder.totals());

        assert_eq!(stats.layer_count, 3);
        assert_eq!(stats.segment_count, 2);
        assert_eq!(stats.bubble_count, 1);
        assert_eq!(stats.collapsed_segments, 2);
        assert_eq!(stats.bridge_count, 1);
        // 0 -> bubble, 0 -> bridge, bubble -> 3, bridge -> 3
        assert_eq!(stats.edge_count, 4);
        assert_eq!(stats.widest_layer, 2);
        assert_eq!(stats.genomes_present, 3);
        assert_eq!(stats.layer_size_distribution.get(&1), Some(&2));
        assert!(stats.timings.iter().any(|t| t.phase == Phase::Place));
    }

    #[test]
    fn test_summary_and_json() {
        let recorder = TimingRecorder::new();
        let window = create_test_window(&recorder);
        let stats = WindowStats::from_window(&window);

        let summary = stats.format_summary();
        assert!(summary.contains("Bubbles:"));
        assert!(!summary.contains("Phase Timings"));

        let json = stats.to_json().unwrap();
        assert!(json.contains("\"bridge_count\": 1"));
    }

    #[test]
    fn test_empty_window() {
        let stats = WindowStats::from_window(&Window::new(1.0, 0));
        assert_eq!(stats.layer_count, 0);
        assert_eq!(stats.extent, 0.0);
        assert_eq!(stats.average_layer_size, 0.0);
    }
}
