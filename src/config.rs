//! Layout configuration

use crate::error::{LayoutError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable constants of the layout engine.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Radius of the initial neighborhood around the center node
    pub radius: usize,
    /// Lower bound applied to the initial radius
    pub min_radius: usize,
    /// Radius used for each incremental expansion
    pub dynamic_radius: usize,
    /// Number of layers kept as a buffer beyond the visible range
    pub border_buffer: usize,
    /// Layers beyond `prune_factor * border_buffer` outside the view are pruned
    pub prune_factor: usize,
    /// Horizontal padding between layers
    pub layer_padding: f64,
    /// Extra horizontal padding per node of size difference between layers
    pub diff_layer_padding: f64,
    /// Vertical padding between nodes of a layer
    pub node_vertical_padding: f64,
    /// y coordinate of the first node of each layer
    pub start_y: f64,
    /// Initial zoom factor
    pub zoom: f64,
    /// Height of every node
    pub node_height: f64,
    /// Smallest width of a segment node
    pub min_segment_width: f64,
    /// Largest width of a segment node
    pub max_segment_width: f64,
    /// Fixed width of a collapsed bubble
    pub bubble_width: f64,
    /// Outline stroke of a segment node
    pub segment_stroke: f64,
    /// Outline stroke of a bubble node
    pub bubble_stroke: f64,
    /// Stroke width of an edge carrying no genomes
    pub min_edge_stroke: f64,
    /// Stroke width of an edge carrying every genome
    pub max_edge_stroke: f64,
    /// Collapse SNP bubbles into single nodes
    pub collapse_bubbles: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius: 50,
            min_radius: 50,
            dynamic_radius: 50,
            border_buffer: 40,
            prune_factor: 3,
            layer_padding: 20.0,
            diff_layer_padding: 7.0,
            node_vertical_padding: 5.0,
            start_y: 50.0,
            zoom: 1.0,
            node_height: 10.0,
            min_segment_width: 10.0,
            max_segment_width: 100.0,
            bubble_width: 11.0,
            segment_stroke: 3.0,
            bubble_stroke: 3.5,
            min_edge_stroke: 1.0,
            max_edge_stroke: 6.5,
            collapse_bubbles: true,
        }
    }
}

impl LayoutConfig {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LayoutError::FileNotFound(path.display().to_string()));
        }

        let text = std::fs::read_to_string(path)?;
        let config: LayoutConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.zoom.is_nan() || self.zoom <= 0.0 {
            return Err(LayoutError::InvalidInput(format!(
                "zoom must be positive, got {}",
                self.zoom
            )));
        }
        if self.border_buffer == 0 {
            return Err(LayoutError::InvalidInput(
                "border_buffer must be at least 1".to_string(),
            ));
        }
        if self.min_segment_width > self.max_segment_width {
            return Err(LayoutError::InvalidInput(format!(
                "min_segment_width {} exceeds max_segment_width {}",
                self.min_segment_width, self.max_segment_width
            )));
        }
        Ok(())
    }

    /// Radius actually used for a fresh window
    pub fn effective_radius(&self, requested: usize) -> usize {
        requested.max(self.min_radius)
    }
}
