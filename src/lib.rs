//! pglayout - windowed layered layout for pangenome graphs
//!
//! Draws a bounded window of a genome variation graph as a layered
//! left-to-right diagram, and grows or shrinks that window as the visible
//! range scrolls.
//!
//! # Features
//!
//! - Collect a radius-bounded neighborhood around a center node
//! - Layer it topologically, bridging edges that skip layers
//! - Collapse SNP bubbles into single nodes
//! - Reduce crossings with barycenter sweeps and assign coordinates
//! - Split genome flow over edges for stroke widths
//! - Merge newly collected fragments at either side and prune far layers
//! - Trace genomes through the window by node and edge
//! - Hit-test canvas points, export render views and snapshots
//!
//! # Example
//!
//! ```no_run
//! use pglayout::config::LayoutConfig;
//! use pglayout::gfa::GfaGraph;
//! use pglayout::viewport::Viewport;
//! use std::sync::Arc;
//!
//! let gfa = GfaGraph::from_file("example.gfa").unwrap();
//! let center = gfa.lookup("s1").unwrap();
//!
//! let config = LayoutConfig::default();
//! let radius = config.radius;
//! let mut viewport = Viewport::open(Arc::new(gfa.graph), config, center, radius).unwrap();
//!
//! // scroll to a new visible range
//! viewport.check_dynamic_load(500.0, 1500.0).unwrap();
//! println!("{} layers", viewport.window().layers.len());
//! ```

pub mod bridge;
pub mod bubble;
pub mod cli;
pub mod collect;
pub mod config;
pub mod coords;
pub mod crossing;
pub mod error;
pub mod export;
pub mod flow;
pub mod gfa;
pub mod hit;
pub mod layer;
pub mod merge;
pub mod node;
pub mod observer;
pub mod pipeline;
pub mod stats;
pub mod store;
pub mod topo;
pub mod viewport;
pub mod window;
pub mod worker;

pub use config::LayoutConfig;
pub use error::{LayoutError, Result};
pub use export::WindowSnapshot;
pub use gfa::GfaGraph;
pub use hit::Hit;
pub use merge::Side;
pub use node::{DrawableNode, NodeKind};
pub use observer::{LayoutObserver, LogObserver, NoopObserver, Phase, TimingRecorder};
pub use pipeline::{CancelToken, Pipeline};
pub use stats::WindowStats;
pub use store::{GenomeGraph, GraphStore, NodeId};
pub use viewport::{expand_window, Expanded, Viewport, ViewportState};
pub use window::{ExpansionRecord, Window};
pub use worker::{LayoutRequest, LayoutResult, LayoutWorker};
