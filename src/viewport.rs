//! Viewport management
//!
//! A [`Viewport`] owns the window shown on screen. As the visible range
//! scrolls it grows the window by collecting more nodes beyond a boundary,
//! and it prunes layers that have drifted far out of view.
//!
//! Expansions are built on a copy of the window. The shown window is only
//! replaced once the copy is complete, so a failed or cancelled expansion
//! leaves it as it was.

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::merge::{drop_backward_nodes, merge_left, merge_right, prune, Side};
use crate::observer::{LayoutObserver, NoopObserver, Phase, WindowChange};
use crate::pipeline::{CancelToken, Pipeline};
use crate::store::{GraphStore, NodeId};
use crate::window::{ExpansionRecord, Window};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// A window grown by one expansion
#[derive(Debug, Clone)]
pub struct Expanded {
    pub window: Window,
    /// Nodes merged in from beyond the boundary
    pub merged: usize,
}

/// Grow a copy of `window` beyond one of its boundaries.
///
/// Returns `None` when that boundary is empty. `window` itself is never
/// touched, so an error leaves the caller with its last complete window.
pub fn expand_window<S: GraphStore + ?Sized>(
    pipeline: &Pipeline<'_, S>,
    window: &Window,
    side: Side,
    radius: usize,
) -> Result<Option<Expanded>> {
    let seeds: BTreeSet<NodeId> = match side {
        Side::Left => window.roots.clone(),
        Side::Right => window.ends.clone(),
    };
    if seeds.is_empty() {
        return Ok(None);
    }
    log::info!("Expanding {:?} with radius {}", side, radius);

    let mut scratch = window.clone();
    let opposite = match side {
        Side::Left => &mut scratch.ends,
        Side::Right => &mut scratch.roots,
    };
    let unseated: BTreeSet<NodeId> = opposite.intersection(&seeds).copied().collect();
    opposite.retain(|id| !seeds.contains(id));

    let seed_list: Vec<NodeId> = seeds.iter().copied().collect();
    let excluded: HashSet<NodeId> = scratch.nodes.keys().copied().collect();
    let mut hood = pipeline.collect(&seed_list, &excluded, radius, scratch.zoom)?;
    drop_backward_nodes(&mut hood, &scratch, side);

    if hood.is_empty() {
        match side {
            Side::Left => scratch.roots = hood.roots,
            Side::Right => scratch.ends = hood.ends,
        }
        pipeline.checkpoint()?;
        return Ok(Some(Expanded {
            window: scratch,
            merged: 0,
        }));
    }

    let fragment = pipeline.layout_fragment(hood, &scratch)?;
    let added = fragment.real_ids();
    let config = pipeline.config();
    let merged = pipeline.step(Phase::Merge, |n| *n, || match side {
        Side::Left => merge_left(&mut scratch, fragment, config),
        Side::Right => merge_right(&mut scratch, fragment, config),
    })?;
    scratch.expansions.push(ExpansionRecord {
        side,
        seeds,
        unseated,
        added,
    });
    pipeline.checkpoint()?;

    let change = match side {
        Side::Left => WindowChange::ExpandedLeft,
        Side::Right => WindowChange::ExpandedRight,
    };
    pipeline
        .observer()
        .window_changed(change, scratch.layers.len(), scratch.len());
    Ok(Some(Expanded {
        window: scratch,
        merged,
    }))
}

/// Loading state of a viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportState {
    /// Fully materialized, nothing pending
    Stable,
    /// Collecting and merging nodes beyond a boundary
    Expanding,
}

/// A window plus the machinery to grow and shrink it
pub struct Viewport<S: GraphStore> {
    store: Arc<S>,
    config: LayoutConfig,
    observer: Arc<dyn LayoutObserver>,
    window: Window,
    state: ViewportState,
    center: NodeId,
    cancel: CancelToken,
}

impl<S: GraphStore> Viewport<S> {
    /// Build a window of `radius` around `center`
    pub fn open(store: Arc<S>, config: LayoutConfig, center: NodeId, radius: usize) -> Result<Self> {
        Self::open_with_observer(store, config, Arc::new(NoopObserver), center, radius)
    }

    pub fn open_with_observer(
        store: Arc<S>,
        config: LayoutConfig,
        observer: Arc<dyn LayoutObserver>,
        center: NodeId,
        radius: usize,
    ) -> Result<Self> {
        let window = Pipeline::new(store.as_ref(), &config)
            .with_observer(observer.as_ref())
            .build_window(center, radius, config.zoom)?;
        Ok(Self::from_window(store, config, observer, window, center))
    }

    /// Adopt a window that was built elsewhere, e.g. by a background worker
    pub fn from_window(
        store: Arc<S>,
        config: LayoutConfig,
        observer: Arc<dyn LayoutObserver>,
        window: Window,
        center: NodeId,
    ) -> Self {
        Self {
            store,
            config,
            observer,
            window,
            state: ViewportState::Stable,
            center,
            cancel: CancelToken::new(),
        }
    }

    /// Check `cancel` between the phases of every expansion
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn set_cancel(&mut self, cancel: CancelToken) {
        self.cancel = cancel;
    }

    /// Replace the window with one expanded elsewhere, e.g. by a background worker
    pub fn adopt(&mut self, window: Window) {
        self.window = window;
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn into_window(self) -> Window {
        self.window
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn center(&self) -> NodeId {
        self.center
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn set_state(&mut self, state: ViewportState) {
        if self.state != state {
            log::debug!("Viewport {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Grow or prune the window for the visible range `left..right`.
    ///
    /// A side is expanded when fewer than `border_buffer` layers lie beyond
    /// it. Afterward, a side with more than `prune_factor * border_buffer`
    /// layers out of view loses `border_buffer` of them. Returns whether
    /// any nodes were loaded.
    pub fn check_dynamic_load(&mut self, left: f64, right: f64) -> Result<bool> {
        let buffer = self.config.border_buffer;

        self.set_state(ViewportState::Expanding);
        let outcome = self.load_boundaries(left, right);
        self.set_state(ViewportState::Stable);
        let loaded = outcome?;

        let layers = &self.window.layers;
        let out_left = layers.iter().take_while(|l| l.x < left).count();
        let out_right = layers
            .iter()
            .position(|l| l.x > right)
            .map_or(0, |i| layers.len() - i);

        let limit = self.config.prune_factor * buffer;
        if out_left > limit {
            self.prune_left(buffer);
        }
        if out_right > limit {
            self.prune_right(buffer);
        }
        Ok(loaded)
    }

    fn load_boundaries(&mut self, left: f64, right: f64) -> Result<bool> {
        let buffer = self.config.border_buffer;
        let radius = self.config.dynamic_radius;
        let mut loaded = false;

        let layers = &self.window.layers;
        if layers.len() <= buffer || layers[buffer].x > left {
            loaded |= self.expand_roots(radius)?;
        }
        let layers = &self.window.layers;
        if layers.len() <= buffer || layers[layers.len() - buffer - 1].x < right {
            loaded |= self.expand_ends(radius)?;
        }
        Ok(loaded)
    }

    /// Load nodes beyond the roots. Returns false when there are no roots
    /// or nothing new was found.
    pub fn expand_roots(&mut self, radius: usize) -> Result<bool> {
        self.expand(Side::Left, radius)
    }

    /// Load nodes beyond the ends. Returns false when there are no ends
    /// or nothing new was found.
    pub fn expand_ends(&mut self, radius: usize) -> Result<bool> {
        self.expand(Side::Right, radius)
    }

    fn expand(&mut self, side: Side, radius: usize) -> Result<bool> {
        let pipeline = Pipeline::new(self.store.as_ref(), &self.config)
            .with_observer(self.observer.as_ref())
            .with_cancel(self.cancel.clone());
        match expand_window(&pipeline, &self.window, side, radius)? {
            Some(expanded) => {
                self.window = expanded.window;
                Ok(expanded.merged > 0)
            }
            None => Ok(false),
        }
    }

    /// Drop `count` layers from the left
    pub fn prune_left(&mut self, count: usize) -> usize {
        self.prune_side(Side::Left, count)
    }

    /// Drop `count` layers from the right
    pub fn prune_right(&mut self, count: usize) -> usize {
        self.prune_side(Side::Right, count)
    }

    fn prune_side(&mut self, side: Side, count: usize) -> usize {
        let start = std::time::Instant::now();
        let removed = prune(&mut self.window, side, count);
        self.observer
            .phase_finished(Phase::Prune, start.elapsed(), removed);

        let change = match side {
            Side::Left => WindowChange::PrunedLeft,
            Side::Right => WindowChange::PrunedRight,
        };
        self.observer
            .window_changed(change, self.window.layers.len(), self.window.len());
        removed
    }

    /// Pan the window
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.window.translate(dx, dy);
    }

    /// Rescale the window by `1 / scale`
    pub fn zoom(&mut self, scale: f64) {
        self.window.zoom(scale);
    }

    /// Re-center on a segment near canvas x and return its id
    pub fn update_center(&mut self, x: f64) -> NodeId {
        self.center = self.window.center_node(x, self.center);
        self.center
    }
}
