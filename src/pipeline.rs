//! The layout pipeline
//!
//! collect -> layer -> bridge -> collapse -> flow -> reduce -> place
//!
//! Every phase is timed and reported to the observer, and the cancel token
//! is checked before each phase starts. A cancelled run returns
//! [`LayoutError::Cancelled`] and never hands out a partial window.

use crate::bridge::insert_all_bridges;
use crate::bubble::collapse_bubbles;
use crate::collect::{collect, Neighborhood};
use crate::config::LayoutConfig;
use crate::coords::place;
use crate::crossing::sort_layers;
use crate::error::{LayoutError, Result};
use crate::flow::compute_flows;
use crate::observer::{LayoutObserver, NoopObserver, Phase, WindowChange};
use crate::store::{GraphStore, NodeId};
use crate::topo::assign_layers;
use crate::window::Window;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

static NOOP: NoopObserver = NoopObserver;

/// Shared flag asking a running layout to stop
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with `Cancelled` once the token has been triggered
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(LayoutError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Runs layout phases against one graph store
pub struct Pipeline<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    config: &'a LayoutConfig,
    observer: &'a dyn LayoutObserver,
    cancel: CancelToken,
}

impl<'a, S: GraphStore + ?Sized> Pipeline<'a, S> {
    pub fn new(store: &'a S, config: &'a LayoutConfig) -> Self {
        Self {
            store,
            config,
            observer: &NOOP,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn LayoutObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        self.config
    }

    pub fn observer(&self) -> &dyn LayoutObserver {
        self.observer
    }

    /// Fail with `Cancelled` if the run was asked to stop
    pub(crate) fn checkpoint(&self) -> Result<()> {
        self.cancel.check()
    }

    /// Run one phase: check for cancellation, time it and report its count
    pub(crate) fn step<T, C, F>(&self, phase: Phase, count: C, run: F) -> Result<T>
    where
        C: FnOnce(&T) -> usize,
        F: FnOnce() -> Result<T>,
    {
        self.cancel.check()?;
        let start = Instant::now();
        let value = run()?;
        self.observer
            .phase_finished(phase, start.elapsed(), count(&value));
        Ok(value)
    }

    /// Collect a neighborhood around `seeds`
    pub fn collect(
        &self,
        seeds: &[NodeId],
        excluded: &HashSet<NodeId>,
        radius: usize,
        zoom: f64,
    ) -> Result<Neighborhood> {
        self.step(Phase::Collect, Neighborhood::len, || {
            Ok(collect(self.store, seeds, excluded, radius, zoom, self.config))
        })
    }

    /// Layer, bridge, collapse and compute flows for a collected neighborhood.
    ///
    /// The result continues the synthetic ids of `base` so it can be merged
    /// into it. It is neither sorted nor placed.
    pub fn layout_fragment(&self, hood: Neighborhood, base: &Window) -> Result<Window> {
        let mut window = base.continuing();
        window.absorb_neighborhood(hood);

        self.step(Phase::Layer, |n| *n, || assign_layers(&mut window))?;
        self.step(Phase::Bridge, |n| *n, || insert_all_bridges(&mut window))?;
        if self.config.collapse_bubbles {
            self.step(Phase::Collapse, |n| *n, || {
                collapse_bubbles(&mut window, self.config)
            })?;
        }
        self.step(Phase::Flow, |n| *n, || Ok(compute_flows(&mut window)))?;
        Ok(window)
    }

    /// Build a complete window around `center`.
    ///
    /// The radius is raised to the configured minimum.
    pub fn build_window(&self, center: NodeId, radius: usize, zoom: f64) -> Result<Window> {
        if !self.store.contains(center) {
            return Err(LayoutError::UnknownNode(center));
        }

        let radius = self.config.effective_radius(radius);
        let hood = self.collect(&[center], &HashSet::new(), radius, zoom)?;
        let base = Window::new(zoom, self.store.total_genome_count());
        let mut window = self.layout_fragment(hood, &base)?;

        self.step(Phase::Reduce, |n| *n, || {
            Ok(sort_layers(&mut window).map_or(0, |_| window.layers.len()))
        })?;
        self.step(Phase::Place, |n| *n, || Ok(place(&mut window, self.config)))?;
        self.cancel.check()?;

        self.observer
            .window_changed(WindowChange::Built, window.layers.len(), window.len());
        Ok(window)
    }
}
