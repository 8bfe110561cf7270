//! Background layout
//!
//! A [`LayoutWorker`] builds and expands windows on worker threads so the
//! caller stays responsive. Every submission gets a new generation and
//! cancels the one before it, so only the newest result is ever handed back.

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::merge::Side;
use crate::observer::{LayoutObserver, NoopObserver};
use crate::pipeline::{CancelToken, Pipeline};
use crate::store::{GraphStore, NodeId};
use crate::viewport::expand_window;
use crate::window::Window;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// What a submission asked for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutRequest {
    /// A fresh window around `center`
    Build { center: NodeId, radius: usize, zoom: f64 },
    /// One more expansion beyond a boundary of a given window
    Expand { side: Side, radius: usize },
}

/// A finished background job
#[derive(Debug)]
pub struct LayoutResult {
    pub generation: u64,
    pub request: LayoutRequest,
    /// The new window. An expansion with nothing to load hands back its
    /// input unchanged.
    pub window: Result<Window>,
}

/// Builds windows off the calling thread
pub struct LayoutWorker<S: GraphStore + Send + Sync + 'static> {
    store: Arc<S>,
    config: Arc<LayoutConfig>,
    observer: Arc<dyn LayoutObserver>,
    generation: u64,
    cancel: CancelToken,
    sender: Sender<LayoutResult>,
    receiver: Receiver<LayoutResult>,
    handles: Vec<JoinHandle<()>>,
}

impl<S: GraphStore + Send + Sync + 'static> LayoutWorker<S> {
    pub fn new(store: Arc<S>, config: LayoutConfig) -> Self {
        Self::with_observer(store, config, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        store: Arc<S>,
        config: LayoutConfig,
        observer: Arc<dyn LayoutObserver>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            store,
            config: Arc::new(config),
            observer,
            generation: 0,
            cancel: CancelToken::new(),
            sender,
            receiver,
            handles: Vec::new(),
        }
    }

    /// Generation of the latest submission
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start building a window around `center`, cancelling any job still
    /// running. Returns the generation of the new build.
    pub fn submit(&mut self, center: NodeId, radius: usize, zoom: f64) -> u64 {
        let request = LayoutRequest::Build {
            center,
            radius,
            zoom,
        };
        self.spawn(request, move |pipeline| {
            pipeline.build_window(center, radius, zoom)
        })
    }

    /// Start expanding a copy of `window` beyond `side`, cancelling any job
    /// still running. Returns the generation of the expansion.
    pub fn submit_expansion(&mut self, window: Window, side: Side, radius: usize) -> u64 {
        let request = LayoutRequest::Expand { side, radius };
        self.spawn(request, move |pipeline| {
            Ok(expand_window(pipeline, &window, side, radius)?.map_or(window, |e| e.window))
        })
    }

    fn spawn<F>(&mut self, request: LayoutRequest, job: F) -> u64
    where
        F: FnOnce(&Pipeline<'_, S>) -> Result<Window> + Send + 'static,
    {
        self.cancel.cancel();
        self.cancel = CancelToken::new();
        self.generation += 1;
        self.handles.retain(|h| !h.is_finished());

        let generation = self.generation;
        let store = Arc::clone(&self.store);
        let config = Arc::clone(&self.config);
        let observer = Arc::clone(&self.observer);
        let cancel = self.cancel.clone();
        let sender = self.sender.clone();

        log::debug!("Submitting layout {}: {:?}", generation, request);
        let handle = thread::spawn(move || {
            let pipeline = Pipeline::new(store.as_ref(), config.as_ref())
                .with_observer(observer.as_ref())
                .with_cancel(cancel);
            let window = job(&pipeline);
            // the receiver only goes away with the worker itself
            let _ = sender.send(LayoutResult {
                generation,
                request,
                window,
            });
        });
        self.handles.push(handle);
        generation
    }

    /// Cancel the running job, if any
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Take the newest finished result without blocking. Results of older
    /// generations are discarded.
    pub fn poll(&mut self) -> Option<LayoutResult> {
        let mut latest = None;
        while let Ok(result) = self.receiver.try_recv() {
            if let Some(result) = self.accept(result) {
                latest = Some(result);
            }
        }
        latest
    }

    /// Block until the current generation finishes or `timeout` elapses
    pub fn wait(&mut self, timeout: Duration) -> Option<LayoutResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(result) => {
                    if let Some(result) = self.accept(result) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None;
                }
            }
        }
    }

    fn accept(&self, result: LayoutResult) -> Option<LayoutResult> {
        if result.generation == self.generation {
            return Some(result);
        }
        match &result.window {
            Err(LayoutError::Cancelled) => {
                log::debug!("Layout {} was cancelled", result.generation)
            }
            _ => log::debug!(
                "Dropping stale layout {} (current {})",
                result.generation,
                self.generation
            ),
        }
        None
    }
}

impl<S: GraphStore + Send + Sync + 'static> Drop for LayoutWorker<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::warn!("Layout thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GenomeGraph;

    fn chain(len: i64) -> Arc<GenomeGraph> {
        let mut graph = GenomeGraph::new();
        for id in 0..len {
            graph.add_node(id, "ACGT", [0]);
        }
        for id in 1..len {
            graph.add_edge(id - 1, id);
        }
        Arc::new(graph)
    }

    fn config() -> LayoutConfig {
        LayoutConfig {
            min_radius: 0,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn test_background_build() {
        let mut worker = LayoutWorker::new(chain(30), config());
        let generation = worker.submit(15, 3, 1.0);
        assert_eq!(generation, 1);

        let result = worker.wait(Duration::from_secs(10)).unwrap();
        assert_eq!(result.generation, 1);
        assert!(matches!(result.request, LayoutRequest::Build { center: 15, .. }));
        let window = result.window.unwrap();
        assert_eq!(window.layers.len(), 7);
    }

    #[test]
    fn test_only_latest_generation_is_returned() {
        let mut worker = LayoutWorker::new(chain(200), config());
        worker.submit(10, 5, 1.0);
        worker.submit(100, 5, 1.0);
        let last = worker.submit(150, 2, 1.0);

        let result = worker.wait(Duration::from_secs(10)).unwrap();
        assert_eq!(result.generation, last);
        assert!(matches!(result.request, LayoutRequest::Build { center: 150, .. }));
        assert!(result.window.is_ok());
        assert!(worker.poll().is_none());
    }

    #[test]
    fn test_unknown_center_is_reported() {
        let mut worker = LayoutWorker::new(chain(5), config());
        worker.submit(99, 2, 1.0);

        let result = worker.wait(Duration::from_secs(10)).unwrap();
        assert!(matches!(result.window, Err(LayoutError::UnknownNode(99))));
    }

    #[test]
    fn test_background_expansion() {
        let graph = chain(60);
        let config = config();
        let window = Pipeline::new(graph.as_ref(), &config)
            .build_window(30, 3, 1.0)
            .unwrap();
        let layers = window.layers.len();
        let nodes = window.len();

        let mut worker = LayoutWorker::new(Arc::clone(&graph), config.clone());
        let generation = worker.submit_expansion(window.clone(), Side::Right, 4);
        let result = worker.wait(Duration::from_secs(10)).unwrap();
        assert_eq!(result.generation, generation);
        assert_eq!(
            result.request,
            LayoutRequest::Expand {
                side: Side::Right,
                radius: 4
            }
        );
        let expanded = result.window.unwrap();
        assert_eq!(expanded.layers.len(), layers + 4);
        assert_eq!(expanded.ends, [37].into_iter().collect());
        assert_eq!(expanded.expansions.len(), 1);
        assert!(expanded.layering_violation().is_none());

        // a window with no ends comes back as it was
        let mut closed = window;
        closed.ends.clear();
        worker.submit_expansion(closed, Side::Right, 4);
        let result = worker.wait(Duration::from_secs(10)).unwrap();
        let unchanged = result.window.unwrap();
        assert_eq!(unchanged.len(), nodes);
        assert!(unchanged.expansions.is_empty());
    }

    #[test]
    fn test_poll_without_submission() {
        let mut worker = LayoutWorker::new(chain(5), config());
        assert!(worker.poll().is_none());
        assert_eq!(worker.generation(), 0);
    }
}
