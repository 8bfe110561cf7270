//! Progress reporting hooks
//!
//! The layout phases report their timings and result counts to a
//! [`LayoutObserver`]. The default is to report nothing.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// One step of the layout pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Collect,
    Layer,
    Bridge,
    Collapse,
    Reduce,
    Flow,
    Place,
    Merge,
    Prune,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Collect => "collect",
            Phase::Layer => "layer",
            Phase::Bridge => "bridge",
            Phase::Collapse => "collapse",
            Phase::Reduce => "reduce",
            Phase::Flow => "flow",
            Phase::Place => "place",
            Phase::Merge => "merge",
            Phase::Prune => "prune",
        };
        write!(f, "{}", name)
    }
}

/// How a window changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowChange {
    Built,
    ExpandedLeft,
    ExpandedRight,
    PrunedLeft,
    PrunedRight,
}

impl fmt::Display for WindowChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowChange::Built => "built",
            WindowChange::ExpandedLeft => "expanded left",
            WindowChange::ExpandedRight => "expanded right",
            WindowChange::PrunedLeft => "pruned left",
            WindowChange::PrunedRight => "pruned right",
        };
        write!(f, "{}", name)
    }
}

/// Receives phase timings and window changes
pub trait LayoutObserver: Send + Sync {
    fn phase_finished(&self, _phase: Phase, _elapsed: Duration, _count: usize) {}

    fn window_changed(&self, _change: WindowChange, _layers: usize, _nodes: usize) {}
}

/// Ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LayoutObserver for NoopObserver {}

/// Forwards reports to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl LayoutObserver for LogObserver {
    fn phase_finished(&self, phase: Phase, elapsed: Duration, count: usize) {
        log::debug!(
            "{} finished in {:.2} ms ({})",
            phase,
            elapsed.as_secs_f64() * 1000.0,
            count
        );
    }

    fn window_changed(&self, change: WindowChange, layers: usize, nodes: usize) {
        log::info!("Window {}: {} layers, {} nodes", change, layers, nodes);
    }
}

/// A single recorded phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub elapsed_ms: f64,
    pub count: usize,
}

/// Keeps every phase timing for later reporting
#[derive(Debug, Default)]
pub struct TimingRecorder {
    timings: Mutex<Vec<PhaseTiming>>,
}

impl TimingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded timings in the order they arrived
    pub fn timings(&self) -> Vec<PhaseTiming> {
        self.timings
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// Total time spent per phase, in pipeline order
    pub fn totals(&self) -> Vec<PhaseTiming> {
        let mut totals: Vec<PhaseTiming> = Vec::new();
        for timing in self.timings() {
            match totals.iter_mut().find(|t| t.phase == timing.phase) {
                Some(total) => {
                    total.elapsed_ms += timing.elapsed_ms;
                    total.count += timing.count;
                }
                None => totals.push(timing),
            }
        }
        totals
    }
}

impl LayoutObserver for TimingRecorder {
    fn phase_finished(&self, phase: Phase, elapsed: Duration, count: usize) {
        if let Ok(mut timings) = self.timings.lock() {
            timings.push(PhaseTiming {
                phase,
                elapsed_ms: elapsed.as_secs_f64() * 1000.0,
                count,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_totals() {
        let recorder = TimingRecorder::new();
        recorder.phase_finished(Phase::Collect, Duration::from_millis(2), 10);
        recorder.phase_finished(Phase::Layer, Duration::from_millis(1), 4);
        recorder.phase_finished(Phase::Collect, Duration::from_millis(3), 5);

        assert_eq!(recorder.timings().len(), 3);
        let totals = recorder.totals();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].phase, Phase::Collect);
        assert_eq!(totals[0].count, 15);
        assert!((totals[0].elapsed_ms - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Collapse.to_string(), "collapse");
        assert_eq!(WindowChange::ExpandedRight.to_string(), "expanded right");
        let json = serde_json::to_string(&Phase::Reduce).unwrap();
        assert_eq!(json, "\"reduce\"");
    }
}
