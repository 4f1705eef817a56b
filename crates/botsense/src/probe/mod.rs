//! Activity probe: a fixed-duration passive observer over interaction events.
//!
//! The probe walks `Idle → Listening → Aggregating → Done`. While listening
//! it holds a [`ListenerGuard`]; the guard is dropped on the way out of
//! `Listening` whichever way the window ends (timer, external cancellation,
//! or an early return), so no listener outlives its window.

pub mod events;
pub mod stats;

pub use events::{EventBus, EventKind, EventSource, InteractionEvent, ListenerGuard, Subscription};
pub use stats::{ActivityAggregator, ActivityCounters, ActivityStats};

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::signal::Signal;

/// Default observation window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(6000);

/// Lifecycle of one probe invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Idle,
    Listening,
    Aggregating,
    Done,
}

/// Output of one closed window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub window_ms: u64,
    pub stats: ActivityStats,
    pub signals: Vec<Signal>,
}

impl ActivityReport {
    fn from_stats(window: Duration, stats: ActivityStats) -> Self {
        let signals = stats.signals();
        Self {
            window_ms: window.as_millis() as u64,
            stats,
            signals,
        }
    }
}

/// One-shot observer. Create a fresh probe for each window.
#[derive(Debug)]
pub struct ActivityProbe {
    window: Duration,
    state: ProbeState,
}

impl Default for ActivityProbe {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl ActivityProbe {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: ProbeState::Idle,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    fn transition(&mut self, next: ProbeState) {
        debug!(from = ?self.state, to = ?next, "activity probe transition");
        self.state = next;
    }

    /// Listen for the full window.
    pub async fn observe<S>(&mut self, source: &S) -> Result<ActivityReport>
    where
        S: EventSource + ?Sized,
    {
        self.observe_until(source, std::future::pending::<()>()).await
    }

    /// Listen until the window closes or `cancel` resolves, whichever comes
    /// first. The listener is removed in both cases; a cancelled window
    /// yields [`EngineError::ProbeCancelled`].
    pub async fn observe_until<S, F>(&mut self, source: &S, cancel: F) -> Result<ActivityReport>
    where
        S: EventSource + ?Sized,
        F: Future<Output = ()>,
    {
        if self.state != ProbeState::Idle {
            return Err(EngineError::ProbeReused);
        }

        let (aggregator, cancelled) = {
            let Subscription { guard, mut events } = source.subscribe();
            self.transition(ProbeState::Listening);

            let mut aggregator = ActivityAggregator::new();
            let deadline = tokio::time::sleep(self.window);
            tokio::pin!(deadline);
            tokio::pin!(cancel);
            let mut open = true;

            let cancelled = loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel => break true,
                    _ = &mut deadline => break false,
                    ev = events.recv(), if open => match ev {
                        Some(ev) => aggregator.record(&ev),
                        None => open = false,
                    },
                }
            };

            drop(guard);
            // Events dispatched before teardown still belong to the window.
            while let Ok(ev) = events.try_recv() {
                aggregator.record(&ev);
            }
            (aggregator, cancelled)
        };

        self.transition(ProbeState::Aggregating);
        if cancelled {
            self.transition(ProbeState::Done);
            return Err(EngineError::ProbeCancelled);
        }

        let report = ActivityReport::from_stats(self.window, aggregator.finish());
        self.transition(ProbeState::Done);
        Ok(report)
    }

    /// Aggregate a recorded event log as if it had been observed live.
    ///
    /// Timestamps are relative to the start of the window; events after the
    /// window are ignored.
    pub fn replay(window: Duration, events: &[InteractionEvent]) -> ActivityReport {
        let limit = window.as_secs_f64() * 1000.0;
        let stats = ActivityStats::from_events(events.iter().filter(|e| e.t_ms <= limit));
        ActivityReport::from_stats(window, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal<'a>(report: &'a ActivityReport, id: &str) -> &'a Signal {
        report.signals.iter().find(|s| s.id == id).unwrap()
    }

    async fn wait_for_listener(bus: &EventBus) {
        while bus.listener_count() == 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_window_closes_and_removes_listener() {
        let bus = EventBus::new();
        let mut probe = ActivityProbe::new(Duration::from_millis(30));
        let report = probe.observe(&bus).await.unwrap();

        assert_eq!(probe.state(), ProbeState::Done);
        assert_eq!(bus.listener_count(), 0);
        assert!(signal(&report, "activity_no_input").suspicious);
        assert!(!signal(&report, "activity_too_regular").suspicious);
    }

    #[tokio::test]
    async fn test_cancellation_still_tears_down() {
        let bus = EventBus::new();
        let mut probe = ActivityProbe::new(Duration::from_secs(60));
        let result = probe.observe_until(&bus, async {}).await;

        assert!(matches!(result, Err(EngineError::ProbeCancelled)));
        assert_eq!(probe.state(), ProbeState::Done);
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_repeated_invocations_do_not_leak() {
        let bus = EventBus::new();
        for _ in 0..3 {
            let mut probe = ActivityProbe::new(Duration::from_millis(5));
            probe.observe(&bus).await.unwrap();
        }
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_probe_is_single_use() {
        let bus = EventBus::new();
        let mut probe = ActivityProbe::new(Duration::from_millis(5));
        probe.observe(&bus).await.unwrap();
        assert!(matches!(
            probe.observe(&bus).await,
            Err(EngineError::ProbeReused)
        ));
    }

    #[tokio::test]
    async fn test_live_regular_events_flagged() {
        let bus = EventBus::new();
        let mut probe = ActivityProbe::new(Duration::from_millis(200));

        let dispatcher = async {
            wait_for_listener(&bus).await;
            for i in 0..8 {
                bus.dispatch(InteractionEvent::new(EventKind::Click, i as f64 * 20.0));
            }
        };

        let (report, _) = tokio::join!(probe.observe(&bus), dispatcher);
        let report = report.unwrap();

        assert_eq!(report.stats.counters.clicks, 8);
        assert!(signal(&report, "activity_too_regular").suspicious);
        assert!(!signal(&report, "activity_no_input").suspicious);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_replay_zero_events_over_full_window() {
        let report = ActivityProbe::replay(Duration::from_millis(5000), &[]);
        assert_eq!(report.window_ms, 5000);
        assert!(signal(&report, "activity_no_input").suspicious);
        assert!(!signal(&report, "activity_too_regular").suspicious);
    }

    #[test]
    fn test_replay_ignores_events_after_window() {
        let events = vec![
            InteractionEvent::new(EventKind::Click, 100.0),
            InteractionEvent::new(EventKind::Click, 400.0),
            InteractionEvent::new(EventKind::Click, 9000.0),
        ];
        let report = ActivityProbe::replay(Duration::from_millis(5000), &events);
        assert_eq!(report.stats.counters.clicks, 2);
    }
}
