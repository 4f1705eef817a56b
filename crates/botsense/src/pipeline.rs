//! Detection pipeline: static pass plus activity window, merged and scored.

use std::future::Future;
use tracing::{info, warn};

use crate::detectors::DetectorRegistry;
use crate::error::Result;
use crate::probe::{ActivityProbe, ActivityReport, EventSource};
use crate::signal::{validate_signals, DiagnosticSnapshot, Signal};
use crate::snapshot::SensorSnapshot;
use crate::summary::{summarize_with, LevelPolicy};

/// A configured detection engine.
#[derive(Clone, Default)]
pub struct Engine {
    registry: DetectorRegistry,
    policy: LevelPolicy,
}

impl Engine {
    pub fn new(registry: DetectorRegistry, policy: LevelPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn with_policy(mut self, policy: LevelPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LevelPolicy {
        self.policy
    }

    /// Static detectors only.
    pub fn static_signals(&self, snapshot: &SensorSnapshot) -> Vec<Signal> {
        self.registry.run(snapshot)
    }

    /// Merge static signals with an optional activity window and summarize.
    pub fn evaluate(&self, snapshot: &SensorSnapshot, activity: Option<&ActivityReport>) -> DiagnosticSnapshot {
        let mut signals = self.static_signals(snapshot);
        if let Some(report) = activity {
            signals.extend(report.signals.iter().cloned());
        }
        self.finish(signals)
    }

    /// Score an already-assembled signal collection.
    pub fn finish(&self, signals: Vec<Signal>) -> DiagnosticSnapshot {
        if let Err(e) = validate_signals(&signals) {
            warn!("signal collection failed validation: {e}");
        }
        let summary = summarize_with(&signals, self.policy);
        info!(
            score = summary.score,
            max = summary.max,
            level = %summary.level,
            "detection pass summarized"
        );
        DiagnosticSnapshot { summary, signals }
    }

    /// Run the static pass and a live activity window against `source`.
    pub async fn run<S>(&self, snapshot: &SensorSnapshot, source: &S, probe: ActivityProbe) -> Result<DiagnosticSnapshot>
    where
        S: EventSource + ?Sized,
    {
        self.run_until(snapshot, source, probe, std::future::pending::<()>()).await
    }

    /// Like [`Engine::run`], abandoning the window when `cancel` resolves.
    pub async fn run_until<S, F>(
        &self,
        snapshot: &SensorSnapshot,
        source: &S,
        mut probe: ActivityProbe,
        cancel: F,
    ) -> Result<DiagnosticSnapshot>
    where
        S: EventSource + ?Sized,
        F: Future<Output = ()>,
    {
        // The static pass is synchronous and finishes before the window opens.
        let static_signals = self.static_signals(snapshot);
        let report = probe.observe_until(source, cancel).await?;

        let mut signals = static_signals;
        signals.extend(report.signals);
        Ok(self.finish(signals))
    }
}

/// Evaluate with the standard registry and canonical policy.
pub fn evaluate(snapshot: &SensorSnapshot, activity: Option<&ActivityReport>) -> DiagnosticSnapshot {
    Engine::default().evaluate(snapshot, activity)
}
