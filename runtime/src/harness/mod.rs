//! Scenario harness: run each adversarial configuration in its own browser
//! and collect one report per scenario.
//!
//! Scenarios run strictly one after another. A scenario that cannot launch
//! or navigate becomes an `{ error }` report; action failures are only
//! logged. The browser is closed whatever happened.

pub mod actions;
pub mod capture;
pub mod diagnostics;
pub mod report;
pub mod scenario;

pub use diagnostics::LocalEngine;
pub use report::{HarnessOutput, ScenarioFailure, ScenarioReport, ScenarioResult};
pub use scenario::{builtin_suite, load_scenarios, Action, LaunchConfig, ScenarioConfig, ScenarioError};

use crate::renderer::{RenderContext, Renderer};
use anyhow::{Context, Result};
use botsense::probe::DEFAULT_WINDOW;
use botsense::Engine;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};

#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub target: String,
    pub navigation_timeout_ms: u64,
    /// Activity window used when the local engine scores a page.
    pub activity_window: Duration,
    /// Fall back to scoring the page locally when it publishes nothing.
    pub local_engine: bool,
}

impl HarnessOptions {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            navigation_timeout_ms: 30_000,
            activity_window: DEFAULT_WINDOW,
            local_engine: true,
        }
    }
}

pub struct Harness {
    renderer: Arc<dyn Renderer>,
    engine: Engine,
    options: HarnessOptions,
}

impl Harness {
    pub fn new(renderer: Arc<dyn Renderer>, options: HarnessOptions) -> Self {
        Self {
            renderer,
            engine: Engine::default(),
            options,
        }
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Run every scenario in order and return the collected output.
    pub async fn run(&self, scenarios: &[ScenarioConfig]) -> HarnessOutput {
        let mut output = HarnessOutput::new(&self.options.target);
        info!(target_url = %self.options.target, scenarios = scenarios.len(), "harness starting");

        for scenario in scenarios {
            let report = self.run_scenario(scenario).await;
            output.push(report);
        }

        let failed = output.results.iter().filter(|r| r.result.is_error()).count();
        info!(completed = output.results.len(), failed, "harness finished");
        output
    }

    /// Run one scenario to a report. Never fails.
    pub async fn run_scenario(&self, scenario: &ScenarioConfig) -> ScenarioReport {
        let span = info_span!("scenario", name = %scenario.name);
        async {
            let started = Instant::now();
            let result = match self.execute(scenario).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("scenario failed: {e:#}");
                    ScenarioResult::error(format!("{e:#}"))
                }
            };
            if let Some(snapshot) = result.snapshot() {
                info!(
                    level = %snapshot.summary.level,
                    score = snapshot.summary.score,
                    max = snapshot.summary.max,
                    "scenario finished in {}ms",
                    started.elapsed().as_millis()
                );
            }
            ScenarioReport::new(&scenario.name, result)
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, scenario: &ScenarioConfig) -> Result<ScenarioResult> {
        let options = scenario.launch.to_launch_options(&[capture::RECORDER_SCRIPT])?;
        let mut ctx = self
            .renderer
            .launch(&options)
            .await
            .context("launching browser")?;

        let outcome = self.drive(ctx.as_mut(), scenario).await;
        if let Err(e) = ctx.close().await {
            warn!("closing browser: {e:#}");
        }
        outcome
    }

    async fn drive(&self, ctx: &mut dyn RenderContext, scenario: &ScenarioConfig) -> Result<ScenarioResult> {
        let target = &self.options.target;
        let timeout = self.options.navigation_timeout_ms;
        let nav = ctx.navigate(target, timeout).await.context("navigating to target")?;
        info!("loaded {} in {}ms", nav.final_url, nav.load_time_ms);

        if let Some(action) = &scenario.action {
            if let Err(e) = actions::perform(ctx, action, target, timeout).await {
                warn!("action failed, continuing: {e:#}");
            }
        }

        if scenario.settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(scenario.settle_ms)).await;
        }

        let local = self.options.local_engine.then(|| LocalEngine {
            engine: self.engine.clone(),
            window: self.options.activity_window,
        });
        Ok(diagnostics::extract(ctx, local.as_ref()).await)
    }
}
