//! Diagnostics extraction with an ordered fallback chain.
//!
//! 1. a result the page published on `window.__botDetection`
//! 2. pre-rendered JSON text (`#bot-diagnostics`, `pre#json`, `pre`)
//! 3. the local engine over a captured snapshot and the recorded events
//! 4. the empty shape, or an error when every read failed on the channel
//!
//! Extraction never fails; problems end up in the returned result.

use super::capture::{capture_events, capture_snapshot};
use super::report::ScenarioResult;
use crate::renderer::RenderContext;
use botsense::{ActivityProbe, DiagnosticSnapshot, Engine};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Global an in-page detector publishes its result on.
pub const DIAGNOSTIC_GLOBAL: &str = "__botDetection";

/// Elements searched for pre-rendered diagnostics, most specific first.
pub const DIAGNOSTIC_SELECTORS: &[&str] = &["#bot-diagnostics", "pre#json", "pre"];

/// How the local engine step is run, if at all.
#[derive(Clone)]
pub struct LocalEngine {
    pub engine: Engine,
    pub window: Duration,
}

fn global_script() -> String {
    format!(
        r#"(() => {{
            const d = window.{DIAGNOSTIC_GLOBAL};
            if (d === undefined || d === null) return null;
            return JSON.parse(JSON.stringify(d));
        }})()"#
    )
}

fn text_script() -> String {
    let selectors = serde_json::to_string(DIAGNOSTIC_SELECTORS).unwrap_or_else(|_| "[]".into());
    format!(
        r#"(() => {{
            for (const sel of {selectors}) {{
                const el = document.querySelector(sel);
                if (el && el.textContent && el.textContent.trim()) return el.textContent;
            }}
            return null;
        }})()"#
    )
}

/// Classify a published value: a full snapshot, some other object, or nothing.
pub fn interpret(value: Value) -> Option<ScenarioResult> {
    match value {
        Value::Object(_) => match serde_json::from_value::<DiagnosticSnapshot>(value.clone()) {
            Ok(snapshot) => Some(ScenarioResult::Snapshot(snapshot)),
            Err(_) => Some(ScenarioResult::Raw(value)),
        },
        _ => None,
    }
}

/// Parse pre-rendered text. Only JSON objects count.
pub fn interpret_text(text: &str) -> Option<ScenarioResult> {
    serde_json::from_str::<Value>(text.trim()).ok().and_then(interpret)
}

/// Run the chain against the current page.
pub async fn extract(ctx: &dyn RenderContext, local: Option<&LocalEngine>) -> ScenarioResult {
    let mut failures = Vec::new();

    match ctx.execute_js(&global_script()).await {
        Ok(value) => {
            if let Some(result) = interpret(value) {
                debug!("diagnostics read from page global");
                return result;
            }
        }
        Err(e) => failures.push(format!("page global: {e:#}")),
    }

    match ctx.execute_js(&text_script()).await {
        Ok(Value::String(text)) => {
            if let Some(result) = interpret_text(&text) {
                debug!("diagnostics read from pre-rendered text");
                return result;
            }
        }
        Ok(_) => {}
        Err(e) => failures.push(format!("page text: {e:#}")),
    }

    if let Some(local) = local {
        match capture_snapshot(ctx).await {
            Ok(snapshot) => {
                let events = match capture_events(ctx).await {
                    Ok(events) => events,
                    Err(e) => {
                        warn!("event log unavailable, scoring without input: {e:#}");
                        Vec::new()
                    }
                };
                let activity = ActivityProbe::replay(local.window, &events);
                debug!(events = events.len(), "diagnostics computed by local engine");
                return ScenarioResult::Snapshot(local.engine.evaluate(&snapshot, Some(&activity)));
            }
            Err(e) => failures.push(format!("local engine: {e:#}")),
        }
    }

    if failures.is_empty() {
        ScenarioResult::Snapshot(DiagnosticSnapshot::empty())
    } else {
        warn!("diagnostics extraction failed: {}", failures.join("; "));
        ScenarioResult::error(failures.join("; "))
    }
}
