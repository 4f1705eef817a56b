//! `botsense score`: run the engine offline over a captured snapshot.

use crate::cli::output::{self, Styled};
use anyhow::{Context, Result};
use botsense::{ActivityProbe, DiagnosticSnapshot, Engine, InteractionEvent, LevelPolicy, SensorSnapshot};
use std::path::Path;
use std::time::Duration;

/// Score a snapshot file, optionally with a recorded event log.
pub fn score_files(
    snapshot: &Path,
    events: Option<&Path>,
    window: Duration,
    policy: LevelPolicy,
) -> Result<DiagnosticSnapshot> {
    let text = std::fs::read_to_string(snapshot)
        .with_context(|| format!("reading snapshot {}", snapshot.display()))?;
    let sensors = SensorSnapshot::from_json_str(&text)
        .with_context(|| format!("parsing snapshot {}", snapshot.display()))?;

    let activity = match events {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading event log {}", path.display()))?;
            let log: Vec<InteractionEvent> = serde_json::from_str(&text)
                .with_context(|| format!("parsing event log {}", path.display()))?;
            Some(ActivityProbe::replay(window, &log))
        }
        None => None,
    };

    Ok(Engine::default()
        .with_policy(policy)
        .evaluate(&sensors, activity.as_ref()))
}

pub async fn run(snapshot: &Path, events: Option<&Path>, window_ms: u64, legacy_levels: bool) -> Result<()> {
    let policy = if legacy_levels {
        LevelPolicy::legacy()
    } else {
        LevelPolicy::default()
    };
    let diag = score_files(snapshot, events, Duration::from_millis(window_ms), policy)?;

    if output::is_json() {
        output::print_json(&diag);
        return Ok(());
    }

    let s = Styled::new();
    output::print_header(&s);
    for signal in &diag.signals {
        let sym = if signal.suspicious { s.fail_sym() } else { s.ok_sym() };
        let detail = signal.details.as_deref().unwrap_or("");
        output::print_check(sym, &signal.id, &format!("{:<4} {}", signal.weight, s.dim(detail)));
    }
    output::print_status(
        &s,
        &s.level(diag.summary.level),
        &format!("score {:.1} of {:.1}", diag.summary.score, diag.summary.max),
    );
    Ok(())
}
