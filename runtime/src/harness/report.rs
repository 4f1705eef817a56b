//! Harness output: one report per scenario, written once at the end.

use anyhow::{Context, Result};
use botsense::DiagnosticSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A scenario that could not produce diagnostics. Only the exact
/// `{ "error": ... }` shape decodes as this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFailure {
    pub error: String,
}

/// What a scenario produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioResult {
    Snapshot(DiagnosticSnapshot),
    Error(ScenarioFailure),
    /// A page-published object that is not a diagnostic snapshot.
    Raw(serde_json::Value),
}

impl ScenarioResult {
    pub fn error(message: impl Into<String>) -> Self {
        ScenarioResult::Error(ScenarioFailure {
            error: message.into(),
        })
    }

    pub fn snapshot(&self) -> Option<&DiagnosticSnapshot> {
        match self {
            ScenarioResult::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ScenarioResult::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub timestamp: DateTime<Utc>,
    pub result: ScenarioResult,
}

impl ScenarioReport {
    pub fn new(scenario: impl Into<String>, result: ScenarioResult) -> Self {
        Self {
            scenario: scenario.into(),
            timestamp: Utc::now(),
            result,
        }
    }
}

/// The document a harness run persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessOutput {
    pub target: String,
    pub results: Vec<ScenarioReport>,
}

impl HarnessOutput {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, report: ScenarioReport) {
        self.results.push(report);
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing harness output")
    }

    /// Write the output as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("writing report to {}", path.display()))
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading report {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing report {}", path.display()))
    }
}
