//! Signal, summary, and diagnostic snapshot types.
//!
//! These are the values every detection pass produces and the harness
//! serializes. Field names are camelCase on the wire so the same shape can be
//! published by an in-page detector and read back by the harness.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{EngineError, Result};

/// One detector's verdict for a single environmental or behavioral check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    /// Unique key within one pass.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    pub suspicious: bool,
    /// Non-negative contribution to the score when `suspicious` is set.
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Signal {
    /// Create a signal with no details.
    pub fn new(id: impl Into<String>, name: impl Into<String>, suspicious: bool, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            suspicious,
            weight,
            details: None,
        }
    }

    /// Attach a diagnostic detail string.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Weight counted towards the score (zero when not suspicious).
    pub fn effective_weight(&self) -> f64 {
        if self.suspicious {
            self.weight
        } else {
            0.0
        }
    }
}

/// Check that a collection is well formed: finite non-negative weights and
/// ids unique within the pass.
pub fn validate_signals(signals: &[Signal]) -> Result<()> {
    let mut seen = HashSet::with_capacity(signals.len());
    for s in signals {
        if !s.weight.is_finite() || s.weight < 0.0 {
            return Err(EngineError::InvalidWeight {
                id: s.id.clone(),
                weight: s.weight,
            });
        }
        if !seen.insert(s.id.as_str()) {
            return Err(EngineError::DuplicateSignal(s.id.clone()));
        }
    }
    Ok(())
}

/// Discrete risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduction of a signal collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub score: f64,
    pub max: f64,
    pub level: RiskLevel,
}

impl Summary {
    /// Fraction of the maximum score that was triggered (0 when `max` is 0).
    pub fn ratio(&self) -> f64 {
        if self.max > 0.0 {
            self.score / self.max
        } else {
            0.0
        }
    }
}

/// Everything one detection pass produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSnapshot {
    pub summary: Summary,
    pub signals: Vec<Signal>,
}

impl DiagnosticSnapshot {
    /// The shape used when no diagnostics could be obtained at all.
    pub fn empty() -> Self {
        Self {
            summary: Summary {
                score: 0.0,
                max: 0.0,
                level: RiskLevel::Low,
            },
            signals: Vec::new(),
        }
    }

    /// Look up a signal by id.
    pub fn signal(&self, id: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.id == id)
    }

    /// Ids of every suspicious signal, in pass order.
    pub fn triggered(&self) -> Vec<&str> {
        self.signals
            .iter()
            .filter(|s| s.suspicious)
            .map(|s| s.id.as_str())
            .collect()
    }
}
