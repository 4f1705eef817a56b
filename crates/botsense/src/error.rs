//! Error types for the botsense engine.

use thiserror::Error;

/// Errors that can occur while building or evaluating a detection pass.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid sensor snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    #[error("Invalid weight {weight} for signal '{id}'")]
    InvalidWeight { id: String, weight: f64 },

    #[error("Duplicate signal id in pass: {0}")]
    DuplicateSignal(String),

    #[error("Activity probe cancelled before its window closed")]
    ProbeCancelled,

    #[error("Activity probe already used; create a new probe per window")]
    ProbeReused,
}

pub type Result<T> = std::result::Result<T, EngineError>;
