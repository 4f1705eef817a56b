//! # botsense
//!
//! Self-contained heuristics for telling human-driven browser sessions from
//! automated ones, using only signals available inside the session.
//!
//! A pass takes one [`SensorSnapshot`] through the static
//! [detector registry](detectors), optionally adds the timing signals of an
//! [`ActivityProbe`] window, and reduces the merged collection to a
//! [`Summary`] whose level is judged on the score/max ratio.

pub mod detectors;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod signal;
pub mod snapshot;
pub mod summary;

pub use detectors::{run_static_detections, DetectorRegistry};
pub use error::{EngineError, Result};
pub use pipeline::{evaluate, Engine};
pub use probe::{ActivityProbe, ActivityReport, EventBus, EventKind, InteractionEvent};
pub use signal::{DiagnosticSnapshot, RiskLevel, Signal, Summary};
pub use snapshot::SensorSnapshot;
pub use summary::{summarize, LevelPolicy};
