//! Detector registry.
//!
//! Each detector is a pure function of a [`SensorSnapshot`] returning exactly
//! one [`Signal`]. Detectors never fail: an unreadable sensor value produces
//! the suspicious outcome.

pub mod environment;
pub mod identity;

use crate::signal::Signal;
use crate::snapshot::SensorSnapshot;
use tracing::debug;

/// A static detector.
pub type Detector = fn(&SensorSnapshot) -> Signal;

/// Registry order. Scoring ignores it; diagnostics rely on it being stable.
pub const STANDARD_DETECTORS: &[Detector] = &[
    identity::webdriver,
    identity::user_agent_tokens,
    identity::automation_globals,
    environment::plugins,
    environment::languages,
    environment::webgl_renderer,
    environment::touch_platform,
    environment::timezone,
    environment::screen,
    environment::hardware,
    environment::capabilities,
    environment::canvas_fingerprint,
    environment::audio,
];

/// An ordered set of static detectors.
#[derive(Clone)]
pub struct DetectorRegistry {
    detectors: Vec<Detector>,
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl DetectorRegistry {
    /// The built-in detector set.
    pub fn standard() -> Self {
        Self {
            detectors: STANDARD_DETECTORS.to_vec(),
        }
    }

    /// A registry with no detectors.
    pub fn empty() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Append a detector at the end of the pass.
    pub fn with(mut self, detector: Detector) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every detector against the snapshot, in registry order.
    pub fn run(&self, snapshot: &SensorSnapshot) -> Vec<Signal> {
        let signals: Vec<Signal> = self.detectors.iter().map(|d| d(snapshot)).collect();
        debug!(
            detectors = signals.len(),
            suspicious = signals.iter().filter(|s| s.suspicious).count(),
            "static detection pass complete"
        );
        signals
    }
}

/// Run the standard registry against a snapshot.
pub fn run_static_detections(snapshot: &SensorSnapshot) -> Vec<Signal> {
    DetectorRegistry::standard().run(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::validate_signals;
    use crate::snapshot::{Capabilities, ScreenSize};
    use crate::summary::summarize;

    pub(crate) fn desktop_chrome() -> SensorSnapshot {
        SensorSnapshot {
            webdriver: Some(false),
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .into(),
            ),
            platform: Some("Win32".into()),
            languages: Some(vec!["en-US".into(), "en".into()]),
            plugin_count: Some(5),
            automation_globals: Some(vec!["chrome".into(), "document".into()]),
            webgl_vendor: Some("Google Inc. (NVIDIA)".into()),
            webgl_renderer: Some("ANGLE (NVIDIA, NVIDIA GeForce RTX 3060 Direct3D11 vs_5_0 ps_5_0)".into()),
            max_touch_points: Some(0),
            timezone: Some("Europe/Berlin".into()),
            screen: Some(ScreenSize { width: 1920, height: 1080 }),
            hardware_concurrency: Some(8),
            device_memory: Some(8.0),
            capabilities: Capabilities {
                permissions: Some(true),
                webrtc: Some(true),
                media_devices: Some(true),
                installed_related_apps: Some(true),
                audio_context: Some(true),
                offline_audio_context: Some(true),
            },
            canvas_sample: Some("data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAASwAAAA8CAYAAADxXYWn".into()),
        }
    }

    #[test]
    fn test_standard_registry_emits_one_signal_per_detector() {
        let signals = run_static_detections(&desktop_chrome());
        assert_eq!(signals.len(), STANDARD_DETECTORS.len());
        validate_signals(&signals).unwrap();
    }

    #[test]
    fn test_clean_desktop_is_low_risk() {
        let signals = run_static_detections(&desktop_chrome());
        let summary = summarize(&signals);
        assert!(summary.ratio() < 0.4, "triggered: {:?}", signals.iter().filter(|s| s.suspicious).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_snapshot_is_high_risk() {
        let signals = run_static_detections(&SensorSnapshot::default());
        let summary = summarize(&signals);
        assert!(summary.score <= summary.max);
        assert_eq!(summary.level, crate::signal::RiskLevel::High);
    }

    #[test]
    fn test_deterministic() {
        let snap = desktop_chrome();
        let a = run_static_detections(&snap);
        let b = run_static_detections(&snap);
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_detector_appended() {
        fn always(_: &SensorSnapshot) -> Signal {
            Signal::new("custom", "Custom", true, 1.0)
        }
        let registry = DetectorRegistry::empty().with(always);
        let signals = registry.run(&SensorSnapshot::default());
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].id, "custom");
    }
}
