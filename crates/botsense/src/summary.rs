//! Risk summarizer: reduce a signal collection to score, max, and level.

use serde::{Deserialize, Serialize};

use crate::signal::{RiskLevel, Signal, Summary};

/// Ratio at or above which a pass is classified high risk.
pub const HIGH_RATIO: f64 = 0.7;
/// Ratio at or above which a pass is classified medium risk.
pub const MEDIUM_RATIO: f64 = 0.4;

/// Raw-score thresholds of the legacy policy.
pub const LEGACY_HIGH_SCORE: f64 = 6.0;
pub const LEGACY_MEDIUM_SCORE: f64 = 3.0;

/// How a score is mapped onto a [`RiskLevel`].
///
/// `Ratio` is the canonical policy. `RawScore` only stays comparable while the
/// active signal set is fixed, so it is kept for side-by-side calibration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum LevelPolicy {
    #[default]
    Ratio,
    RawScore { medium: f64, high: f64 },
}

impl LevelPolicy {
    /// The raw-score policy with its historical thresholds.
    pub fn legacy() -> Self {
        LevelPolicy::RawScore {
            medium: LEGACY_MEDIUM_SCORE,
            high: LEGACY_HIGH_SCORE,
        }
    }

    /// Classify a score against the policy's thresholds.
    pub fn classify(&self, score: f64, max: f64) -> RiskLevel {
        match *self {
            LevelPolicy::Ratio => {
                if max <= 0.0 {
                    return RiskLevel::Low;
                }
                let ratio = score / max;
                if ratio >= HIGH_RATIO {
                    RiskLevel::High
                } else if ratio >= MEDIUM_RATIO {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                }
            }
            LevelPolicy::RawScore { medium, high } => {
                if score >= high {
                    RiskLevel::High
                } else if score >= medium {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                }
            }
        }
    }
}

/// Summarize with the canonical ratio policy.
pub fn summarize(signals: &[Signal]) -> Summary {
    summarize_with(signals, LevelPolicy::Ratio)
}

/// Summarize with an explicit policy.
pub fn summarize_with(signals: &[Signal], policy: LevelPolicy) -> Summary {
    let score: f64 = signals.iter().map(Signal::effective_weight).sum();
    let max: f64 = signals.iter().map(|s| s.weight).sum();

    Summary {
        score,
        max,
        level: policy.classify(score, max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals_with_ratio(score: f64, max: f64) -> Vec<Signal> {
        vec![
            Signal::new("hit", "Hit", true, score),
            Signal::new("miss", "Miss", false, max - score),
        ]
    }

    #[test]
    fn test_score_and_max() {
        let signals = vec![
            Signal::new("a", "A", true, 3.0),
            Signal::new("b", "B", false, 2.0),
            Signal::new("c", "C", true, 0.5),
        ];
        let summary = summarize(&signals);
        assert_eq!(summary.score, 3.5);
        assert_eq!(summary.max, 5.5);
        assert!(summary.score <= summary.max);
    }

    #[test]
    fn test_empty_collection_is_low() {
        let summary = summarize(&[]);
        assert_eq!(summary.score, 0.0);
        assert_eq!(summary.max, 0.0);
        assert_eq!(summary.level, RiskLevel::Low);
    }

    #[test]
    fn test_ratio_boundaries() {
        assert_eq!(summarize(&signals_with_ratio(39.0, 100.0)).level, RiskLevel::Low);
        assert_eq!(summarize(&signals_with_ratio(41.0, 100.0)).level, RiskLevel::Medium);
        assert_eq!(summarize(&signals_with_ratio(69.0, 100.0)).level, RiskLevel::Medium);
        assert_eq!(summarize(&signals_with_ratio(7.0, 10.0)).level, RiskLevel::High);
        assert_eq!(summarize(&signals_with_ratio(4.0, 10.0)).level, RiskLevel::Medium);
    }

    #[test]
    fn test_ratio_independent_of_signal_count() {
        let small = summarize(&signals_with_ratio(2.0, 4.0));
        let large = summarize(&signals_with_ratio(20.0, 40.0));
        assert_eq!(small.level, large.level);
    }

    #[test]
    fn test_legacy_policy_uses_raw_score() {
        let signals = signals_with_ratio(6.0, 60.0);
        assert_eq!(summarize(&signals).level, RiskLevel::Low);
        assert_eq!(
            summarize_with(&signals, LevelPolicy::legacy()).level,
            RiskLevel::High
        );
    }
}
