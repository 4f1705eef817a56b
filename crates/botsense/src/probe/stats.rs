//! Interval statistics and the signals derived from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::events::{EventKind, InteractionEvent};
use crate::signal::Signal;

/// Pointer displacement (px, per axis) at or below which a move is "tiny".
pub const TINY_MOVE_PX: f64 = 1.0;
/// Variance (ms²) below which gaps look machine-timed.
pub const REGULAR_VARIANCE_MS2: f64 = 4.0;
/// Gap-value entropy (bits) below which gaps look machine-timed.
pub const REGULAR_ENTROPY_BITS: f64 = 1.0;
/// Fewest intervals the regularity check will judge.
pub const MIN_REGULARITY_INTERVALS: usize = 4;
/// Shortest gap a human can plausibly produce between two inputs.
pub const MIN_HUMAN_GAP_MS: f64 = 8.0;
/// Fewest pointer moves before the jitter ratio is trusted.
pub const MIN_JITTER_MOVES: u32 = 10;
pub const MAX_TINY_MOVE_RATIO: f64 = 0.5;
/// Focus/blur transitions per window that look scripted.
pub const FOCUS_CHURN_LIMIT: u32 = 6;

pub const NO_INPUT_WEIGHT: f64 = 3.0;
pub const TOO_REGULAR_WEIGHT: f64 = 2.0;
pub const IMPOSSIBLE_SPEED_WEIGHT: f64 = 2.0;
pub const JITTER_WEIGHT: f64 = 1.0;
pub const SYNTHETIC_WEIGHT: f64 = 2.0;
pub const FOCUS_CHURN_WEIGHT: f64 = 0.5;

/// Per-class tallies for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCounters {
    pub pointer_moves: u32,
    pub clicks: u32,
    pub keys: u32,
    pub scrolls: u32,
    pub tiny_moves: u32,
    pub focus_changes: u32,
    pub resizes: u32,
    pub gestures: u32,
    pub touches: u32,
    pub untrusted: u32,
}

impl ActivityCounters {
    /// Sum of the four qualifying classes.
    pub fn qualifying(&self) -> u32 {
        self.pointer_moves + self.clicks + self.keys + self.scrolls
    }
}

/// Sample mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Bessel-corrected sample variance (divides by n - 1).
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Shannon entropy (bits) of the gaps normalized into a distribution,
/// `p_i = gap_i / sum(gaps)`. Zero probabilities contribute nothing.
pub fn gap_entropy(gaps: &[f64]) -> Option<f64> {
    let total: f64 = gaps.iter().sum();
    if gaps.is_empty() || total <= 0.0 {
        return None;
    }
    Some(
        gaps.iter()
            .map(|g| g / total)
            .filter(|p| *p > 0.0)
            .map(|p| -p * p.log2())
            .sum(),
    )
}

/// Shannon entropy (bits) of the distribution of gap values bucketed to 1 ms.
/// Perfectly periodic input gives 0.
pub fn value_entropy(gaps: &[f64]) -> Option<f64> {
    if gaps.is_empty() {
        return None;
    }
    let mut buckets: BTreeMap<i64, u32> = BTreeMap::new();
    for g in gaps {
        *buckets.entry(g.round() as i64).or_default() += 1;
    }
    let n = gaps.len() as f64;
    Some(
        buckets
            .values()
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.log2()
            })
            .sum(),
    )
}

/// Streaming accumulator for one window of events.
#[derive(Debug, Default)]
pub struct ActivityAggregator {
    counters: ActivityCounters,
    intervals: Vec<f64>,
    last_t: Option<f64>,
    last_pointer: Option<(f64, f64)>,
}

impl ActivityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the window.
    pub fn record(&mut self, event: &InteractionEvent) {
        if !event.trusted {
            self.counters.untrusted += 1;
        }

        match event.kind {
            EventKind::Focus | EventKind::Blur => self.counters.focus_changes += 1,
            EventKind::Resize => self.counters.resizes += 1,
            EventKind::Gesture => self.counters.gestures += 1,
            EventKind::Touch => self.counters.touches += 1,
            EventKind::PointerMove => {
                self.counters.pointer_moves += 1;
                if let (Some(x), Some(y)) = (event.x, event.y) {
                    if let Some((px, py)) = self.last_pointer {
                        if (x - px).abs() <= TINY_MOVE_PX && (y - py).abs() <= TINY_MOVE_PX {
                            self.counters.tiny_moves += 1;
                        }
                    }
                    self.last_pointer = Some((x, y));
                }
            }
            EventKind::Click => self.counters.clicks += 1,
            EventKind::KeyDown => self.counters.keys += 1,
            EventKind::Scroll => self.counters.scrolls += 1,
        }

        if event.kind.is_qualifying() {
            if let Some(last) = self.last_t {
                self.intervals.push((event.t_ms - last).max(0.0));
            }
            self.last_t = Some(event.t_ms);
        }
    }

    /// Close the window and compute its statistics.
    pub fn finish(self) -> ActivityStats {
        let tiny_move_ratio = if self.counters.pointer_moves > 0 {
            self.counters.tiny_moves as f64 / self.counters.pointer_moves as f64
        } else {
            0.0
        };

        ActivityStats {
            interval_count: self.intervals.len(),
            mean_ms: mean(&self.intervals),
            variance_ms2: sample_variance(&self.intervals),
            entropy_bits: gap_entropy(&self.intervals),
            value_entropy_bits: value_entropy(&self.intervals),
            min_gap_ms: self.intervals.iter().copied().reduce(f64::min),
            tiny_move_ratio,
            counters: self.counters,
        }
    }
}

/// Everything computed when a window closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub counters: ActivityCounters,
    pub interval_count: usize,
    pub mean_ms: Option<f64>,
    pub variance_ms2: Option<f64>,
    pub entropy_bits: Option<f64>,
    pub value_entropy_bits: Option<f64>,
    pub min_gap_ms: Option<f64>,
    pub tiny_move_ratio: f64,
}

impl ActivityStats {
    /// Compute statistics over a recorded event sequence.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a InteractionEvent>) -> Self {
        let mut agg = ActivityAggregator::new();
        for ev in events {
            agg.record(ev);
        }
        agg.finish()
    }

    pub fn no_input(&self) -> bool {
        self.counters.qualifying() == 0
    }

    /// Low variance and low entropy together. Either alone is not enough:
    /// coarse timers flatten variance on real input too.
    pub fn too_regular(&self) -> bool {
        if self.interval_count < MIN_REGULARITY_INTERVALS {
            return false;
        }
        match (self.variance_ms2, self.value_entropy_bits) {
            (Some(var), Some(ent)) => var < REGULAR_VARIANCE_MS2 && ent < REGULAR_ENTROPY_BITS,
            _ => false,
        }
    }

    pub fn impossible_speed(&self) -> bool {
        self.min_gap_ms.is_some_and(|g| g < MIN_HUMAN_GAP_MS)
    }

    pub fn excessive_jitter(&self) -> bool {
        self.counters.pointer_moves >= MIN_JITTER_MOVES && self.tiny_move_ratio > MAX_TINY_MOVE_RATIO
    }

    /// Derived activity signals, in a fixed order.
    pub fn signals(&self) -> Vec<Signal> {
        let c = &self.counters;
        let fmt = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".into());

        vec![
            Signal::new("activity_no_input", "No user input", self.no_input(), NO_INPUT_WEIGHT)
                .with_details(format!(
                    "moves={} clicks={} keys={} scrolls={}",
                    c.pointer_moves, c.clicks, c.keys, c.scrolls
                )),
            Signal::new("activity_too_regular", "Input timing too regular", self.too_regular(), TOO_REGULAR_WEIGHT)
                .with_details(format!(
                    "intervals={} variance={} entropy={} valueEntropy={}",
                    self.interval_count,
                    fmt(self.variance_ms2),
                    fmt(self.entropy_bits),
                    fmt(self.value_entropy_bits)
                )),
            Signal::new(
                "activity_impossible_speed",
                "Physically impossible input speed",
                self.impossible_speed(),
                IMPOSSIBLE_SPEED_WEIGHT,
            )
            .with_details(format!("minGap={}", fmt(self.min_gap_ms))),
            Signal::new(
                "activity_excessive_jitter",
                "Excessive pointer micro-jitter",
                self.excessive_jitter(),
                JITTER_WEIGHT,
            )
            .with_details(format!("tiny={}/{}", c.tiny_moves, c.pointer_moves)),
            Signal::new(
                "activity_synthetic_events",
                "Script-generated events",
                c.untrusted > 0,
                SYNTHETIC_WEIGHT,
            )
            .with_details(format!("untrusted={}", c.untrusted)),
            Signal::new(
                "activity_focus_churn",
                "Rapid focus changes",
                c.focus_changes >= FOCUS_CHURN_LIMIT,
                FOCUS_CHURN_WEIGHT,
            )
            .with_details(format!("focusChanges={}", c.focus_changes)),
        ]
    }
}
