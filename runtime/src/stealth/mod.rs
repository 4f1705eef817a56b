//! Fingerprint presets and human-like input pacing for adversarial scenarios.

pub mod behavior;
pub mod fingerprint;

pub use fingerprint::{FingerprintPreset, InitScript};
