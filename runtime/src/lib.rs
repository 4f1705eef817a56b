//! # botsense-runtime
//!
//! Adversarial scenario harness for the botsense engine. Each scenario starts
//! an isolated Chromium with a known automation configuration, drives the
//! target page, and records the diagnostics the page (or the local engine)
//! produced.

pub mod cli;
pub mod harness;
pub mod renderer;
pub mod stealth;
