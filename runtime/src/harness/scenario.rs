//! Scenario definitions and the built-in adversarial suite.

use crate::renderer::{DeviceProfile, LaunchOptions};
use crate::stealth::{FingerprintPreset, InitScript};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Unknown device profile '{0}' (known: desktop, iphone_13, pixel_7)")]
    UnknownDevice(String),

    #[error("Failed to read scenario file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate scenario name '{0}'")]
    DuplicateName(String),
}

fn default_headless() -> bool {
    true
}

/// How the browser for one scenario is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Name of a built-in device profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_script: Option<InitScript>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            headless: true,
            device: None,
            user_agent: None,
            init_script: None,
        }
    }
}

impl LaunchConfig {
    /// Resolve into renderer launch options. `prelude` scripts run before the
    /// scenario's own script.
    pub fn to_launch_options(&self, prelude: &[&str]) -> Result<LaunchOptions, ScenarioError> {
        let device = match &self.device {
            Some(name) => Some(DeviceProfile::by_name(name).ok_or_else(|| ScenarioError::UnknownDevice(name.clone()))?),
            None => None,
        };
        let mut init_scripts: Vec<String> = prelude.iter().map(|s| s.to_string()).collect();
        if let Some(script) = &self.init_script {
            init_scripts.push(script.source().to_string());
        }
        Ok(LaunchOptions {
            headless: self.headless,
            device,
            user_agent: self.user_agent.clone(),
            init_scripts,
        })
    }
}

/// A script-generated DOM event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticEvent {
    Resize,
    Blur,
    Focus,
    Gesture,
    Touch,
    Click,
    PointerMove,
}

/// The optional post-navigation action of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Jittered pointer path with random pacing, then typed text.
    HumanLike {
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default = "default_moves")]
        moves: usize,
    },
    /// Pointer stepped across a uniform grid at a fixed interval.
    GridSweep {
        cols: u32,
        rows: u32,
        step_px: f64,
        interval_ms: u64,
    },
    /// Script-generated events dispatched in the page.
    DispatchEvents { events: Vec<SyntheticEvent> },
    /// Fail matching requests, then reload the target.
    BlockRoutes { patterns: Vec<String> },
    /// Re-navigate with a forcing query parameter.
    NavigateWithQuery { param: String, value: String },
}

fn default_moves() -> usize {
    30
}

fn default_settle_ms() -> u64 {
    6500
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub launch: LaunchConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Wait after the action before reading diagnostics.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl ScenarioConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            launch: LaunchConfig::default(),
            action: None,
            settle_ms: default_settle_ms(),
        }
    }

    pub fn headful(mut self) -> Self {
        self.launch.headless = false;
        self
    }

    pub fn device(mut self, name: &str) -> Self {
        self.launch.device = Some(name.to_string());
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.launch.user_agent = Some(ua.to_string());
        self
    }

    pub fn preset(mut self, preset: FingerprintPreset) -> Self {
        self.launch.init_script = Some(InitScript::preset(preset));
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn settle_ms(mut self, ms: u64) -> Self {
        self.settle_ms = ms;
        self
    }
}

/// The adversarial configurations every run covers by default.
pub fn builtin_suite() -> Vec<ScenarioConfig> {
    let iphone_ua = DeviceProfile::iphone_13().user_agent.unwrap_or_default();
    vec![
        ScenarioConfig::new("baseline-headless"),
        ScenarioConfig::new("baseline-headful").headful(),
        ScenarioConfig::new("forced-webdriver").preset(FingerprintPreset::ForceWebdriver),
        ScenarioConfig::new("framework-globals").preset(FingerprintPreset::FrameworkGlobals),
        ScenarioConfig::new("mobile-ua-no-touch").user_agent(&iphone_ua),
        ScenarioConfig::new("mobile-emulated").device("pixel_7"),
        ScenarioConfig::new("software-renderer").preset(FingerprintPreset::SoftwareRenderer),
        ScenarioConfig::new("bare-navigator").preset(FingerprintPreset::BareNavigator),
        ScenarioConfig::new("stealth-human")
            .headful()
            .preset(FingerprintPreset::Stealth)
            .action(Action::HumanLike {
                selector: Some("input, textarea".into()),
                text: Some("hello there".into()),
                moves: 40,
            }),
        ScenarioConfig::new("grid-sweep-bot").action(Action::GridSweep {
            cols: 8,
            rows: 6,
            step_px: 40.0,
            interval_ms: 20,
        }),
        ScenarioConfig::new("synthetic-events").action(Action::DispatchEvents {
            events: vec![
                SyntheticEvent::Resize,
                SyntheticEvent::Blur,
                SyntheticEvent::Focus,
                SyntheticEvent::Gesture,
                SyntheticEvent::Touch,
                SyntheticEvent::Click,
            ],
        }),
        ScenarioConfig::new("blocked-routes").action(Action::BlockRoutes {
            patterns: vec!["*.js".into(), "*analytics*".into()],
        }),
        ScenarioConfig::new("forced-query").action(Action::NavigateWithQuery {
            param: "bot".into(),
            value: "1".into(),
        }),
    ]
}

/// Load a scenario list from a JSON array.
pub fn load_scenarios(path: &Path) -> Result<Vec<ScenarioConfig>, ScenarioError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: display.clone(),
        source,
    })?;
    let scenarios: Vec<ScenarioConfig> =
        serde_json::from_str(&text).map_err(|source| ScenarioError::Parse { path: display, source })?;
    validate(&scenarios)?;
    Ok(scenarios)
}

/// Names must be unique and device profiles must exist.
pub fn validate(scenarios: &[ScenarioConfig]) -> Result<(), ScenarioError> {
    let mut seen = std::collections::HashSet::new();
    for scenario in scenarios {
        if !seen.insert(scenario.name.as_str()) {
            return Err(ScenarioError::DuplicateName(scenario.name.clone()));
        }
        if let Some(device) = &scenario.launch.device {
            if DeviceProfile::by_name(device).is_none() {
                return Err(ScenarioError::UnknownDevice(device.clone()));
            }
        }
    }
    Ok(())
}
