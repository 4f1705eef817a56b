//! Automation-identity detectors: driver flag, identity string, framework globals.

use crate::signal::Signal;
use crate::snapshot::SensorSnapshot;

/// Tokens that identify automation tooling in an identity string.
pub const AUTOMATION_UA_TOKENS: &[&str] = &[
    "headless",
    "phantomjs",
    "selenium",
    "webdriver",
    "puppeteer",
    "playwright",
    "electron",
    "slimerjs",
    "htmlunit",
    "bot",
    "crawler",
    "spider",
];

/// Globals injected by automation frameworks.
pub const AUTOMATION_GLOBALS: &[&str] = &[
    "__nightmare",
    "_phantom",
    "callPhantom",
    "__selenium_unwrapped",
    "__webdriver_evaluate",
    "__driver_evaluate",
    "__fxdriver_evaluate",
    "__webdriver_script_fn",
    "domAutomation",
    "domAutomationController",
    "__playwright",
    "__pwInitScripts",
    "__puppeteer_evaluation_script__",
    "_Selenium_IDE_Recorder",
];

/// Prefixes chromedriver leaves on window and document properties.
pub const AUTOMATION_GLOBAL_PREFIXES: &[&str] = &["cdc_", "$cdc_", "$wdc_"];

pub const WEBDRIVER_WEIGHT: f64 = 3.0;
pub const UA_TOKEN_WEIGHT: f64 = 2.0;
pub const GLOBALS_WEIGHT: f64 = 3.0;

/// `navigator.webdriver` set by a controlling driver.
pub fn webdriver(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("webdriver", "Automation flag (navigator.webdriver)", false, WEBDRIVER_WEIGHT);
    match snapshot.webdriver {
        Some(flag) => Signal {
            suspicious: flag,
            ..signal
        }
        .with_details(flag.to_string()),
        None => Signal {
            suspicious: true,
            ..signal
        }
        .with_details("unreadable"),
    }
}

/// Known automation tokens in the identity string.
pub fn user_agent_tokens(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("user_agent_tokens", "Automation tokens in user agent", false, UA_TOKEN_WEIGHT);
    let Some(ua) = snapshot.user_agent.as_deref() else {
        return Signal {
            suspicious: true,
            ..signal
        }
        .with_details("missing user agent");
    };

    let lowered = ua.to_lowercase();
    let matched: Vec<&str> = AUTOMATION_UA_TOKENS
        .iter()
        .copied()
        .filter(|t| lowered.contains(t))
        .collect();

    if matched.is_empty() {
        signal
    } else {
        Signal {
            suspicious: true,
            ..signal
        }
        .with_details(matched.join(", "))
    }
}

/// Whether a global name is a known automation marker.
pub fn is_automation_global(name: &str) -> bool {
    AUTOMATION_GLOBALS.contains(&name)
        || AUTOMATION_GLOBAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Named-global scan. Every match is reported; any match is suspicious.
pub fn automation_globals(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("automation_globals", "Automation framework globals", false, GLOBALS_WEIGHT);
    let Some(globals) = snapshot.automation_globals.as_ref() else {
        return Signal {
            suspicious: true,
            ..signal
        }
        .with_details("global scan unavailable");
    };

    let found: Vec<&str> = globals
        .iter()
        .map(String::as_str)
        .filter(|g| is_automation_global(g))
        .collect();

    if found.is_empty() {
        signal
    } else {
        Signal {
            suspicious: true,
            ..signal
        }
        .with_details(found.join(", "))
    }
}
