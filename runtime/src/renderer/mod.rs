//! Browser renderer abstraction.
//!
//! The harness only talks to a browser through these two traits, so the
//! automation channel (Chromium over CDP today) stays an opaque collaborator
//! and tests can substitute a scripted implementation.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chromium::{find_chromium, ChromiumRenderer};

/// Outcome of a navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationResult {
    pub final_url: String,
    pub load_time_ms: u64,
}

/// Device-emulation profile applied at launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    pub mobile: bool,
    pub max_touch_points: u32,
    pub user_agent: Option<String>,
}

impl DeviceProfile {
    pub fn desktop() -> Self {
        Self {
            name: "desktop".into(),
            width: 1920,
            height: 1080,
            device_scale_factor: 1.0,
            mobile: false,
            max_touch_points: 0,
            user_agent: None,
        }
    }

    pub fn iphone_13() -> Self {
        Self {
            name: "iphone_13".into(),
            width: 390,
            height: 844,
            device_scale_factor: 3.0,
            mobile: true,
            max_touch_points: 5,
            user_agent: Some(
                "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1"
                    .into(),
            ),
        }
    }

    pub fn pixel_7() -> Self {
        Self {
            name: "pixel_7".into(),
            width: 412,
            height: 915,
            device_scale_factor: 2.625,
            mobile: true,
            max_touch_points: 5,
            user_agent: Some(
                "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36"
                    .into(),
            ),
        }
    }

    /// Look up a built-in profile by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('-', "_").as_str() {
            "desktop" => Some(Self::desktop()),
            "iphone_13" | "iphone" => Some(Self::iphone_13()),
            "pixel_7" | "pixel" => Some(Self::pixel_7()),
            _ => None,
        }
    }

    /// Names accepted by [`DeviceProfile::by_name`].
    pub fn builtin_names() -> &'static [&'static str] {
        &["desktop", "iphone_13", "pixel_7"]
    }
}

/// Everything needed to start one isolated browser instance.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub device: Option<DeviceProfile>,
    /// Overrides the device's identity string when both are set.
    pub user_agent: Option<String>,
    /// Scripts evaluated in every new document before page scripts run.
    pub init_scripts: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            device: None,
            user_agent: None,
            init_scripts: Vec::new(),
        }
    }
}

impl LaunchOptions {
    /// The identity string to spoof, if any.
    pub fn effective_user_agent(&self) -> Option<&str> {
        self.user_agent
            .as_deref()
            .or_else(|| self.device.as_ref().and_then(|d| d.user_agent.as_deref()))
    }
}

/// Launches isolated browser instances.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Start a fresh browser with its own profile and return its page.
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn RenderContext>>;
}

/// One page inside a launched browser.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate and wait for the load to finish.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;

    /// Evaluate a script in the page and return its value (promises are awaited).
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;

    /// Move the pointer through the input pipeline (trusted events).
    async fn mouse_move(&self, x: f64, y: f64) -> Result<()>;

    /// Press and release one character key.
    async fn key_press(&self, key: char) -> Result<()>;

    /// Fail every request whose URL matches one of the patterns (`*` wildcards).
    async fn block_urls(&mut self, patterns: &[String]) -> Result<()>;

    /// Shut the browser down.
    async fn close(self: Box<Self>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup() {
        assert_eq!(DeviceProfile::by_name("iPhone-13"), Some(DeviceProfile::iphone_13()));
        assert_eq!(DeviceProfile::by_name("pixel"), Some(DeviceProfile::pixel_7()));
        assert!(DeviceProfile::by_name("nokia_3310").is_none());
        for name in DeviceProfile::builtin_names() {
            assert!(DeviceProfile::by_name(name).is_some());
        }
    }

    #[test]
    fn test_user_agent_precedence() {
        let mut options = LaunchOptions {
            device: Some(DeviceProfile::pixel_7()),
            ..Default::default()
        };
        assert!(options.effective_user_agent().unwrap().contains("Pixel 7"));

        options.user_agent = Some("Custom/1.0".into());
        assert_eq!(options.effective_user_agent(), Some("Custom/1.0"));

        assert_eq!(LaunchOptions::default().effective_user_agent(), None);
    }
}
