//! Sensor snapshot: one immutable capture of every host value a detection
//! pass reads.
//!
//! Every field is optional. `None` means the host could not answer (the
//! capability is missing or the read threw), and detectors treat that as the
//! suspicious outcome.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Screen dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Presence flags for optional host APIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capabilities {
    pub permissions: Option<bool>,
    pub webrtc: Option<bool>,
    pub media_devices: Option<bool>,
    pub installed_related_apps: Option<bool>,
    pub audio_context: Option<bool>,
    pub offline_audio_context: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorSnapshot {
    pub webdriver: Option<bool>,
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub languages: Option<Vec<String>>,
    pub plugin_count: Option<u32>,
    /// Names of window globals found on the page.
    pub automation_globals: Option<Vec<String>>,
    pub webgl_vendor: Option<String>,
    pub webgl_renderer: Option<String>,
    pub max_touch_points: Option<u32>,
    pub timezone: Option<String>,
    pub screen: Option<ScreenSize>,
    pub hardware_concurrency: Option<u32>,
    /// Device memory in gigabytes, as the host reports it.
    pub device_memory: Option<f64>,
    pub capabilities: Capabilities,
    /// Data URL of the rendered canvas sample.
    pub canvas_sample: Option<String>,
}

const MOBILE_TOKENS: &[&str] = &["mobi", "android", "iphone", "ipad", "ipod"];
const MOBILE_PLATFORMS: &[&str] = &["iphone", "ipad", "ipod", "android", "linux armv8l", "linux aarch64"];

impl SensorSnapshot {
    /// Parse a snapshot from the JSON the capture script returns.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether the identity string or platform looks like a phone or tablet.
    pub fn is_mobile(&self) -> bool {
        let ua_mobile = self
            .user_agent
            .as_deref()
            .map(|ua| {
                let ua = ua.to_lowercase();
                MOBILE_TOKENS.iter().any(|t| ua.contains(t))
            })
            .unwrap_or(false);

        let platform_mobile = self
            .platform
            .as_deref()
            .map(|p| {
                let p = p.to_lowercase();
                MOBILE_PLATFORMS.iter().any(|m| p == *m)
            })
            .unwrap_or(false);

        ua_mobile || platform_mobile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_snapshot() {
        let json = serde_json::json!({
            "webdriver": false,
            "userAgent": "Mozilla/5.0 (X11; Linux x86_64)",
            "languages": ["en-US", "en"],
            "screen": { "width": 1920, "height": 1080 },
            "capabilities": { "permissions": true }
        });
        let snap = SensorSnapshot::from_json(json).unwrap();
        assert_eq!(snap.webdriver, Some(false));
        assert_eq!(snap.screen, Some(ScreenSize { width: 1920, height: 1080 }));
        assert_eq!(snap.capabilities.permissions, Some(true));
        assert_eq!(snap.capabilities.webrtc, None);
        assert!(snap.timezone.is_none());
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let json = serde_json::json!({ "pluginCount": "many" });
        assert!(SensorSnapshot::from_json(json).is_err());
    }

    #[test]
    fn test_is_mobile() {
        let snap = SensorSnapshot {
            user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148".into()),
            ..Default::default()
        };
        assert!(snap.is_mobile());

        let snap = SensorSnapshot {
            user_agent: Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)".into()),
            platform: Some("Win32".into()),
            ..Default::default()
        };
        assert!(!snap.is_mobile());

        let snap = SensorSnapshot {
            platform: Some("iPad".into()),
            ..Default::default()
        };
        assert!(snap.is_mobile());
    }
}
