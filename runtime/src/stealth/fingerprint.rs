//! Pre-navigation scripts that reshape the browser's fingerprint.
//!
//! Each preset either hides an automation trait (the stealth patch) or plants
//! one on purpose, so a scenario can check that the matching detector fires.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hide the usual automation traits: webdriver flag, empty plugins, missing
/// `chrome.runtime`, the notifications permission quirk, bare languages.
pub const STEALTH_SCRIPT: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', {
        get: () => false,
        configurable: true,
    });

    if (!window.chrome) {
        window.chrome = {};
    }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: function() {},
            sendMessage: function() {},
        };
    }

    if (navigator.permissions && navigator.permissions.query) {
        const originalQuery = navigator.permissions.query.bind(navigator.permissions);
        navigator.permissions.query = (parameters) =>
            parameters && parameters.name === 'notifications'
                ? Promise.resolve({ state: Notification.permission })
                : originalQuery(parameters);
    }

    const fakePlugins = ['PDF Viewer', 'Chrome PDF Viewer', 'Chromium PDF Viewer']
        .map((name) => ({ name, filename: 'internal-pdf-viewer', description: 'Portable Document Format' }));
    Object.defineProperty(navigator, 'plugins', {
        get: () => fakePlugins,
        configurable: true,
    });

    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true,
    });
})();
"#;

/// Force `navigator.webdriver` to report true.
pub const FORCE_WEBDRIVER_SCRIPT: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', {
        get: () => true,
        configurable: true,
    });
})();
"#;

/// Plant globals that older automation frameworks leave behind.
pub const FRAMEWORK_GLOBALS_SCRIPT: &str = r#"
(() => {
    window.__nightmare = true;
    window._phantom = {};
    window.callPhantom = function() {};
    window.__selenium_unwrapped = true;
})();
"#;

/// Report a software rasterizer through the WebGL debug renderer extension.
pub const SOFTWARE_RENDERER_SCRIPT: &str = r#"
(() => {
    const UNMASKED_VENDOR = 0x9245;
    const UNMASKED_RENDERER = 0x9246;
    const patch = (proto) => {
        if (!proto) return;
        const original = proto.getParameter;
        proto.getParameter = function(param) {
            if (param === UNMASKED_VENDOR) return 'Google Inc. (Google)';
            if (param === UNMASKED_RENDERER) return 'ANGLE (Google, Vulkan 1.3.0 (SwiftShader Device (Subzero)), SwiftShader driver)';
            return original.call(this, param);
        };
    };
    patch(window.WebGLRenderingContext && WebGLRenderingContext.prototype);
    patch(window.WebGL2RenderingContext && WebGL2RenderingContext.prototype);
})();
"#;

/// Report no plugins and no preferred languages.
pub const BARE_NAVIGATOR_SCRIPT: &str = r#"
(() => {
    Object.defineProperty(navigator, 'plugins', { get: () => [], configurable: true });
    Object.defineProperty(navigator, 'languages', { get: () => [], configurable: true });
})();
"#;

/// Named fingerprint presets a scenario can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintPreset {
    Stealth,
    ForceWebdriver,
    FrameworkGlobals,
    SoftwareRenderer,
    BareNavigator,
}

impl FingerprintPreset {
    pub fn script(&self) -> &'static str {
        match self {
            FingerprintPreset::Stealth => STEALTH_SCRIPT,
            FingerprintPreset::ForceWebdriver => FORCE_WEBDRIVER_SCRIPT,
            FingerprintPreset::FrameworkGlobals => FRAMEWORK_GLOBALS_SCRIPT,
            FingerprintPreset::SoftwareRenderer => SOFTWARE_RENDERER_SCRIPT,
            FingerprintPreset::BareNavigator => BARE_NAVIGATOR_SCRIPT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FingerprintPreset::Stealth => "stealth",
            FingerprintPreset::ForceWebdriver => "force_webdriver",
            FingerprintPreset::FrameworkGlobals => "framework_globals",
            FingerprintPreset::SoftwareRenderer => "software_renderer",
            FingerprintPreset::BareNavigator => "bare_navigator",
        }
    }
}

impl fmt::Display for FingerprintPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pre-navigation script: a named preset or literal source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitScript {
    Preset { preset: FingerprintPreset },
    Source { source: String },
}

impl InitScript {
    pub fn preset(preset: FingerprintPreset) -> Self {
        InitScript::Preset { preset }
    }

    pub fn source(&self) -> &str {
        match self {
            InitScript::Preset { preset } => preset.script(),
            InitScript::Source { source } => source,
        }
    }
}
