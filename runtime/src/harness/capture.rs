//! In-page capture: the sensor snapshot script and the interaction recorder.

use crate::renderer::RenderContext;
use anyhow::{Context, Result};
use botsense::{InteractionEvent, SensorSnapshot};

/// Global the recorder appends to.
pub const EVENT_LOG_GLOBAL: &str = "__botsenseEvents";

/// Read every value a detection pass needs in one evaluation.
///
/// Each read is guarded; a throwing read yields `null`, which the engine
/// treats as the suspicious outcome.
pub const SENSOR_SCRIPT: &str = r#"
(() => {
    const read = (fn) => { try { const v = fn(); return v === undefined ? null : v; } catch (e) { return null; } };
    const has = (fn) => { try { return !!fn(); } catch (e) { return null; } };

    const gl = read(() => {
        const canvas = document.createElement('canvas');
        const ctx = canvas.getContext('webgl') || canvas.getContext('experimental-webgl');
        if (!ctx) return null;
        const ext = ctx.getExtension('WEBGL_debug_renderer_info');
        if (!ext) return null;
        return {
            vendor: ctx.getParameter(ext.UNMASKED_VENDOR_WEBGL),
            renderer: ctx.getParameter(ext.UNMASKED_RENDERER_WEBGL),
        };
    });

    const canvasSample = read(() => {
        const canvas = document.createElement('canvas');
        canvas.width = 220;
        canvas.height = 30;
        const ctx = canvas.getContext('2d');
        ctx.textBaseline = 'top';
        ctx.font = "14px 'Arial'";
        ctx.fillStyle = '#f60';
        ctx.fillRect(125, 1, 62, 20);
        ctx.fillStyle = '#069';
        ctx.fillText('botsense canvas probe', 2, 15);
        ctx.fillStyle = 'rgba(102, 204, 0, 0.7)';
        ctx.fillText('botsense canvas probe', 4, 17);
        return canvas.toDataURL();
    });

    const globals = read(() => Object.getOwnPropertyNames(window)
        .filter((name) => /^[_$]|^cdc|^dom|^call/.test(name)));

    return {
        webdriver: read(() => navigator.webdriver),
        userAgent: read(() => navigator.userAgent),
        platform: read(() => navigator.platform),
        languages: read(() => Array.from(navigator.languages)),
        pluginCount: read(() => navigator.plugins.length),
        automationGlobals: globals,
        webglVendor: gl ? gl.vendor : null,
        webglRenderer: gl ? gl.renderer : null,
        maxTouchPoints: read(() => navigator.maxTouchPoints),
        timezone: read(() => Intl.DateTimeFormat().resolvedOptions().timeZone),
        screen: read(() => ({ width: screen.width, height: screen.height })),
        hardwareConcurrency: read(() => navigator.hardwareConcurrency),
        deviceMemory: read(() => navigator.deviceMemory),
        capabilities: {
            permissions: has(() => navigator.permissions && navigator.permissions.query),
            webrtc: has(() => window.RTCPeerConnection),
            mediaDevices: has(() => navigator.mediaDevices && navigator.mediaDevices.enumerateDevices),
            installedRelatedApps: has(() => navigator.getInstalledRelatedApps),
            audioContext: has(() => window.AudioContext || window.webkitAudioContext),
            offlineAudioContext: has(() => window.OfflineAudioContext || window.webkitOfflineAudioContext),
        },
        canvasSample: canvasSample,
    };
})()
"#;

/// Init script that logs interaction events from document start.
///
/// Entries are `{ kind, tMs, x, y, trusted }` with `tMs` relative to the
/// recorder's own start. The log is capped at 5000 entries.
pub const RECORDER_SCRIPT: &str = r#"
(() => {
    if (window.__botsenseEvents) return;
    const log = [];
    Object.defineProperty(window, '__botsenseEvents', { value: log, enumerable: false });
    const t0 = performance.now();
    const kinds = {
        mousemove: 'pointer_move', click: 'click', keydown: 'key_down', scroll: 'scroll',
        focus: 'focus', blur: 'blur', resize: 'resize',
        gesturestart: 'gesture', touchstart: 'touch',
    };
    const record = (e) => {
        if (log.length >= 5000) return;
        const entry = { kind: kinds[e.type], tMs: performance.now() - t0, trusted: e.isTrusted !== false };
        if (typeof e.clientX === 'number') {
            entry.x = e.clientX;
            entry.y = e.clientY;
        }
        log.push(entry);
    };
    for (const type of Object.keys(kinds)) {
        window.addEventListener(type, record, { capture: true, passive: true });
    }
})();
"#;

/// Capture a sensor snapshot from the current page.
pub async fn capture_snapshot(ctx: &dyn RenderContext) -> Result<SensorSnapshot> {
    let value = ctx.execute_js(SENSOR_SCRIPT).await.context("running sensor script")?;
    SensorSnapshot::from_json(value).context("decoding sensor snapshot")
}

/// Read the recorder's event log. A page without the recorder yields no events.
pub async fn capture_events(ctx: &dyn RenderContext) -> Result<Vec<InteractionEvent>> {
    let script = format!("(() => Array.from(window.{EVENT_LOG_GLOBAL} || []))()");
    let value = ctx.execute_js(&script).await.context("reading event log")?;
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).context("decoding event log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_fields_match_snapshot_names() {
        let encoded = serde_json::to_value(SensorSnapshot::default()).unwrap();
        for key in encoded.as_object().unwrap().keys() {
            assert!(SENSOR_SCRIPT.contains(&format!("{key}:")), "capture script misses {key}");
        }
    }

    #[test]
    fn test_recorder_kinds_decode() {
        for kind in ["pointer_move", "click", "key_down", "scroll", "focus", "blur", "resize", "gesture", "touch"] {
            assert!(RECORDER_SCRIPT.contains(&format!("'{kind}'")));
            let event: InteractionEvent =
                serde_json::from_value(serde_json::json!({ "kind": kind, "tMs": 1.5, "trusted": true })).unwrap();
            assert_eq!(event.t_ms, 1.5);
        }
    }
}
