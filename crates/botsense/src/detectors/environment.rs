//! Environment-plausibility detectors.
//!
//! Each check looks for a host property that real browsers on real hardware
//! almost always have and automation environments often lack or fake badly.

use crate::signal::Signal;
use crate::snapshot::SensorSnapshot;
use fnv::FnvHasher;
use std::hash::Hasher;

/// Renderer signatures of software rasterizers and virtual GPUs.
pub const RENDERER_BLACKLIST: &[&str] = &[
    "swiftshader",
    "llvmpipe",
    "softpipe",
    "software",
    "virtualbox",
    "vmware",
    "parallels",
    "mesa offscreen",
    "microsoft basic render",
];

pub const MIN_SCREEN_WIDTH: u32 = 300;
pub const MAX_SCREEN_WIDTH: u32 = 7680;
pub const MIN_SCREEN_HEIGHT: u32 = 200;
pub const MAX_SCREEN_HEIGHT: u32 = 4320;

/// Upper bound (exclusive) of the canvas hash band treated as anomalous.
pub const CANVAS_HASH_BAND: u32 = 1 << 23;

/// Touch points a desktop identity may claim before it looks odd.
const DESKTOP_TOUCH_LIMIT: u32 = 5;

fn flagged(signal: Signal, details: impl Into<String>) -> Signal {
    Signal {
        suspicious: true,
        ..signal
    }
    .with_details(details)
}

/// Zero installed plugins. Mobile browsers legitimately expose none, so the
/// weight drops there.
pub fn plugins(snapshot: &SensorSnapshot) -> Signal {
    let weight = if snapshot.is_mobile() { 0.25 } else { 1.0 };
    let signal = Signal::new("plugins", "No browser plugins", false, weight);
    match snapshot.plugin_count {
        Some(0) => flagged(signal, "0 plugins"),
        Some(n) => signal.with_details(format!("{n} plugins")),
        None => flagged(signal, "plugin list unavailable"),
    }
}

/// Whether a language tag has a plausible BCP-47 shape (`en`, `en-US`, `zh-Hant-TW`).
fn is_well_formed_language(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let Some(primary) = parts.next() else {
        return false;
    };
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    parts.all(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Empty or malformed locale list.
pub fn languages(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("languages", "Empty or malformed languages", false, 1.0);
    match snapshot.languages.as_deref() {
        None => flagged(signal, "languages unavailable"),
        Some([]) => flagged(signal, "empty list"),
        Some(langs) => {
            let bad: Vec<&str> = langs
                .iter()
                .map(String::as_str)
                .filter(|l| !is_well_formed_language(l))
                .collect();
            if bad.is_empty() {
                signal.with_details(langs.join(","))
            } else {
                flagged(signal, format!("malformed: {}", bad.join(",")))
            }
        }
    }
}

/// Software rasterizer or virtual GPU in the WebGL renderer string.
pub fn webgl_renderer(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("webgl_renderer", "Software or virtualized GPU", false, 2.0);
    let Some(renderer) = snapshot.webgl_renderer.as_deref() else {
        return flagged(signal, "WebGL unavailable");
    };

    let haystack = format!(
        "{} {}",
        renderer.to_lowercase(),
        snapshot.webgl_vendor.as_deref().unwrap_or("").to_lowercase()
    );
    match RENDERER_BLACKLIST.iter().find(|sig| haystack.contains(*sig)) {
        Some(sig) => flagged(signal, format!("{renderer} (matched {sig})")),
        None => signal.with_details(renderer.to_string()),
    }
}

/// Touch capability that contradicts the platform class.
///
/// A mobile identity with no touch points is strong evidence of a spoofed
/// device; a desktop with a touch screen only mildly unusual.
pub fn touch_platform(snapshot: &SensorSnapshot) -> Signal {
    let mobile = snapshot.is_mobile();
    let weight = if mobile { 2.0 } else { 0.5 };
    let signal = Signal::new("touch_platform", "Touch support vs platform mismatch", false, weight);

    match (mobile, snapshot.max_touch_points) {
        (_, None) => flagged(signal, "maxTouchPoints unavailable"),
        (true, Some(0)) => flagged(signal, "mobile identity with 0 touch points"),
        (false, Some(n)) if n >= DESKTOP_TOUCH_LIMIT => {
            flagged(signal, format!("desktop identity with {n} touch points"))
        }
        (_, Some(n)) => signal.with_details(format!("{n} touch points")),
    }
}

/// Missing or truncated timezone name.
pub fn timezone(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("timezone", "Missing timezone", false, 1.0);
    match snapshot.timezone.as_deref().map(str::trim) {
        Some(tz) if tz.len() >= 3 => signal.with_details(tz.to_string()),
        Some(tz) => flagged(signal, format!("short timezone '{tz}'")),
        None => flagged(signal, "timezone unavailable"),
    }
}

/// Screen dimensions outside the envelope of real displays.
pub fn screen(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("screen", "Implausible screen size", false, 1.0);
    let Some(size) = snapshot.screen else {
        return flagged(signal, "screen unavailable");
    };

    let details = format!("{}x{}", size.width, size.height);
    let plausible = (MIN_SCREEN_WIDTH..=MAX_SCREEN_WIDTH).contains(&size.width)
        && (MIN_SCREEN_HEIGHT..=MAX_SCREEN_HEIGHT).contains(&size.height);
    if plausible {
        signal.with_details(details)
    } else {
        flagged(signal, details)
    }
}

/// Low core count combined with low memory, typical of small VMs.
pub fn hardware(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("hardware", "Low-resource hardware", false, 0.5);
    match (snapshot.hardware_concurrency, snapshot.device_memory) {
        (Some(cores), Some(mem)) => {
            let details = format!("{cores} cores, {mem} GB");
            if cores <= 2 && mem <= 2.0 {
                flagged(signal, details)
            } else {
                signal.with_details(details)
            }
        }
        (Some(cores), None) if cores <= 2 => {
            flagged(signal, format!("{cores} cores, deviceMemory unavailable"))
        }
        (Some(cores), None) => signal.with_details(format!("{cores} cores")),
        (None, _) => flagged(signal, "hardwareConcurrency unavailable"),
    }
}

/// Browser APIs that headless and stripped-down builds tend to lack.
pub fn capabilities(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("capabilities", "Missing browser capabilities", false, 1.0);
    let caps = &snapshot.capabilities;
    let checks = [
        ("permissions", caps.permissions),
        ("webrtc", caps.webrtc),
        ("mediaDevices", caps.media_devices),
        ("getInstalledRelatedApps", caps.installed_related_apps),
    ];

    let missing: Vec<&str> = checks
        .iter()
        .filter(|(_, present)| *present != Some(true))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        signal
    } else {
        flagged(signal, format!("missing: {}", missing.join(", ")))
    }
}

/// 64-bit FNV-1a hash of the rendered canvas sample, xor-folded to 32 bits.
pub fn canvas_hash(sample: &str) -> u32 {
    let mut hasher = FnvHasher::default();
    hasher.write(sample.as_bytes());
    let h = hasher.finish();
    (h ^ (h >> 32)) as u32
}

/// Weak anomaly proxy: the rendering fingerprint lands in a narrow band
/// that blank or stubbed canvases tend to hash into.
pub fn canvas_fingerprint(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("canvas_fingerprint", "Canvas fingerprint anomaly", false, 0.5);
    match snapshot.canvas_sample.as_deref() {
        None | Some("") => flagged(signal, "canvas unavailable"),
        Some(sample) => {
            let hash = canvas_hash(sample);
            let details = format!("{hash:08x}");
            if hash < CANVAS_HASH_BAND {
                flagged(signal, details)
            } else {
                signal.with_details(details)
            }
        }
    }
}

/// Audio subsystem availability.
pub fn audio(snapshot: &SensorSnapshot) -> Signal {
    let signal = Signal::new("audio", "Audio subsystem missing", false, 1.0);
    let caps = &snapshot.capabilities;
    if caps.audio_context == Some(true) || caps.offline_audio_context == Some(true) {
        signal
    } else {
        flagged(signal, "no AudioContext")
    }
}
