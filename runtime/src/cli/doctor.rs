//! Environment readiness check for running scenarios.

use crate::cli::botsense_home;
use crate::cli::output::{self, Styled};
use crate::harness::builtin_suite;
use crate::renderer::find_chromium;
use anyhow::Result;
use serde_json::json;
use std::path::Path;
use std::process::Command;

/// Check the browser, sandbox, and output directory.
pub async fn run() -> Result<()> {
    let chromium = find_chromium();
    let version = chromium.as_deref().and_then(chromium_version);
    let sandbox_off = std::env::var("BOTSENSE_NO_SANDBOX").is_ok() || is_docker();
    let home = botsense_home();
    let home_writable = is_writable(&home);

    if output::is_json() {
        output::print_json(&json!({
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "version": version,
            "no_sandbox": sandbox_off,
            "home": home.display().to_string(),
            "home_writable": home_writable,
            "builtin_scenarios": builtin_suite().len(),
            "ready": chromium.is_some() && home_writable,
        }));
        return Ok(());
    }

    let s = Styled::new();
    let mut ready = true;
    output::print_header(&s);

    output::print_section(&s, "Browser");
    match &chromium {
        Some(path) => {
            let ver = version.as_deref().unwrap_or("unknown version");
            output::print_check(s.ok_sym(), "Chromium:", &format!("{ver} at {}", path.display()));
        }
        None => {
            output::print_check(s.fail_sym(), "Chromium:", "NOT FOUND");
            output::print_detail("Install Chrome or Chromium, or set BOTSENSE_CHROMIUM_PATH=/path/to/chrome");
            ready = false;
        }
    }
    if sandbox_off {
        output::print_check(s.warn_sym(), "Sandbox:", "disabled (container or BOTSENSE_NO_SANDBOX)");
    } else {
        output::print_check(s.ok_sym(), "Sandbox:", "enabled");
    }
    eprintln!();

    output::print_section(&s, "Output");
    if home_writable {
        output::print_check(s.ok_sym(), "Reports:", &home.join("reports").display().to_string());
    } else {
        output::print_check(s.fail_sym(), "Reports:", &format!("{} is not writable", home.display()));
        output::print_detail("Set BOTSENSE_HOME to a writable directory.");
        ready = false;
    }
    output::print_check(
        s.ok_sym(),
        "Scenarios:",
        &format!("{} built in", builtin_suite().len()),
    );

    if ready {
        output::print_status(&s, &s.green("ready"), "scenarios can run");
    } else {
        output::print_status(&s, &s.red("not ready"), "fix the items above");
    }
    Ok(())
}

fn chromium_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if output.status.success() {
        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(raw.replace("Google Chrome ", "").replace("Chromium ", ""))
    } else {
        None
    }
}

fn is_docker() -> bool {
    Path::new("/.dockerenv").exists()
        || std::fs::read_to_string("/proc/1/cgroup")
            .map(|s| s.contains("docker") || s.contains("containerd"))
            .unwrap_or(false)
}

/// Create the directory if needed and probe it with a scratch file.
fn is_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".doctor-probe");
    let ok = std::fs::write(&probe, b"ok").is_ok();
    let _ = std::fs::remove_file(&probe);
    ok
}
