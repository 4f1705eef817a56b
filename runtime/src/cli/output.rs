//! Shared CLI output formatting with colors, symbols, and per-scenario lines.

use crate::harness::{ScenarioReport, ScenarioResult};
use botsense::RiskLevel;
use std::io::IsTerminal;

/// Check if color output is enabled.
pub fn color_enabled() -> bool {
    // Respect NO_COLOR env (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("BOTSENSE_NO_COLOR").is_ok() {
        return false;
    }
    std::io::stderr().is_terminal()
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Colored string builder.
pub struct Styled {
    use_color: bool,
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

impl Styled {
    pub fn new() -> Self {
        Self {
            use_color: color_enabled(),
        }
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    pub fn ok_sym(&self) -> &str {
        if self.use_color {
            "\x1b[32m\u{2713}\x1b[0m"
        } else {
            "OK"
        }
    }

    pub fn fail_sym(&self) -> &str {
        if self.use_color {
            "\x1b[31m\u{2717}\x1b[0m"
        } else {
            "!!"
        }
    }

    pub fn warn_sym(&self) -> &str {
        if self.use_color {
            "\x1b[33m\u{26a0}\x1b[0m"
        } else {
            "??"
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    pub fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint(YELLOW, s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }

    /// Risk level colored by severity.
    pub fn level(&self, level: RiskLevel) -> String {
        let text = format!("{:<6}", level.as_str());
        match level {
            RiskLevel::Low => self.green(&text),
            RiskLevel::Medium => self.yellow(&text),
            RiskLevel::High => self.red(&text),
        }
    }
}

/// Print a branded header for CLI output.
pub fn print_header(s: &Styled) {
    eprintln!(
        "  {} {}",
        s.bold("botsense"),
        s.dim(&format!("v{}", env!("CARGO_PKG_VERSION")))
    );
    eprintln!();
}

/// Print a section header (e.g., "Browser", "Scenarios").
pub fn print_section(s: &Styled, title: &str) {
    eprintln!("  {}", s.bold(title));
}

/// Print a check result line with symbol and label/value.
pub fn print_check(symbol: &str, label: &str, value: &str) {
    eprintln!("    {symbol} {label:<16} {value}");
}

/// Print an indented detail/fix line under a check.
pub fn print_detail(msg: &str) {
    eprintln!("                        {msg}");
}

/// Print a status summary line at the bottom.
pub fn print_status(s: &Styled, status: &str, msg: &str) {
    eprintln!();
    eprintln!("  {}: {status} ({msg})", s.bold("Status"));
}

/// One console line for a finished scenario.
pub fn scenario_line(s: &Styled, report: &ScenarioReport) -> String {
    match &report.result {
        ScenarioResult::Snapshot(snapshot) => {
            let triggered = snapshot.triggered();
            let detail = if triggered.is_empty() {
                s.dim("no signals")
            } else {
                s.dim(&triggered.join(", "))
            };
            format!(
                "    {} {:<22} {} {:>5.1}/{:<5.1} {}",
                s.ok_sym(),
                report.scenario,
                s.level(snapshot.summary.level),
                snapshot.summary.score,
                snapshot.summary.max,
                detail
            )
        }
        ScenarioResult::Raw(_) => format!(
            "    {} {:<22} {}",
            s.warn_sym(),
            report.scenario,
            s.dim("page published a non-standard result")
        ),
        ScenarioResult::Error(failure) => {
            format!("    {} {:<22} {}", s.fail_sym(), report.scenario, s.red(&failure.error))
        }
    }
}

/// Check if --quiet mode is active.
pub fn is_quiet() -> bool {
    std::env::var("BOTSENSE_QUIET").is_ok()
}

/// Check if --json mode is active.
pub fn is_json() -> bool {
    std::env::var("BOTSENSE_JSON").is_ok()
}

/// Print JSON output to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) {
    if let Ok(s) = serde_json::to_string_pretty(value) {
        println!("{s}");
    }
}
