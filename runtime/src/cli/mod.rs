//! CLI subcommand implementations for the botsense binary.

pub mod doctor;
pub mod output;
pub mod run_cmd;
pub mod scenarios_cmd;
pub mod score_cmd;

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Get the botsense home directory (~/.botsense/).
pub fn botsense_home() -> PathBuf {
    if let Ok(p) = std::env::var("BOTSENSE_HOME") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".botsense")
}

fn env_filter() -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["botsense=info", "botsense_runtime=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Install the global subscriber: human-readable or JSON lines on stderr.
pub fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = installed {
        eprintln!("warning: logging already initialized: {e}");
    }
}
