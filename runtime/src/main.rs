// Copyright 2026 Botsense Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use botsense_runtime::cli;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "botsense", version, about = "Score browser sessions for automation and probe detectors with adversarial scenarios")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Print machine-readable JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress console output other than errors.
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scenario suite against a target URL.
    Run(cli::run_cmd::RunArgs),

    /// List the scenarios a run would execute.
    Scenarios {
        /// Scenario file to list instead of the built-in suite.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Score a captured sensor snapshot offline.
    Score {
        /// Snapshot JSON as returned by the capture script.
        snapshot: PathBuf,

        /// Recorded event log to replay through the activity probe.
        #[arg(long)]
        events: Option<PathBuf>,

        #[arg(long, default_value_t = 6000)]
        window_ms: u64,

        #[arg(long)]
        legacy_levels: bool,
    },

    /// Check that Chromium and the output directory are usable.
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Output helpers read these from the environment.
    if args.json {
        std::env::set_var("BOTSENSE_JSON", "1");
    }
    if args.quiet {
        std::env::set_var("BOTSENSE_QUIET", "1");
    }
    if args.no_color {
        std::env::set_var("BOTSENSE_NO_COLOR", "1");
    }
    cli::init_tracing(args.log_json);

    match args.command {
        Command::Run(run) => cli::run_cmd::run(run).await,
        Command::Scenarios { file } => cli::scenarios_cmd::run(file).await,
        Command::Score {
            snapshot,
            events,
            window_ms,
            legacy_levels,
        } => cli::score_cmd::run(&snapshot, events.as_deref(), window_ms, legacy_levels).await,
        Command::Doctor => cli::doctor::run().await,
    }
}
