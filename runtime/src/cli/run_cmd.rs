//! `botsense run`: execute the scenario suite against a target and persist
//! the report.

use crate::cli::botsense_home;
use crate::cli::output::{self, Styled};
use crate::harness::{builtin_suite, load_scenarios, Harness, HarnessOptions, ScenarioConfig};
use crate::renderer::ChromiumRenderer;
use anyhow::{bail, Context, Result};
use botsense::{Engine, LevelPolicy};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const MIN_WINDOW_MS: u64 = 5000;
pub const MAX_WINDOW_MS: u64 = 7000;

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// URL of the page under test.
    pub target: String,

    /// JSON file with a scenario list (defaults to the built-in suite).
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Only run scenarios with these names (repeatable).
    #[arg(long = "only")]
    pub only: Vec<String>,

    /// Where to write the report (default: $BOTSENSE_HOME/reports/<timestamp>.json).
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Activity window for local scoring, in milliseconds (5000-7000).
    #[arg(long, default_value_t = 6000)]
    pub window_ms: u64,

    /// Navigation timeout in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Run every scenario with a visible browser window.
    #[arg(long)]
    pub headful: bool,

    /// Do not score pages locally when they publish no diagnostics.
    #[arg(long)]
    pub no_local_engine: bool,

    /// Classify with raw score thresholds instead of the score/max ratio.
    #[arg(long)]
    pub legacy_levels: bool,
}

impl RunArgs {
    fn window(&self) -> Result<Duration> {
        if !(MIN_WINDOW_MS..=MAX_WINDOW_MS).contains(&self.window_ms) {
            bail!(
                "--window-ms must be between {MIN_WINDOW_MS} and {MAX_WINDOW_MS}, got {}",
                self.window_ms
            );
        }
        Ok(Duration::from_millis(self.window_ms))
    }

    /// Resolve the scenario list after filters and overrides.
    pub fn scenarios(&self) -> Result<Vec<ScenarioConfig>> {
        let mut scenarios = match &self.scenarios {
            Some(path) => load_scenarios(path)?,
            None => builtin_suite(),
        };
        if !self.only.is_empty() {
            for name in &self.only {
                if !scenarios.iter().any(|s| &s.name == name) {
                    bail!("unknown scenario '{name}'");
                }
            }
            scenarios.retain(|s| self.only.contains(&s.name));
        }
        if self.headful {
            for scenario in &mut scenarios {
                scenario.launch.headless = false;
            }
        }
        Ok(scenarios)
    }

    fn output_path(&self) -> PathBuf {
        self.out.clone().unwrap_or_else(|| {
            let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
            botsense_home().join("reports").join(format!("{stamp}.json"))
        })
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let window = args.window()?;
    url::Url::parse(&args.target).with_context(|| format!("invalid target URL '{}'", args.target))?;
    let scenarios = args.scenarios()?;

    let policy = if args.legacy_levels {
        LevelPolicy::legacy()
    } else {
        LevelPolicy::default()
    };
    let options = HarnessOptions {
        target: args.target.clone(),
        navigation_timeout_ms: args.timeout_ms,
        activity_window: window,
        local_engine: !args.no_local_engine,
    };
    let harness = Harness::new(Arc::new(ChromiumRenderer::from_env()), options)
        .with_engine(Engine::default().with_policy(policy));

    let s = Styled::new();
    let quiet = output::is_quiet();
    if !quiet {
        output::print_header(&s);
        output::print_section(&s, &format!("{} scenarios against {}", scenarios.len(), args.target));
    }

    let result = harness.run(&scenarios).await;

    if !quiet {
        for report in &result.results {
            eprintln!("{}", output::scenario_line(&s, report));
        }
    }

    let path = args.output_path();
    result.write_to(&path)?;
    info!("report written to {}", path.display());

    if output::is_json() {
        output::print_json(&result);
    } else if !quiet {
        output::print_status(&s, "done", &format!("report at {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            target: "https://example.com".into(),
            scenarios: None,
            only: Vec::new(),
            out: None,
            window_ms: 6000,
            timeout_ms: 30_000,
            headful: false,
            no_local_engine: false,
            legacy_levels: false,
        }
    }

    #[test]
    fn test_window_bounds() {
        assert!(args().window().is_ok());
        for bad in [4999, 7001] {
            let a = RunArgs { window_ms: bad, ..args() };
            assert!(a.window().is_err());
        }
    }

    #[test]
    fn test_only_filter_and_headful_override() {
        let a = RunArgs {
            only: vec!["forced-webdriver".into(), "grid-sweep-bot".into()],
            headful: true,
            ..args()
        };
        let scenarios = a.scenarios().unwrap();
        let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["forced-webdriver", "grid-sweep-bot"]);
        assert!(scenarios.iter().all(|s| !s.launch.headless));

        let unknown = RunArgs {
            only: vec!["nope".into()],
            ..args()
        };
        assert!(unknown.scenarios().is_err());
    }

    #[test]
    fn test_explicit_output_path() {
        let a = RunArgs {
            out: Some(PathBuf::from("/tmp/x.json")),
            ..args()
        };
        assert_eq!(a.output_path(), PathBuf::from("/tmp/x.json"));
    }
}
