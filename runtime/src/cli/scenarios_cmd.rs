//! `botsense scenarios`: list or export the scenario suite.

use crate::cli::output::{self, Styled};
use crate::harness::{builtin_suite, load_scenarios, Action};
use anyhow::Result;
use std::path::PathBuf;

pub async fn run(file: Option<PathBuf>) -> Result<()> {
    let scenarios = match &file {
        Some(path) => load_scenarios(path)?,
        None => builtin_suite(),
    };

    if output::is_json() {
        output::print_json(&scenarios);
        return Ok(());
    }

    let s = Styled::new();
    output::print_header(&s);
    output::print_section(&s, &format!("{} scenarios", scenarios.len()));
    for scenario in &scenarios {
        let mut traits = Vec::new();
        traits.push(if scenario.launch.headless { "headless" } else { "headful" }.to_string());
        if let Some(device) = &scenario.launch.device {
            traits.push(format!("device={device}"));
        }
        if scenario.launch.user_agent.is_some() {
            traits.push("spoofed-ua".into());
        }
        if scenario.launch.init_script.is_some() {
            traits.push("init-script".into());
        }
        if let Some(action) = &scenario.action {
            traits.push(action_name(action).into());
        }
        output::print_check(s.ok_sym(), &scenario.name, &s.dim(&traits.join(" ")));
    }
    Ok(())
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::HumanLike { .. } => "human_like",
        Action::GridSweep { .. } => "grid_sweep",
        Action::DispatchEvents { .. } => "dispatch_events",
        Action::BlockRoutes { .. } => "block_routes",
        Action::NavigateWithQuery { .. } => "navigate_with_query",
    }
}
