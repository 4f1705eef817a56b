//! Harness behavior against a scripted in-memory renderer.

use anyhow::{anyhow, Result};
use assert_json_diff::assert_json_include;
use async_trait::async_trait;
use botsense::RiskLevel;
use botsense_runtime::harness::capture::{RECORDER_SCRIPT, SENSOR_SCRIPT};
use botsense_runtime::harness::scenario::SyntheticEvent;
use botsense_runtime::harness::{
    Action, Harness, HarnessOptions, HarnessOutput, ScenarioConfig, ScenarioResult,
};
use botsense_runtime::renderer::{LaunchOptions, NavigationResult, RenderContext, Renderer};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const TARGET: &str = "https://detector.test/check";

#[derive(Default)]
struct Log {
    launches: Vec<LaunchOptions>,
    navigations: Vec<String>,
    blocked: Vec<String>,
    pointer_moves: usize,
    closes: usize,
}

#[derive(Clone, Default)]
struct PageScript {
    /// Value of the page-published global.
    global: Value,
    /// Text of the first diagnostics element.
    text: Value,
    sensors: Value,
    events: Value,
    fail_dispatch: bool,
    fail_navigation: bool,
    fail_evaluation: bool,
}

struct ScriptedRenderer {
    page: PageScript,
    fail_launch_at: Option<usize>,
    log: Arc<Mutex<Log>>,
}

impl ScriptedRenderer {
    fn new(page: PageScript) -> Self {
        Self {
            page,
            fail_launch_at: None,
            log: Arc::new(Mutex::new(Log::default())),
        }
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn RenderContext>> {
        let index = {
            let mut log = self.log.lock().unwrap();
            log.launches.push(options.clone());
            log.launches.len() - 1
        };
        if self.fail_launch_at == Some(index) {
            return Err(anyhow!("chromium exited during startup"));
        }
        Ok(Box::new(ScriptedContext {
            page: self.page.clone(),
            log: self.log.clone(),
        }))
    }
}

struct ScriptedContext {
    page: PageScript,
    log: Arc<Mutex<Log>>,
}

#[async_trait]
impl RenderContext for ScriptedContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        if self.page.fail_navigation {
            return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED"));
        }
        self.log.lock().unwrap().navigations.push(url.to_string());
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 12,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<Value> {
        if self.page.fail_evaluation {
            return Err(anyhow!("execution context was destroyed"));
        }
        if script.contains("dispatchEvent") {
            if self.page.fail_dispatch {
                return Err(anyhow!("Uncaught TypeError: Illegal constructor"));
            }
            return Ok(json!(1));
        }
        if script == SENSOR_SCRIPT {
            return Ok(self.page.sensors.clone());
        }
        if script.contains("__botDetection") {
            return Ok(self.page.global.clone());
        }
        if script.contains("#bot-diagnostics") {
            return Ok(self.page.text.clone());
        }
        if script.contains("__botsenseEvents") {
            return Ok(self.page.events.clone());
        }
        if script.contains("innerWidth") {
            return Ok(json!({ "w": 800, "h": 600 }));
        }
        Ok(Value::Null)
    }

    async fn mouse_move(&self, _x: f64, _y: f64) -> Result<()> {
        self.log.lock().unwrap().pointer_moves += 1;
        Ok(())
    }

    async fn key_press(&self, _key: char) -> Result<()> {
        Ok(())
    }

    async fn block_urls(&mut self, patterns: &[String]) -> Result<()> {
        self.log.lock().unwrap().blocked.extend(patterns.iter().cloned());
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

fn published_snapshot() -> Value {
    json!({
        "summary": { "score": 3.0, "max": 4.0, "level": "high" },
        "signals": [
            { "id": "webdriver", "name": "Automation flag", "suspicious": true, "weight": 3.0 },
            { "id": "plugins", "name": "Plugins", "suspicious": false, "weight": 1.0 }
        ]
    })
}

fn clean_sensors() -> Value {
    json!({
        "webdriver": false,
        "userAgent": "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "platform": "Linux x86_64",
        "languages": ["en-US", "en"],
        "pluginCount": 5,
        "automationGlobals": [],
        "webglVendor": "Google Inc. (NVIDIA)",
        "webglRenderer": "ANGLE (NVIDIA, NVIDIA GeForce RTX 3060 Direct3D11 vs_5_0 ps_5_0)",
        "maxTouchPoints": 0,
        "timezone": "Europe/Berlin",
        "screen": { "width": 1920, "height": 1080 },
        "hardwareConcurrency": 8,
        "deviceMemory": 8,
        "capabilities": {
            "permissions": true,
            "webrtc": true,
            "mediaDevices": true,
            "installedRelatedApps": true,
            "audioContext": true,
            "offlineAudioContext": true
        }
    })
}

fn quick(name: &str) -> ScenarioConfig {
    ScenarioConfig::new(name).settle_ms(0)
}

fn harness(renderer: ScriptedRenderer) -> (Harness, Arc<Mutex<Log>>) {
    let log = renderer.log.clone();
    (Harness::new(Arc::new(renderer), HarnessOptions::new(TARGET)), log)
}

#[tokio::test]
async fn failing_action_does_not_abort_any_scenario() {
    let renderer = ScriptedRenderer::new(PageScript {
        global: published_snapshot(),
        fail_dispatch: true,
        ..Default::default()
    });
    let (harness, log) = harness(renderer);

    let scenarios = vec![
        quick("first"),
        quick("throws").action(Action::DispatchEvents {
            events: vec![SyntheticEvent::Resize],
        }),
        quick("third"),
    ];
    let output = harness.run(&scenarios).await;

    assert_eq!(output.results.len(), 3);
    let names: Vec<&str> = output.results.iter().map(|r| r.scenario.as_str()).collect();
    assert_eq!(names, vec!["first", "throws", "third"]);
    for report in &output.results {
        assert_eq!(report.result.snapshot().unwrap().summary.level, RiskLevel::High);
    }
    assert_eq!(log.lock().unwrap().closes, 3);
}

#[tokio::test]
async fn launch_failure_is_isolated() {
    let mut renderer = ScriptedRenderer::new(PageScript {
        global: published_snapshot(),
        ..Default::default()
    });
    renderer.fail_launch_at = Some(1);
    let (harness, log) = harness(renderer);

    let output = harness.run(&[quick("a"), quick("b"), quick("c")]).await;

    assert_eq!(output.results.len(), 3);
    assert!(output.results[0].result.snapshot().is_some());
    match &output.results[1].result {
        ScenarioResult::Error(report) => assert!(report.error.contains("chromium exited during startup")),
        other => panic!("expected error, got {other:?}"),
    }
    assert!(output.results[2].result.snapshot().is_some());
    assert_eq!(log.lock().unwrap().closes, 2);
}

#[tokio::test]
async fn navigation_failure_reports_error_and_closes_browser() {
    let renderer = ScriptedRenderer::new(PageScript {
        fail_navigation: true,
        ..Default::default()
    });
    let (harness, log) = harness(renderer);

    let output = harness.run(&[quick("offline")]).await;

    assert!(output.results[0].result.is_error());
    assert_eq!(log.lock().unwrap().closes, 1);
}

#[tokio::test]
async fn every_launch_carries_the_recorder_first() {
    let renderer = ScriptedRenderer::new(PageScript::default());
    let (harness, log) = harness(renderer);

    let scenarios: Vec<ScenarioConfig> = botsense_runtime::harness::builtin_suite()
        .into_iter()
        .filter(|s| s.name == "forced-webdriver" || s.name == "mobile-emulated")
        .map(|s| s.settle_ms(0))
        .collect();
    harness.run(&scenarios).await;

    let log = log.lock().unwrap();
    assert_eq!(log.launches.len(), 2);
    for launch in &log.launches {
        assert_eq!(launch.init_scripts[0], RECORDER_SCRIPT);
    }
    assert_eq!(log.launches[0].init_scripts.len(), 2);
    assert!(log.launches[1].device.as_ref().unwrap().mobile);
}

#[tokio::test]
async fn global_is_preferred_over_text() {
    let renderer = ScriptedRenderer::new(PageScript {
        global: published_snapshot(),
        text: json!(r#"{"verdict": "from text"}"#),
        ..Default::default()
    });
    let (harness, _) = harness(renderer);

    let output = harness.run(&[quick("s")]).await;
    let snapshot = output.results[0].result.snapshot().unwrap();
    assert_eq!(snapshot.summary.score, 3.0);
}

#[tokio::test]
async fn text_is_used_when_no_global() {
    let renderer = ScriptedRenderer::new(PageScript {
        text: json!(r#" {"verdict": "from text"} "#),
        ..Default::default()
    });
    let (harness, _) = harness(renderer);

    let output = harness.run(&[quick("s")]).await;
    assert_eq!(output.results[0].result, ScenarioResult::Raw(json!({ "verdict": "from text" })));
}

#[tokio::test]
async fn local_engine_scores_silent_pages() {
    let events: Vec<Value> = (0..30)
        .map(|i| {
            let gap = 100.0 + ((i * 37) % 300) as f64;
            json!({ "kind": "pointer_move", "tMs": i as f64 * 400.0 + gap, "x": i * 13, "y": 200 + (i % 7) * 11 })
        })
        .collect();
    let renderer = ScriptedRenderer::new(PageScript {
        sensors: clean_sensors(),
        events: Value::Array(events),
        ..Default::default()
    });
    let (harness, _) = harness(renderer);

    let output = harness.run(&[quick("silent")]).await;
    let snapshot = output.results[0].result.snapshot().unwrap();

    assert!(snapshot.signal("activity_no_input").is_some());
    assert!(!snapshot.signal("activity_no_input").unwrap().suspicious);
    assert!(!snapshot.signal("webdriver").unwrap().suspicious);
    assert_eq!(snapshot.summary.level, RiskLevel::Low);
}

#[tokio::test]
async fn disabled_local_engine_yields_empty_shape() {
    let renderer = ScriptedRenderer::new(PageScript::default());
    let log = renderer.log.clone();
    let mut options = HarnessOptions::new(TARGET);
    options.local_engine = false;
    let harness = Harness::new(Arc::new(renderer), options);

    let output = harness.run(&[quick("s")]).await;
    let snapshot = output.results[0].result.snapshot().unwrap();
    assert!(snapshot.signals.is_empty());
    assert_eq!(snapshot.summary.max, 0.0);
    assert_eq!(snapshot.summary.level, RiskLevel::Low);
    assert_eq!(log.lock().unwrap().closes, 1);
}

#[tokio::test]
async fn unreadable_page_yields_error_result() {
    let renderer = ScriptedRenderer::new(PageScript {
        fail_evaluation: true,
        ..Default::default()
    });
    let (harness, _) = harness(renderer);

    let output = harness.run(&[quick("s")]).await;
    match &output.results[0].result {
        ScenarioResult::Error(report) => assert!(report.error.contains("execution context was destroyed")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn route_and_query_actions_renavigate() {
    let renderer = ScriptedRenderer::new(PageScript {
        global: published_snapshot(),
        ..Default::default()
    });
    let (harness, log) = harness(renderer);

    let scenarios = vec![
        quick("blocked").action(Action::BlockRoutes {
            patterns: vec!["*.js".into()],
        }),
        quick("query").action(Action::NavigateWithQuery {
            param: "bot".into(),
            value: "1".into(),
        }),
        quick("grid").action(Action::GridSweep {
            cols: 4,
            rows: 3,
            step_px: 10.0,
            interval_ms: 1,
        }),
    ];
    harness.run(&scenarios).await;

    let log = log.lock().unwrap();
    assert_eq!(log.blocked, vec!["*.js".to_string()]);
    assert_eq!(
        log.navigations,
        vec![
            TARGET.to_string(),
            TARGET.to_string(),
            TARGET.to_string(),
            format!("{TARGET}?bot=1"),
            TARGET.to_string(),
        ]
    );
    assert_eq!(log.pointer_moves, 12);
}

#[tokio::test]
async fn output_shape_and_persistence() {
    let mut renderer = ScriptedRenderer::new(PageScript {
        global: published_snapshot(),
        ..Default::default()
    });
    renderer.fail_launch_at = Some(1);
    let (harness, _) = harness(renderer);

    let output = harness.run(&[quick("ok"), quick("broken")]).await;
    let value = serde_json::to_value(&output).unwrap();

    assert_json_include!(
        actual: value.clone(),
        expected: json!({
            "target": TARGET,
            "results": [
                {
                    "scenario": "ok",
                    "result": {
                        "summary": { "score": 3.0, "max": 4.0, "level": "high" },
                        "signals": [{ "id": "webdriver", "suspicious": true, "weight": 3.0 }]
                    }
                },
                { "scenario": "broken", "result": { "error": "launching browser: chromium exited during startup" } }
            ]
        })
    );
    assert!(value["results"][0]["timestamp"].is_string());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports/nested/run.json");
    output.write_to(&path).unwrap();
    let restored = HarnessOutput::read_from(&path).unwrap();
    assert_eq!(restored, output);
}
