//! Chromium renderer over the DevTools protocol (chromiumoxide).

use super::{LaunchOptions, NavigationResult, RenderContext, Renderer};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams as FetchEnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Find a Chromium binary by checking multiple locations.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. Explicit override
    if let Ok(p) = std::env::var("BOTSENSE_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS locations
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Whether the sandbox should be disabled (containers usually need this).
fn no_sandbox_requested() -> bool {
    std::env::var("BOTSENSE_NO_SANDBOX").is_ok() || std::path::Path::new("/.dockerenv").exists()
}

/// Launches one fresh Chromium process per call.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    no_sandbox: bool,
}

impl ChromiumRenderer {
    pub fn new(executable: Option<PathBuf>, no_sandbox: bool) -> Self {
        Self {
            executable,
            no_sandbox,
        }
    }

    /// Configure from `BOTSENSE_CHROMIUM_PATH` / `BOTSENSE_NO_SANDBOX`.
    pub fn from_env() -> Self {
        Self::new(find_chromium(), no_sandbox_requested())
    }
}

/// Per-launch profile directory, removed when dropped.
#[derive(Debug)]
struct ProfileDir(PathBuf);

impl ProfileDir {
    fn new_in(parent: &Path) -> Self {
        Self(parent.join(format!("botsense-{}", uuid::Uuid::new_v4())))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("removing profile {}: {e}", self.0.display());
            }
        }
    }
}

/// Open the page and apply device, identity and init-script overrides.
async fn prepare_page(browser: &Browser, options: &LaunchOptions) -> Result<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .context("opening page")?;

    if let Some(device) = &options.device {
        page.execute(SetDeviceMetricsOverrideParams::new(
            device.width as i64,
            device.height as i64,
            device.device_scale_factor,
            device.mobile,
        ))
        .await
        .context("applying device metrics")?;

        if device.max_touch_points > 0 {
            let touch = SetTouchEmulationEnabledParams::builder()
                .enabled(true)
                .max_touch_points(device.max_touch_points as i64)
                .build()
                .map_err(anyhow::Error::msg)?;
            page.execute(touch).await.context("enabling touch emulation")?;
        }
    }

    if let Some(ua) = options.effective_user_agent() {
        page.execute(SetUserAgentOverrideParams::new(ua))
            .await
            .context("overriding user agent")?;
    }

    for script in &options.init_scripts {
        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(script.clone()))
            .await
            .context("installing init script")?;
    }
    Ok(page)
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn RenderContext>> {
        // A private profile directory per launch keeps scenarios from sharing
        // cookies, storage, or cache.
        let profile_dir = ProfileDir::new_in(&std::env::temp_dir());

        let mut builder = BrowserConfig::builder().user_data_dir(profile_dir.path());
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        if self.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(device) = &options.device {
            builder = builder.window_size(device.width, device.height);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("invalid browser config: {e}"))?;

        let started = Instant::now();
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("launching Chromium")?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler: {e}");
                }
            }
        });

        let page = match prepare_page(&browser, options).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    debug!("closing browser after failed setup: {close_err}");
                }
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(e);
            }
        };

        info!(
            headless = options.headless,
            device = options.device.as_ref().map(|d| d.name.as_str()).unwrap_or("default"),
            "browser launched in {}ms",
            started.elapsed().as_millis()
        );

        Ok(Box::new(ChromiumContext {
            browser,
            page,
            handler_task,
            interceptor: None,
            profile_dir,
        }))
    }
}

struct ChromiumContext {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    interceptor: Option<JoinHandle<()>>,
    profile_dir: ProfileDir,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let started = Instant::now();
        tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url))
            .await
            .map_err(|_| anyhow!("navigation to {url} timed out after {timeout_ms}ms"))?
            .with_context(|| format!("navigating to {url}"))?;

        let final_url = self.page.url().await?.unwrap_or_else(|| url.to_string());
        Ok(NavigationResult {
            final_url,
            load_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(anyhow::Error::msg)?;
        let result = self.page.evaluate_expression(params).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn mouse_move(&self, x: f64, y: f64) -> Result<()> {
        self.page
            .execute(DispatchMouseEventParams::new(DispatchMouseEventType::MouseMoved, x, y))
            .await?;
        Ok(())
    }

    async fn key_press(&self, key: char) -> Result<()> {
        let text = key.to_string();
        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key(text.clone())
            .text(text.clone())
            .build()
            .map_err(anyhow::Error::msg)?;
        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(text)
            .build()
            .map_err(anyhow::Error::msg)?;
        self.page.execute(down).await?;
        self.page.execute(up).await?;
        Ok(())
    }

    async fn block_urls(&mut self, patterns: &[String]) -> Result<()> {
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .context("subscribing to paused requests")?;

        let mut enable = FetchEnableParams::builder();
        for pattern in patterns {
            enable = enable.pattern(RequestPattern::builder().url_pattern(pattern.clone()).build());
        }
        self.page
            .execute(enable.build())
            .await
            .context("enabling request interception")?;

        // Only matching requests are paused, so every paused request is failed.
        let page = self.page.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                debug!("blocking {}", event.request.url);
                let fail = FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
                if let Err(e) = page.execute(fail).await {
                    warn!("failed to block request: {e}");
                }
            }
        });
        if let Some(previous) = self.interceptor.replace(task) {
            previous.abort();
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut this = *self;
        let closed = this.browser.close().await.context("closing browser");
        let _ = this.browser.wait().await;
        if let Some(task) = this.interceptor.take() {
            task.abort();
        }
        this.handler_task.abort();
        drop(this.profile_dir);
        closed.map(|_| ())
    }
}
