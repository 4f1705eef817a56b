//! Scenario actions: drive the page after the first navigation.

use super::scenario::{Action, SyntheticEvent};
use crate::renderer::RenderContext;
use crate::stealth::behavior;
use anyhow::{anyhow, Context, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Execute one action against the loaded target.
pub async fn perform(ctx: &mut dyn RenderContext, action: &Action, target: &str, timeout_ms: u64) -> Result<()> {
    match action {
        Action::HumanLike { selector, text, moves } => {
            human_like(ctx, selector.as_deref(), text.as_deref(), *moves).await
        }
        Action::GridSweep {
            cols,
            rows,
            step_px,
            interval_ms,
        } => grid_sweep(ctx, *cols, *rows, *step_px, *interval_ms).await,
        Action::DispatchEvents { events } => {
            let js = build_dispatch_script(events);
            let dispatched = ctx.execute_js(&js).await.context("dispatching synthetic events")?;
            debug!("dispatched {} synthetic events", dispatched.as_u64().unwrap_or(0));
            Ok(())
        }
        Action::BlockRoutes { patterns } => {
            ctx.block_urls(patterns).await?;
            ctx.navigate(target, timeout_ms).await?;
            Ok(())
        }
        Action::NavigateWithQuery { param, value } => {
            let url = with_query(target, param, value)?;
            ctx.navigate(&url, timeout_ms).await?;
            Ok(())
        }
    }
}

async fn viewport(ctx: &dyn RenderContext) -> (f64, f64) {
    let value = ctx
        .execute_js("({ w: window.innerWidth, h: window.innerHeight })")
        .await
        .unwrap_or_default();
    let w = value.get("w").and_then(|v| v.as_f64()).unwrap_or(800.0);
    let h = value.get("h").and_then(|v| v.as_f64()).unwrap_or(600.0);
    (w.max(100.0), h.max(100.0))
}

async fn human_like(ctx: &mut dyn RenderContext, selector: Option<&str>, text: Option<&str>, moves: usize) -> Result<()> {
    let (width, height) = viewport(ctx).await;
    for (x, y) in behavior::jittered_path(moves, width, height) {
        ctx.mouse_move(x, y).await?;
        behavior::sleep_pointer_delay().await;
    }

    let Some(text) = text else {
        return Ok(());
    };

    if let Some(selector) = selector {
        let focused = ctx.execute_js(&build_focus_script(selector)).await?;
        if focused.as_bool() != Some(true) {
            warn!("no element matched '{selector}', typing into the document");
        }
    }

    behavior::sleep_action_delay().await;
    for ch in text.chars() {
        ctx.key_press(ch).await?;
        behavior::sleep_typing_delay().await;
    }
    Ok(())
}

async fn grid_sweep(ctx: &mut dyn RenderContext, cols: u32, rows: u32, step_px: f64, interval_ms: u64) -> Result<()> {
    if interval_ms == 0 {
        return Err(anyhow!("grid sweep interval must be positive"));
    }
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    for (x, y) in behavior::grid_path(cols, rows, step_px) {
        ticker.tick().await;
        ctx.mouse_move(x, y).await?;
    }
    Ok(())
}

/// Build a JavaScript snippet that focuses the first element matching `selector`.
fn build_focus_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector('{}');
            if (!el) return false;
            el.focus();
            return true;
        }})()"#,
        selector.replace('\\', "\\\\").replace('\'', "\\'")
    )
}

/// Build a JavaScript snippet that dispatches the events on `window` and
/// returns how many were sent.
fn build_dispatch_script(events: &[SyntheticEvent]) -> String {
    let statements: Vec<&str> = events
        .iter()
        .map(|event| match event {
            SyntheticEvent::Resize => "window.dispatchEvent(new Event('resize'));",
            SyntheticEvent::Blur => "window.dispatchEvent(new FocusEvent('blur'));",
            SyntheticEvent::Focus => "window.dispatchEvent(new FocusEvent('focus'));",
            SyntheticEvent::Gesture => "window.dispatchEvent(new Event('gesturestart'));",
            SyntheticEvent::Touch => "window.dispatchEvent(new Event('touchstart'));",
            SyntheticEvent::Click => {
                "window.dispatchEvent(new MouseEvent('click', { clientX: 10, clientY: 10 }));"
            }
            SyntheticEvent::PointerMove => {
                "window.dispatchEvent(new MouseEvent('mousemove', { clientX: 20, clientY: 20 }));"
            }
        })
        .collect();
    format!(
        "(() => {{\n{}\nreturn {};\n}})()",
        statements.join("\n"),
        events.len()
    )
}

/// Append `param=value` to the target's query string.
pub fn with_query(target: &str, param: &str, value: &str) -> Result<String> {
    let mut url = url::Url::parse(target).with_context(|| format!("invalid target URL '{target}'"))?;
    url.query_pairs_mut().append_pair(param, value);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query_appends() {
        assert_eq!(
            with_query("https://example.com/check", "bot", "1").unwrap(),
            "https://example.com/check?bot=1"
        );
        assert_eq!(
            with_query("https://example.com/?a=b", "force", "true").unwrap(),
            "https://example.com/?a=b&force=true"
        );
        assert!(with_query("not a url", "bot", "1").is_err());
    }

    #[test]
    fn test_dispatch_script() {
        let js = build_dispatch_script(&[SyntheticEvent::Resize, SyntheticEvent::Touch]);
        assert!(js.contains("new Event('resize')"));
        assert!(js.contains("new Event('touchstart')"));
        assert!(js.contains("return 2;"));
    }

    #[test]
    fn test_focus_script_escapes_quotes() {
        let js = build_focus_script("input[name='q']");
        assert!(js.contains(r"input[name=\'q\']"));
    }
}
