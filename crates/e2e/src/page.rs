//! Page driver for one browser tab
//!
//! Everything is layered on `Page.navigate` and `Runtime.evaluate`; element
//! assertions retry until a deadline, since the console renders
//! asynchronously after navigation. Evaluation failures while an old
//! execution context is torn down count as "not yet" and are retried.

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::debug;

use crate::cdp::CdpSession;
use crate::error::{E2eError, E2eResult};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_ASSERT_TIMEOUT: Duration = Duration::from_secs(5);
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Driver for one browser tab, exclusively owning its DevTools session.
pub struct Page {
    session: CdpSession,
    assert_timeout: Duration,
}

impl Page {
    /// Attach to a tab by its WebSocket debugger URL.
    pub async fn connect(ws_url: &str) -> E2eResult<Self> {
        let session = CdpSession::connect(ws_url).await?;
        Ok(Self {
            session,
            assert_timeout: DEFAULT_ASSERT_TIMEOUT,
        })
    }

    /// Override the deadline used by the `expect_*` helpers.
    pub fn with_assert_timeout(mut self, timeout: Duration) -> Self {
        self.assert_timeout = timeout;
        self
    }

    /// The DevTools endpoint of this tab, for attaching auxiliary sessions.
    pub fn ws_url(&self) -> &str {
        self.session.ws_url()
    }

    /// Navigate and wait for the document to finish loading.
    pub async fn goto(&mut self, url: &str) -> E2eResult<()> {
        debug!("goto {}", url);
        let result = self
            .session
            .send("Page.navigate", json!({ "url": url }))
            .await?;
        if let Some(error) = result.get("errorText").and_then(Value::as_str) {
            if !error.is_empty() {
                return Err(E2eError::Script(format!(
                    "navigation to {} failed: {}",
                    url, error
                )));
            }
        }
        self.wait_for_load().await
    }

    /// Wait until `document.readyState` reports a complete load.
    pub async fn wait_for_load(&mut self) -> E2eResult<()> {
        let deadline = Instant::now() + NAVIGATION_TIMEOUT;
        while Instant::now() < deadline {
            if let Ok(state) = self.evaluate("document.readyState").await {
                if state.as_str() == Some("complete") {
                    return Ok(());
                }
            }
            sleep(POLL_INTERVAL).await;
        }
        Err(E2eError::Timeout("page load".to_string()))
    }

    /// Evaluate a JavaScript expression and return its value.
    pub async fn evaluate(&mut self, expression: &str) -> E2eResult<Value> {
        let result = self
            .session
            .send(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;
        if let Some(details) = result.get("exceptionDetails") {
            let text = details
                .pointer("/exception/description")
                .and_then(Value::as_str)
                .unwrap_or("unknown exception");
            return Err(E2eError::Script(text.to_string()));
        }
        Ok(result.pointer("/result/value").cloned().unwrap_or(Value::Null))
    }

    /// Click the first element matching `selector`.
    pub async fn click(&mut self, selector: &str) -> E2eResult<()> {
        debug!("click {}", selector);
        let expr = format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return false; el.click(); return true; }})()",
            sel = js_string(selector)
        );
        match self.evaluate(&expr).await?.as_bool() {
            Some(true) => Ok(()),
            _ => Err(E2eError::ElementNotFound(selector.to_string())),
        }
    }

    /// Fill an input, dispatching the events framework bindings listen for.
    pub async fn fill(&mut self, selector: &str, value: &str) -> E2eResult<()> {
        debug!("fill {}", selector);
        let expr = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                const setter = Object.getOwnPropertyDescriptor(window.HTMLInputElement.prototype, 'value').set;
                setter.call(el, {value});
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_string(selector),
            value = js_string(value)
        );
        match self.evaluate(&expr).await?.as_bool() {
            Some(true) => Ok(()),
            _ => Err(E2eError::ElementNotFound(selector.to_string())),
        }
    }

    /// Number of elements matching `selector`.
    pub async fn count(&mut self, selector: &str) -> E2eResult<usize> {
        let expr = format!(
            "document.querySelectorAll({}).length",
            js_string(selector)
        );
        Ok(self.evaluate(&expr).await?.as_u64().unwrap_or(0) as usize)
    }

    /// Rendered text of the first match, `None` when nothing matches.
    pub async fn text(&mut self, selector: &str) -> E2eResult<Option<String>> {
        let expr = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
            js_string(selector)
        );
        Ok(self.evaluate(&expr).await?.as_str().map(String::from))
    }

    /// Whether the first match is rendered (has layout boxes).
    pub async fn is_visible(&mut self, selector: &str) -> E2eResult<bool> {
        let expr = format!(
            "(() => {{ const el = document.querySelector({}); return !!(el && el.getClientRects().length > 0); }})()",
            js_string(selector)
        );
        Ok(self.evaluate(&expr).await?.as_bool().unwrap_or(false))
    }

    /// Wait until the selector matches a visible element.
    pub async fn wait_for(&mut self, selector: &str, timeout: Duration) -> E2eResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(true) = self.is_visible(selector).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::Timeout(selector.to_string()));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Assert the selector becomes visible within the assertion deadline.
    pub async fn expect_visible(&mut self, selector: &str) -> E2eResult<()> {
        let deadline = Instant::now() + self.assert_timeout;
        loop {
            if let Ok(true) = self.is_visible(selector).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::AssertionFailed(format!(
                    "{} is not visible",
                    selector
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Assert the selector matches nothing, or only elements without layout.
    pub async fn expect_hidden(&mut self, selector: &str) -> E2eResult<()> {
        let deadline = Instant::now() + self.assert_timeout;
        loop {
            if let Ok(false) = self.is_visible(selector).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::AssertionFailed(format!(
                    "{} is still visible",
                    selector
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Assert the selector settles on exactly `expected` matches.
    pub async fn expect_count(&mut self, selector: &str, expected: usize) -> E2eResult<()> {
        let deadline = Instant::now() + self.assert_timeout;
        let mut last: Option<usize> = None;
        loop {
            match self.count(selector).await {
                Ok(n) if n == expected => return Ok(()),
                Ok(n) => last = Some(n),
                Err(_) => {}
            }
            if Instant::now() >= deadline {
                return Err(E2eError::AssertionFailed(format!(
                    "{} matched {} element(s), expected {}",
                    selector,
                    last.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string()),
                    expected
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Assert the first match's rendered text contains `needle`.
    pub async fn expect_text_contains(&mut self, selector: &str, needle: &str) -> E2eResult<()> {
        let deadline = Instant::now() + self.assert_timeout;
        let mut last: Option<String> = None;
        loop {
            match self.text(selector).await {
                Ok(Some(text)) if text.contains(needle) => return Ok(()),
                Ok(text) => last = text,
                Err(_) => {}
            }
            if Instant::now() >= deadline {
                return Err(E2eError::AssertionFailed(format!(
                    "{} text {:?} does not contain {:?}",
                    selector, last, needle
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// Selector for an element carrying a stable test id.
pub fn by_test_id(id: &str) -> String {
    format!("[data-testid=\"{}\"]", id)
}

/// Selector for the list items inside a test-id container.
pub fn list_items(id: &str) -> String {
    format!("[data-testid=\"{}\"] li", id)
}

/// Quote a string as a JavaScript literal.
fn js_string(s: &str) -> String {
    Value::from(s).to_string()
}
