use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
};
use chromiumoxide::page::Page as CrPage;
use serde::de::DeserializeOwned;

use crate::element::Element;
use crate::error::{Error, Result};

/// CDP modifier bit for the Control key.
const MODIFIER_CTRL: i64 = 2;

/// Wrapper around a chromiumoxide Page exposing just what the ask flow needs.
pub struct Page {
    inner: CrPage,
    default_timeout: Duration,
}

impl Page {
    pub(crate) fn new(inner: CrPage, default_timeout: Duration) -> Self {
        Self { inner, default_timeout }
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Navigate to the given URL and wait for the page to load.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| Error::Navigation(e.to_string()))?;
        Ok(())
    }

    /// Activate this tab without navigating it.
    pub async fn bring_to_front(&self) -> Result<()> {
        self.inner
            .bring_to_front()
            .await
            .map_err(|e| Error::Navigation(e.to_string()))?;
        Ok(())
    }

    /// Get the current page URL.
    pub async fn url(&self) -> Result<String> {
        self.inner
            .url()
            .await
            .map_err(|e| Error::Navigation(e.to_string()))?
            .ok_or_else(|| Error::Navigation("No URL found".into()))
    }

    // ── Input ───────────────────────────────────────────────────────

    /// Press Ctrl+A in the focused element.
    pub async fn select_all(&self) -> Result<()> {
        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .modifiers(MODIFIER_CTRL)
            .key("a")
            .code("KeyA")
            .windows_virtual_key_code(65)
            .commands(vec!["selectAll".to_string()])
            .build()
            .map_err(Error::Js)?;
        self.inner.execute(down).await?;

        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .modifiers(MODIFIER_CTRL)
            .key("a")
            .code("KeyA")
            .windows_virtual_key_code(65)
            .build()
            .map_err(Error::Js)?;
        self.inner.execute(up).await?;
        Ok(())
    }

    /// Insert text at the caret exactly as given, like an IME commit.
    pub async fn insert_text(&self, text: &str) -> Result<()> {
        self.inner.execute(InsertTextParams::new(text)).await?;
        Ok(())
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Evaluate a JavaScript expression and deserialize its value. Bounded by
    /// the page's default timeout.
    pub async fn evaluate_value<T: DeserializeOwned>(&self, expression: &str) -> Result<T> {
        let result = tokio::time::timeout(self.default_timeout, self.inner.evaluate(expression))
            .await
            .map_err(|_| Error::Timeout("page script evaluation".into()))?
            .map_err(|e| Error::Js(e.to_string()))?;
        result
            .into_value::<T>()
            .map_err(|e| Error::Js(e.to_string()))
    }

    /// Count the elements matching the given CSS selector.
    pub async fn count(&self, selector: &str) -> Result<usize> {
        let selector_js = serde_json::to_string(selector)?;
        self.evaluate_value(&format!(
            "document.querySelectorAll({selector_js}).length"
        ))
        .await
    }

    // ── Element Queries ─────────────────────────────────────────────

    /// Find an element matching the given CSS selector.
    pub async fn find_element(&self, selector: &str) -> Result<Element> {
        let el = self.inner.find_element(selector).await?;
        Ok(Element::new(el))
    }

    /// Wait for an element matching the given CSS selector to appear in the DOM.
    /// Polls every 100ms up to `timeout`; on timeout the last lookup error is
    /// returned.
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<Element> {
        let interval = Duration::from_millis(100);
        let start = tokio::time::Instant::now();

        loop {
            match self.find_element(selector).await {
                Ok(el) => return Ok(el),
                Err(_) if start.elapsed() < timeout => {
                    tokio::time::sleep(interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
