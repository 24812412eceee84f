//! Reading the reply state out of the page.
//!
//! The poller never touches the DOM directly. It asks a [`ResponseSampler`]
//! for the message count and for [`Snapshot`]s of the latest reply, and
//! judges completion with [`CompletionSignals::detect`]. Tests drive the
//! poller with scripted samplers instead of a browser.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::config::SiteProfile;
use crate::error::Result;
use crate::page::Page;

/// One observation of the latest assistant reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Trimmed visible text of the reply bubble.
    pub content: String,
    /// Visible text of the bubble's container, action bar included.
    pub container_text: String,
    /// Number of `button` elements inside the container.
    pub button_count: usize,
}

impl Snapshot {
    pub fn new(content: impl Into<String>, container_text: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            container_text: container_text.into(),
            button_count: 0,
        }
    }

    pub fn with_buttons(mut self, button_count: usize) -> Self {
        self.button_count = button_count;
        self
    }
}

/// UI artifacts that only show up once a reply has finished streaming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionSignals {
    /// Elapsed-time label such as `623ms` or `4s` on its own line.
    pub timing: bool,
    /// A "N sources" count.
    pub sources: bool,
    /// Enough buttons for follow-up suggestions to be present.
    pub follow_ups: bool,
}

fn timing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\d+m?s(\n|$)").expect("valid timing regex"))
}

fn sources_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\d+\s*sources?").expect("valid sources regex"))
}

impl CompletionSignals {
    pub fn detect(snapshot: &Snapshot, follow_up_buttons: usize) -> Self {
        let text = &snapshot.container_text;
        Self {
            timing: timing_re().is_match(text),
            sources: sources_re().is_match(text),
            follow_ups: snapshot.button_count >= follow_up_buttons,
        }
    }

    /// True when any single signal fired.
    pub fn any(&self) -> bool {
        self.timing || self.sources || self.follow_ups
    }
}

/// Source of reply state for the poller.
#[async_trait]
pub trait ResponseSampler: Send {
    /// Count of all message elements, user and assistant.
    async fn message_count(&mut self) -> Result<usize>;

    /// Latest assistant reply, or `None` when no assistant bubble exists yet.
    async fn sample(&mut self) -> Result<Option<Snapshot>>;
}

/// [`ResponseSampler`] that evaluates small scripts in a live page.
pub struct DomSampler<'a> {
    page: &'a Page,
    site: &'a SiteProfile,
}

impl<'a> DomSampler<'a> {
    pub fn new(page: &'a Page, site: &'a SiteProfile) -> Self {
        Self { page, site }
    }

    fn sample_script(&self) -> Result<String> {
        let selector_js = serde_json::to_string(&self.site.message_selector)?;
        let user_class_js = serde_json::to_string(&self.site.user_bubble_class)?;
        Ok(format!(
            r#"
            JSON.stringify((() => {{
                const bubbles = Array.from(document.querySelectorAll({selector_js}))
                    .filter(m => !String(m.className).includes({user_class_js}));
                if (bubbles.length === 0) return null;
                const last = bubbles[bubbles.length - 1];
                const container = last.parentElement;
                if (!container) return null;
                return {{
                    content: (last.innerText || '').trim(),
                    containerText: container.innerText || '',
                    buttonCount: container.querySelectorAll('button').length
                }};
            }})())
            "#,
        ))
    }
}

#[async_trait]
impl ResponseSampler for DomSampler<'_> {
    async fn message_count(&mut self) -> Result<usize> {
        self.page.count(&self.site.message_selector).await
    }

    async fn sample(&mut self) -> Result<Option<Snapshot>> {
        let script = self.sample_script()?;
        let raw: String = self.page.evaluate_value(&script).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(container: &str, buttons: usize) -> CompletionSignals {
        CompletionSignals::detect(&Snapshot::new("x", container).with_buttons(buttons), 5)
    }

    #[test]
    fn timing_label_on_its_own_line() {
        assert!(detect("4\n350ms\nCopy", 0).timing);
        assert!(detect("4\n12s", 0).timing);
        assert!(detect("answer\n350ms", 0).any());
    }

    #[test]
    fn timing_label_must_be_standalone() {
        assert!(!detect("it took 350ms to run", 0).timing);
        assert!(!detect("350ms\nat the start", 0).timing);
        assert!(!detect("\n350 ms\n", 0).timing);
    }

    #[test]
    fn sources_count_is_case_insensitive() {
        assert!(detect("Paris\n12 Sources", 0).sources);
        assert!(detect("Paris\n1source", 0).sources);
        assert!(!detect("no citations here", 0).sources);
    }

    #[test]
    fn button_threshold() {
        assert!(!detect("streaming", 4).any());
        assert!(detect("streaming", 5).follow_ups);
        assert!(detect("streaming", 9).any());
    }

    #[test]
    fn snapshot_deserializes_from_page_json() {
        let raw = r#"{"content":"4","containerText":"4\n350ms","buttonCount":6}"#;
        let snap: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snap, Snapshot::new("4", "4\n350ms").with_buttons(6));
    }
}
