use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{TargetId, TargetInfo};

/// A page target as reported by the browser.
#[derive(Debug, Clone)]
pub struct TabInfo {
    pub target_id: TargetId,
    pub url: String,
    pub context_id: Option<BrowserContextId>,
}

impl From<TargetInfo> for TabInfo {
    fn from(info: TargetInfo) -> Self {
        Self {
            target_id: info.target_id,
            url: info.url,
            context_id: info.browser_context_id,
        }
    }
}

/// Which tab the ask flow should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabChoice {
    /// A tab already on the site: bring it forward, leave its state alone.
    Existing(usize),
    /// No tab on the site: navigate this one there.
    Reuse(usize),
    /// The context has no tabs at all.
    OpenNew,
}

/// First tab whose URL contains `host`, else the first tab, else a new one.
pub fn select_tab<S: AsRef<str>>(urls: &[S], host: &str) -> TabChoice {
    if let Some(i) = urls.iter().position(|u| u.as_ref().contains(host)) {
        TabChoice::Existing(i)
    } else if urls.is_empty() {
        TabChoice::OpenNew
    } else {
        TabChoice::Reuse(0)
    }
}

/// Browsing contexts in a stable order: those owning page targets first, in
/// target order, then any others the browser lists.
pub fn browsing_contexts(tabs: &[TabInfo], listed: &[BrowserContextId]) -> Vec<BrowserContextId> {
    let mut contexts: Vec<BrowserContextId> = Vec::new();
    let owned = tabs.iter().filter_map(|t| t.context_id.as_ref());
    for id in owned.chain(listed.iter()) {
        if !contexts.contains(id) {
            contexts.push(id.clone());
        }
    }
    contexts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: &str, url: &str, ctx: Option<&str>) -> TabInfo {
        TabInfo {
            target_id: TargetId::new(id),
            url: url.into(),
            context_id: ctx.map(BrowserContextId::new),
        }
    }

    #[test]
    fn prefers_first_tab_on_site() {
        let urls = ["https://example.com/", "https://grok.com/c/1", "https://grok.com/"];
        assert_eq!(select_tab(&urls, "grok.com"), TabChoice::Existing(1));
    }

    #[test]
    fn reuses_first_tab_when_site_absent() {
        let urls = ["about:blank", "https://example.com/"];
        assert_eq!(select_tab(&urls, "grok.com"), TabChoice::Reuse(0));
    }

    #[test]
    fn opens_new_tab_when_context_empty() {
        let urls: [&str; 0] = [];
        assert_eq!(select_tab(&urls, "grok.com"), TabChoice::OpenNew);
    }

    #[test]
    fn contexts_keep_target_order_and_dedupe() {
        let tabs = [
            tab("1", "about:blank", Some("B")),
            tab("2", "https://grok.com/", Some("A")),
            tab("3", "chrome://newtab", Some("B")),
            tab("4", "about:blank", None),
        ];
        let listed = [BrowserContextId::new("A"), BrowserContextId::new("C")];
        let ids: Vec<String> = browsing_contexts(&tabs, &listed)
            .iter()
            .map(|c| c.inner().clone())
            .collect();
        assert_eq!(ids, ["B", "A", "C"]);
    }

    #[test]
    fn no_targets_and_nothing_listed_means_no_context() {
        assert!(browsing_contexts(&[], &[]).is_empty());
    }
}
