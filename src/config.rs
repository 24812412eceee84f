use std::time::Duration;

/// Environment variable selecting the remote-debugging endpoint.
pub const CDP_URL_ENV: &str = "CDP_URL";

/// Endpoint used when `CDP_URL` is unset. Chrome must already be running
/// with `--remote-debugging-port=18800`.
pub const DEFAULT_CDP_URL: &str = "http://localhost:18800";

/// Top-level configuration for one ask run.
#[derive(Debug, Clone)]
pub struct AskConfig {
    /// Remote-debugging endpoint, http(s) or ws(s).
    pub endpoint: String,
    /// Default bound for individual page operations (default: 15s).
    pub operation_timeout: Duration,
    /// How long to wait for the chat input to appear (default: 10s).
    pub input_timeout: Duration,
    pub poll: PollConfig,
    pub site: SiteProfile,
}

/// Timing knobs for the response poller.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between DOM samples.
    pub poll_interval: Duration,
    /// Consecutive unchanged samples before completion is rechecked.
    pub stable_threshold: u32,
    /// Multiple of `stable_threshold` after which polling gives up without
    /// a completion indicator.
    pub extended_factor: u32,
    /// Budget for the first new message to show up.
    pub first_response_timeout: Duration,
    /// Overall budget, measured from the start of polling.
    pub total_timeout: Duration,
    /// Extra wait after completion indicators appear, to catch trailing text.
    pub settle_delay: Duration,
    /// Interval between progress dots on stderr.
    pub progress_interval: Duration,
}

impl PollConfig {
    /// Stable-tick count at which polling stops without a completion signal.
    pub fn extended_threshold(&self) -> u32 {
        self.stable_threshold.saturating_mul(self.extended_factor)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            stable_threshold: 6,
            extended_factor: 4,
            first_response_timeout: Duration::from_secs(60),
            total_timeout: Duration::from_secs(600),
            settle_delay: Duration::from_secs(2),
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// DOM markers of the target chat site.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Substring identifying a tab that already shows the site.
    pub host: String,
    /// Address to navigate to when no such tab exists.
    pub start_url: String,
    /// Editable input region.
    pub input_selector: String,
    /// One element per chat message, user and assistant alike.
    pub message_selector: String,
    /// Class that marks a message bubble as the user's own.
    pub user_bubble_class: String,
    /// Buttons in a reply container at or above which the reply counts as
    /// finished (follow-up suggestions plus action buttons).
    pub follow_up_buttons: usize,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            host: "grok.com".into(),
            start_url: "https://grok.com/".into(),
            input_selector: r#"div.tiptap.ProseMirror[contenteditable="true"]"#.into(),
            message_selector: ".message-bubble".into(),
            user_bubble_class: "bg-surface-l1".into(),
            follow_up_buttons: 5,
        }
    }
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CDP_URL.into(),
            operation_timeout: Duration::from_secs(15),
            input_timeout: Duration::from_secs(10),
            poll: PollConfig::default(),
            site: SiteProfile::default(),
        }
    }
}

impl AskConfig {
    /// Defaults, with the endpoint taken from `CDP_URL` when set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(endpoint) = std::env::var(CDP_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            config.endpoint = endpoint;
        }
        config
    }
}

pub struct AskBuilder {
    config: AskConfig,
}

impl AskBuilder {
    pub fn new() -> Self {
        Self {
            config: AskConfig::default(),
        }
    }

    /// Start from `AskConfig::from_env()` instead of the plain defaults.
    pub fn from_env() -> Self {
        Self {
            config: AskConfig::from_env(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the default bound for individual page operations.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = timeout;
        self
    }

    pub fn input_timeout(mut self, timeout: Duration) -> Self {
        self.config.input_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll.poll_interval = interval;
        self
    }

    /// Set the stable-tick threshold and the factor for the give-up point.
    pub fn stability(mut self, threshold: u32, extended_factor: u32) -> Self {
        self.config.poll.stable_threshold = threshold;
        self.config.poll.extended_factor = extended_factor;
        self
    }

    pub fn first_response_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll.first_response_timeout = timeout;
        self
    }

    pub fn total_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll.total_timeout = timeout;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.poll.settle_delay = delay;
        self
    }

    pub fn site(mut self, site: SiteProfile) -> Self {
        self.config.site = site;
        self
    }

    pub fn build(self) -> AskConfig {
        self.config
    }
}

impl Default for AskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let poll = PollConfig::default();
        assert_eq!(poll.poll_interval, Duration::from_millis(500));
        assert_eq!(poll.stable_threshold, 6);
        assert_eq!(poll.extended_threshold(), 24);
        assert_eq!(poll.first_response_timeout, Duration::from_secs(60));
        assert_eq!(poll.total_timeout, Duration::from_secs(600));
        assert_eq!(AskConfig::default().endpoint, "http://localhost:18800");
    }

    #[test]
    fn builder_overrides_fields() {
        let config = AskBuilder::new()
            .endpoint("ws://127.0.0.1:9222/devtools/browser/abc")
            .stability(2, 3)
            .settle_delay(Duration::ZERO)
            .build();
        assert_eq!(config.endpoint, "ws://127.0.0.1:9222/devtools/browser/abc");
        assert_eq!(config.poll.extended_threshold(), 6);
        assert_eq!(config.poll.settle_delay, Duration::ZERO);
        assert_eq!(config.site.host, "grok.com");
    }
}
