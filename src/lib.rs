pub mod ask;
pub mod browser;
pub mod config;
pub mod element;
pub mod error;
pub mod input;
pub mod inspect;
pub mod page;
pub mod poller;
pub mod printer;
pub mod progress;
pub mod sampler;
pub mod tabs;

pub use ask::{ask, stream_response, Answer};
pub use browser::RemoteBrowser;
pub use config::{AskBuilder, AskConfig, PollConfig, SiteProfile};
pub use error::{Error, Result};
pub use page::Page;
pub use poller::{Outcome, ResponsePoller, ResponseTracker};
pub use sampler::{CompletionSignals, ResponseSampler, Snapshot};

/// Send diagnostics to stderr, filtered by `RUST_LOG` (default `info`).
/// Plain lines: no timestamps, no targets.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
