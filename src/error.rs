use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Failed to connect to Chrome at {endpoint}: {reason}\n\
         Make sure Chrome is running with --remote-debugging-port enabled on that port"
    )]
    Connect { endpoint: String, reason: String },

    #[error("No browser contexts found")]
    NoBrowserContexts,

    #[error("Could not find Grok input box ({0}). Are you logged in?")]
    InputNotFound(String),

    #[error("No Grok tab found. Please open grok.com first.")]
    NoGrokTab,

    #[error("No response received within timeout")]
    NoResponse,

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("JavaScript error: {0}")]
    Js(String),

    #[error("CDP error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
