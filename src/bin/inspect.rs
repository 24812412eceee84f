//! Print a JSON survey of the open Grok tab's DOM.
//!
//! Uses the same `CDP_URL` endpoint as `ask-grok` and never navigates.

use std::process::ExitCode;

use ask_grok::config::AskConfig;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    ask_grok::init_logging();

    let config = AskConfig::from_env();
    let report = match ask_grok::inspect::inspect(&config).await {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
