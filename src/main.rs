use std::ffi::OsString;
use std::process::ExitCode;

use ask_grok::config::{AskConfig, CDP_URL_ENV, DEFAULT_CDP_URL};
use ask_grok::poller::Outcome;
use clap::{CommandFactory, Parser};
use tracing::{debug, error, warn};

/// Ask Grok a question through a running Chrome and print the reply.
///
/// Chrome must already be running with remote debugging enabled, e.g.
/// `--remote-debugging-port=18800`, and be logged in to grok.com.
#[derive(Debug, Parser)]
#[command(name = "ask-grok", disable_help_flag = true)]
struct Cli {
    /// The question to send. May start with `-`.
    #[arg(allow_hyphen_values = true)]
    query: Option<String>,

    /// Remote-debugging endpoint of the running Chrome; overrides `CDP_URL`.
    #[arg(long)]
    endpoint: Option<String>,

    /// Print usage.
    #[arg(short, long)]
    help: bool,
}

/// What a command line asks for.
#[derive(Debug)]
enum Invocation {
    Ask { config: AskConfig, query: String },
    Usage,
    Invalid(clap::Error),
}

impl Invocation {
    fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) => return Invocation::Invalid(e),
        };
        let query = match cli.query {
            Some(query) if !cli.help => query,
            _ => return Invocation::Usage,
        };

        let mut config = AskConfig::from_env();
        if let Some(endpoint) = cli.endpoint.filter(|e| !e.trim().is_empty()) {
            config.endpoint = endpoint;
        }
        Invocation::Ask { config, query }
    }

    /// Exit status for invocations that never reach the browser.
    fn exit_code(&self) -> Option<u8> {
        match self {
            Invocation::Ask { .. } => None,
            Invocation::Usage | Invocation::Invalid(_) => Some(2),
        }
    }
}

/// Warning for a reply that may have been cut short.
fn incomplete_warning(outcome: Outcome) -> Option<String> {
    match outcome {
        Outcome::Completed | Outcome::CompletedOnRecheck => None,
        Outcome::Stalled => Some(
            "Reply may be incomplete: it stopped changing before any completion marker appeared"
                .into(),
        ),
        Outcome::TimedOut => Some(
            "Reply may be incomplete: the time limit was reached while it was still streaming"
                .into(),
        ),
    }
}

fn print_usage() {
    eprintln!("{}", Cli::command().render_usage());
    eprintln!(
        "Chrome must be running with remote debugging enabled; set {CDP_URL_ENV} \
         to its endpoint (default {DEFAULT_CDP_URL})."
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    let invocation = Invocation::from_args(std::env::args_os());
    if let Some(code) = invocation.exit_code() {
        match &invocation {
            Invocation::Invalid(e) => {
                let _ = e.print();
            }
            _ => print_usage(),
        }
        return ExitCode::from(code);
    }
    let Invocation::Ask { config, query } = invocation else {
        return ExitCode::from(2);
    };

    ask_grok::init_logging();

    match ask_grok::ask(&config, &query, std::io::stdout().lock()).await {
        Ok(answer) => {
            match incomplete_warning(answer.outcome) {
                Some(message) => warn!(outcome = ?answer.outcome, "{message}"),
                None => debug!(outcome = ?answer.outcome, "done"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask_of(args: &[&str]) -> (AskConfig, String) {
        match Invocation::from_args(args) {
            Invocation::Ask { config, query } => (config, query),
            other => panic!("expected an ask, got {other:?}"),
        }
    }

    #[test]
    fn positional_query() {
        let (_, query) = ask_of(&["ask-grok", "2+2"]);
        assert_eq!(query, "2+2");
        assert_eq!(Invocation::from_args(["ask-grok", "2+2"]).exit_code(), None);
    }

    #[test]
    fn query_may_start_with_a_hyphen() {
        let (_, query) = ask_of(&["ask-grok", "-5 squared?"]);
        assert_eq!(query, "-5 squared?");
        let (_, query) = ask_of(&["ask-grok", "--what is this"]);
        assert_eq!(query, "--what is this");
    }

    #[test]
    fn help_and_missing_query_exit_with_usage() {
        for args in [
            &["ask-grok"][..],
            &["ask-grok", "-h"],
            &["ask-grok", "--help"],
            &["ask-grok", "--help", "q"],
        ] {
            let invocation = Invocation::from_args(args);
            assert!(matches!(invocation, Invocation::Usage), "{args:?}: {invocation:?}");
            assert_eq!(invocation.exit_code(), Some(2), "{args:?}");
        }
    }

    #[test]
    fn endpoint_flag_overrides() {
        let (config, query) = ask_of(&["ask-grok", "--endpoint", "http://127.0.0.1:9222", "hi"]);
        assert_eq!(config.endpoint, "http://127.0.0.1:9222");
        assert_eq!(query, "hi");
    }

    #[test]
    fn cut_short_outcomes_are_warned() {
        assert!(incomplete_warning(Outcome::Completed).is_none());
        assert!(incomplete_warning(Outcome::CompletedOnRecheck).is_none());
        assert!(incomplete_warning(Outcome::Stalled).is_some_and(|m| m.contains("incomplete")));
        assert!(incomplete_warning(Outcome::TimedOut).is_some_and(|m| m.contains("time limit")));
    }

    #[test]
    fn empty_cdp_url_falls_back_to_default() {
        std::env::set_var(CDP_URL_ENV, "");
        let (config, _) = ask_of(&["ask-grok", "q"]);
        assert_eq!(config.endpoint, DEFAULT_CDP_URL);

        let (config, _) = ask_of(&["ask-grok", "--endpoint", "", "q"]);
        assert_eq!(config.endpoint, DEFAULT_CDP_URL);
    }
}
