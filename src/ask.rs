use std::io::Write;

use tracing::info;

use crate::browser::RemoteBrowser;
use crate::config::AskConfig;
use crate::error::Result;
use crate::input;
use crate::poller::{Outcome, ResponsePoller};
use crate::printer::IncrementalPrinter;
use crate::progress::ProgressDots;
use crate::sampler::{DomSampler, ResponseSampler};

/// Result of a finished ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// The reply text as written to the output.
    pub text: String,
    pub outcome: Outcome,
}

/// Connect, pick the tab, submit `query` and stream the reply into `out`.
pub async fn ask<W: Write>(config: &AskConfig, query: &str, out: W) -> Result<Answer> {
    let mut browser = RemoteBrowser::connect(config).await?;
    let page = browser.locate_tab(&config.site).await?;
    let baseline = input::submit_query(&page, &config.site, query, config.input_timeout).await?;

    info!("Question sent. Waiting for Grok response (this may take 1-5 minutes for complex queries)...");

    let mut sampler = DomSampler::new(&page, &config.site);
    stream_response(config, &mut sampler, baseline, out).await
}

/// Poll `sampler` for the reply to an already submitted query and stream it
/// into `out`, followed by a newline. On error nothing more is written.
pub async fn stream_response<S, W>(
    config: &AskConfig,
    sampler: &mut S,
    baseline: usize,
    out: W,
) -> Result<Answer>
where
    S: ResponseSampler + ?Sized,
    W: Write,
{
    let mut printer = IncrementalPrinter::new(out);
    let poller = ResponsePoller::new(config.poll.clone(), config.site.follow_up_buttons);

    let mut dots = ProgressDots::start(config.poll.progress_interval);
    let result = poller.run(sampler, baseline, &mut printer).await;
    dots.stop();
    eprintln!();

    let outcome = result?;
    let text = printer.text().to_owned();
    printer.finish()?;
    Ok(Answer { text, outcome })
}
