//! Deciding when a streamed reply is finished.
//!
//! The chat page sends no "done" event, so the poller samples the DOM on a
//! fixed interval, prints new text as it shows up, and stops on the first of:
//!
//! 1. completion indicators in the reply container (settle, flush, stop);
//! 2. indicators found on a recheck after the text has been stable a while;
//! 3. text stable for the extended threshold with no indicator (warn, stop);
//! 4. the total time budget running out (warn, stop).
//!
//! No new message within the first-response budget is an error.

use std::io::Write;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::printer::IncrementalPrinter;
use crate::sampler::{CompletionSignals, ResponseSampler, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Submitted, no new message element yet.
    AwaitingMessage,
    /// Reply text is changing.
    Streaming,
    /// Reply text has stopped changing for at least the stable threshold.
    Stabilizing,
    Done,
}

/// How polling ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completion indicators showed up while polling.
    Completed,
    /// Indicators showed up on the recheck after the text stabilized.
    CompletedOnRecheck,
    /// Text stopped changing but no indicator ever appeared.
    Stalled,
    /// The total time budget ran out.
    TimedOut,
}

impl Outcome {
    /// False when the reply may have been cut short.
    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Completed | Outcome::CompletedOnRecheck)
    }
}

/// What the poller should do after a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    /// Indicators are present: wait the settle delay, flush, stop.
    Settle,
    /// Stable long enough to look for indicators again. With `give_up` set,
    /// stop even if the recheck finds none.
    Recheck { give_up: bool },
}

/// Stability bookkeeping across poll ticks.
#[derive(Debug, Clone)]
pub struct ResponseTracker {
    stable_threshold: u32,
    extended_threshold: u32,
    phase: Phase,
    last_content: Option<String>,
    stable_count: u32,
}

impl ResponseTracker {
    pub fn new(config: &PollConfig) -> Self {
        Self {
            stable_threshold: config.stable_threshold,
            extended_threshold: config.extended_threshold(),
            phase: Phase::AwaitingMessage,
            last_content: None,
            stable_count: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Consecutive ticks with identical, non-empty text.
    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    pub fn message_arrived(&mut self) {
        if self.phase == Phase::AwaitingMessage {
            self.phase = Phase::Streaming;
        }
    }

    /// Record one sample of the reply text.
    pub fn observe(&mut self, content: &str, complete: bool) -> Decision {
        if complete {
            return Decision::Settle;
        }

        if !content.is_empty() && self.last_content.as_deref() == Some(content) {
            self.stable_count += 1;
            if self.stable_count >= self.stable_threshold {
                self.phase = Phase::Stabilizing;
                return Decision::Recheck {
                    give_up: self.stable_count >= self.extended_threshold,
                };
            }
        } else {
            self.stable_count = 0;
            self.last_content = Some(content.to_owned());
            self.phase = Phase::Streaming;
        }
        Decision::Continue
    }

    pub fn finish(&mut self) {
        self.phase = Phase::Done;
    }
}

/// Drives a [`ResponseSampler`] until the reply is judged finished.
pub struct ResponsePoller {
    config: PollConfig,
    follow_up_buttons: usize,
}

impl ResponsePoller {
    pub fn new(config: PollConfig, follow_up_buttons: usize) -> Self {
        Self {
            config,
            follow_up_buttons,
        }
    }

    fn is_complete(&self, snapshot: &Snapshot) -> bool {
        let signals = CompletionSignals::detect(snapshot, self.follow_up_buttons);
        debug!(?signals, len = snapshot.content.len(), "sample");
        signals.any()
    }

    /// Poll until the reply is done. `baseline` is the message count before
    /// the query was submitted.
    pub async fn run<S, W>(
        &self,
        sampler: &mut S,
        baseline: usize,
        printer: &mut IncrementalPrinter<W>,
    ) -> Result<Outcome>
    where
        S: ResponseSampler + ?Sized,
        W: Write,
    {
        let start = Instant::now();
        let mut tracker = ResponseTracker::new(&self.config);

        while sampler.message_count().await? <= baseline {
            if start.elapsed() >= self.config.first_response_timeout {
                return Err(Error::NoResponse);
            }
            sleep(self.config.poll_interval).await;
        }
        tracker.message_arrived();

        while start.elapsed() < self.config.total_timeout {
            let Some(snapshot) = sampler.sample().await? else {
                sleep(self.config.poll_interval).await;
                continue;
            };

            printer.emit(&snapshot.content)?;

            match tracker.observe(&snapshot.content, self.is_complete(&snapshot)) {
                Decision::Continue => {}
                Decision::Settle => {
                    info!("[Completion indicators detected, capturing final content...]");
                    sleep(self.config.settle_delay).await;
                    if let Some(last) = sampler.sample().await? {
                        printer.emit(&last.content)?;
                    }
                    tracker.finish();
                    return Ok(Outcome::Completed);
                }
                Decision::Recheck { give_up } => {
                    if let Some(again) = sampler.sample().await? {
                        if self.is_complete(&again) {
                            info!("[Completion indicators found on recheck]");
                            printer.emit(&again.content)?;
                            tracker.finish();
                            return Ok(Outcome::CompletedOnRecheck);
                        }
                    }
                    if give_up {
                        warn!(
                            "[Warning: Response may be incomplete - no completion indicators found after extended wait]"
                        );
                        tracker.finish();
                        return Ok(Outcome::Stalled);
                    }
                }
            }

            sleep(self.config.poll_interval).await;
        }

        warn!("[Warning: Maximum time limit reached]");
        tracker.finish();
        Ok(Outcome::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ResponseTracker {
        ResponseTracker::new(&PollConfig {
            stable_threshold: 2,
            extended_factor: 3,
            ..PollConfig::default()
        })
    }

    #[test]
    fn starts_awaiting_then_streams() {
        let mut t = tracker();
        assert_eq!(t.phase(), Phase::AwaitingMessage);
        t.message_arrived();
        assert_eq!(t.phase(), Phase::Streaming);
    }

    #[test]
    fn completion_settles_immediately() {
        let mut t = tracker();
        assert_eq!(t.observe("4", true), Decision::Settle);
    }

    #[test]
    fn stable_text_triggers_recheck_then_give_up() {
        let mut t = tracker();
        assert_eq!(t.observe("same", false), Decision::Continue);
        assert_eq!(t.observe("same", false), Decision::Continue);
        assert_eq!(t.observe("same", false), Decision::Recheck { give_up: false });
        assert_eq!(t.phase(), Phase::Stabilizing);
        for _ in 0..3 {
            t.observe("same", false);
        }
        assert_eq!(t.stable_count(), 5);
        assert_eq!(t.observe("same", false), Decision::Recheck { give_up: true });
    }

    #[test]
    fn any_change_resets_stability() {
        let mut t = tracker();
        t.observe("abc", false);
        t.observe("abc", false);
        assert_eq!(t.stable_count(), 1);
        t.observe("xy", false);
        assert_eq!(t.stable_count(), 0);
        assert_eq!(t.phase(), Phase::Streaming);

        t.observe("xy", false);
        t.observe("xz", false);
        assert_eq!(t.stable_count(), 0);
    }

    #[test]
    fn empty_text_never_counts_as_stable() {
        let mut t = tracker();
        for _ in 0..10 {
            assert_eq!(t.observe("", false), Decision::Continue);
        }
        assert_eq!(t.stable_count(), 0);
    }
}
