use std::io::Write;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Prints a `.` to stderr every `interval` until stopped or dropped.
pub struct ProgressDots {
    task: Option<JoinHandle<()>>,
}

impl ProgressDots {
    pub fn start(interval: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut err = std::io::stderr().lock();
                let _ = err.write_all(b".");
                let _ = err.flush();
            }
        });
        Self { task: Some(task) }
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ProgressDots {
    fn drop(&mut self) {
        self.stop();
    }
}
