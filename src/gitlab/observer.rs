use crate::error::RepgenError;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{info, warn};

/// Receives fetch progress. Passed into the fetcher explicitly instead of
/// writing to process-wide output.
pub trait FetchObserver {
    fn page_fetched(&self, _page: u32, _received: usize, _total: usize) {}

    fn retrying(&self, _page: u32, _attempt: u32, _delay: Duration, _cause: &RepgenError) {}

    fn finished(&self, _total: usize) {}

    /// The listing stopped at `page` with a fatal error.
    fn failed(&self, _page: u32, _cause: &RepgenError) {}
}

/// Reports through `tracing` events.
pub struct TracingObserver;

impl FetchObserver for TracingObserver {
    fn page_fetched(&self, page: u32, received: usize, total: usize) {
        info!(page, received, total, "fetched commit page");
    }

    fn retrying(&self, page: u32, attempt: u32, delay: Duration, cause: &RepgenError) {
        warn!(page, attempt, delay_ms = delay.as_millis() as u64, %cause, "retrying commit page");
    }

    fn finished(&self, total: usize) {
        info!(total, "commit listing complete");
    }

    fn failed(&self, page: u32, cause: &RepgenError) {
        warn!(page, %cause, "commit listing aborted");
    }
}

/// Terminal spinner for interactive runs.
pub struct ProgressObserver {
    pb: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message("Fetching commits...");
        Self { pb }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchObserver for ProgressObserver {
    fn page_fetched(&self, page: u32, _received: usize, total: usize) {
        self.pb.set_message(format!("Fetched page {page} ({total} commits)"));
    }

    fn retrying(&self, page: u32, attempt: u32, delay: Duration, cause: &RepgenError) {
        self.pb.set_message(format!(
            "Page {page} failed ({cause}); attempt {} in {}",
            attempt + 1,
            humantime::format_duration(delay)
        ));
    }

    fn finished(&self, total: usize) {
        self.pb.finish_with_message(format!("Fetched {total} commits"));
    }

    fn failed(&self, page: u32, _cause: &RepgenError) {
        self.pb.abandon_with_message(format!("Fetching page {page} failed"));
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.abandon();
        }
    }
}
