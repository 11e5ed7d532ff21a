//! Terminal progress bar for a single download.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use nezumi_core::download::{DownloadOutcome, Progress};
use nezumi_core::pipeline::DownloadObserver;

const BAR_TEMPLATE: &str = "{spinner} {msg} [{bar:30}] {percent}%";
const SPINNER_TEMPLATE: &str = "{spinner} {msg}";

/// Draws download progress with `indicatif`.
///
/// Starts as a spinner and switches to a bar once a total is known.
#[derive(Debug)]
pub(crate) struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    /// Creates a visible bar, or a hidden one when `enabled` is false.
    pub(crate) fn new(label: &str, enabled: bool) -> Self {
        let target = if enabled {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(label.to_string());
        Self { bar }
    }

    #[cfg(test)]
    fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl DownloadObserver for BarObserver {
    fn on_progress(&self, progress: Progress) {
        if let Some(total) = progress.total_bytes
            && self.bar.length() != Some(total)
        {
            self.bar.set_length(total);
            self.bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
        }
        self.bar.set_position(progress.bytes_transferred);
        self.bar.set_message(progress.to_string());
    }

    fn on_finished(&self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Completed(_) => self.bar.finish_and_clear(),
            DownloadOutcome::Cancelled => self.bar.abandon_with_message("cancelled"),
            DownloadOutcome::Failed(error) => self.bar.abandon_with_message(error.to_string()),
        }
    }
}
