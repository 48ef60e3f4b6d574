//! Live feedback for headless recordings using indicatif.
//!
//! The TUI renders its own status line; `endolog record` shows a spinner
//! with the line counter and the latest status text instead.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Spinner tick rate.
const TICK_INTERVAL: Duration = Duration::from_millis(120);

/// Spinner showing how many lines a recording has written.
pub struct RecordingSpinner {
    bar: ProgressBar,
}

impl RecordingSpinner {
    /// Create a spinner. With `quiet` nothing is drawn.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new_spinner()
        };
        let style =
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} lines  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(TICK_INTERVAL);
        Self { bar }
    }

    /// Update the counter and message.
    pub fn update(&self, lines: u64, status: &str) {
        self.bar.set_position(lines);
        self.bar.set_message(status.to_string());
    }

    /// Stop ticking and leave `message` on screen.
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
