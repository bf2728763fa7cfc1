// qcscan-cli/src/progress.rs
//
// Frame counter spinner for long passes. Every pass polls its cancel check
// once per frame, so the spinner advances from that poll and never cancels.

use indicatif::{ProgressBar, ProgressStyle};
use qcscan_core::CancelCheck;
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}: {human_pos} frames ({per_sec})";

/// Spinner counting the frames read by the current mode.
pub struct FrameSpinner {
    bar: ProgressBar,
}

impl FrameSpinner {
    /// Draws to stderr; indicatif stays silent when stderr is not a terminal.
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Restarts the count for the next mode.
    pub fn start(&self, mode: &str) {
        self.bar.reset();
        self.bar.set_message(mode.to_string());
    }

    pub fn frames(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for FrameSpinner {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelCheck for FrameSpinner {
    fn is_cancelled(&self) -> bool {
        self.bar.inc(1);
        false
    }
}
