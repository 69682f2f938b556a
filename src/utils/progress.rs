//! Progress indicators for downloads and long-running steps
//!
//! Thin wrappers around `indicatif` with get's styling.
//!
//! # Environment Variables
//!
//! - `GET_NO_PROGRESS`: Set to any value to disable all progress indicators
//!
//! # Examples
//!
//! ```rust
//! use get_cli::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new_download(Some(1024), "gh_2.40.0_amd64.deb");
//! progress.inc(512);
//! progress.inc(512);
//! progress.finish_and_clear();
//! ```

use crate::constants::NO_PROGRESS_ENV;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Progress bars are disabled when `GET_NO_PROGRESS` is set.
fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar with consistent styling.
///
/// Hidden bars silently accept every call, so callers never need to check
/// whether progress output is enabled.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// A byte-counting bar for a download.
    ///
    /// When the size is unknown (no `Content-Length`), a spinner showing the
    /// transferred bytes is used instead.
    pub fn new_download(total_bytes: Option<u64>, name: &str) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else if let Some(total) = total_bytes {
            let bar = IndicatifBar::new(total);
            bar.set_style(ProgressStyle::download());
            bar
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(ProgressStyle::download_unknown());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_prefix(name.to_string());
        Self { inner: bar }
    }

    /// A spinner for a step of unknown duration.
    pub fn new_spinner(message: impl Into<String>) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(ProgressStyle::spinner());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_message(message.into());
        Self { inner: bar }
    }

    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Remove the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// Current position, used by tests.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }
}

/// Predefined styles for get progress indicators.
pub struct ProgressStyle;

impl ProgressStyle {
    /// `{prefix} [{bar}] {bytes}/{total_bytes} ({eta})`
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
            .progress_chars("━╸━")
    }

    /// Download style when the total size is unknown.
    pub fn download_unknown() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.cyan} {bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
    }

    /// `{spinner} {msg}` with Braille tick characters.
    pub fn spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }
}
