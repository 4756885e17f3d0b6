//! Progress indicators for the download step
//!
//! Thin wrapper over `indicatif` so every bar in the program looks the same
//! and honors the opt-out variable.
//!
//! # Environment Variables
//!
//! - `LIBHELPER_NO_PROGRESS`: Set to any value to disable all progress indicators

use crate::constants::NO_PROGRESS_ENV;
use crate::net::DownloadProgress;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Whether progress display has been turned off via `LIBHELPER_NO_PROGRESS`.
///
/// ```bash
/// export LIBHELPER_NO_PROGRESS=1
/// libhelper  # no progress bars
/// ```
pub fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar with consistent styling.
///
/// When progress is disabled the bar is hidden and silently ignores updates.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Bar over `len` bytes.
    pub fn new(len: u64) -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(ProgressStyle::download());
            bar
        };
        Self {
            inner: bar,
        }
    }

    /// Spinner for work of unknown size.
    pub fn new_spinner() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(ProgressStyle::spinner());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self {
            inner: bar,
        }
    }

    /// Byte bar when the size is known, spinner otherwise.
    pub fn for_download(total: Option<u64>) -> Self {
        total.map_or_else(Self::new_spinner, Self::new)
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    /// Mirror a download progress event.
    pub fn update(&self, event: &DownloadProgress) {
        if let Some(total) = event.total
            && self.inner.length() != Some(total)
        {
            self.inner.set_length(total);
        }
        self.inner.set_position(event.received);
        self.inner.set_message(format!("{}%", event.percent));
    }

    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// Styles shared by all bars.
pub struct ProgressStyle;

impl ProgressStyle {
    /// ```text
    /// Downloading [━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━] 2.1MiB/2.1MiB 100% (00:00)
    /// ```
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg} ({eta})")
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
            .progress_chars("━╸━")
    }

    pub fn spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold} {spinner:.cyan} {bytes} {msg}")
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }
}
