//! Timestamped status lines for the user.
//!
//! Every line reads `[HH:MM:SS] message`. Status lines go to stdout; errors go
//! to stderr and are never suppressed.

use chrono::{Local, NaiveTime, Timelike};
use colored::Colorize;

/// `[HH:MM:SS]` for `time`.
pub fn timestamp_at(time: NaiveTime) -> String {
    format!("[{:02}:{:02}:{:02}]", time.hour(), time.minute(), time.second())
}

/// `[HH:MM:SS] message` for `time`.
pub fn format_line(time: NaiveTime, message: &str) -> String {
    format!("{} {}", timestamp_at(time), message)
}

fn now_line(message: &str) -> String {
    format_line(Local::now().time(), message)
}

/// Writes status lines, optionally suppressing everything but errors.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    quiet: bool,
    progress: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Console {
    pub const fn new(quiet: bool) -> Self {
        Self {
            quiet,
            progress: true,
        }
    }

    #[must_use]
    pub const fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub const fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Whether progress bars should be drawn.
    pub const fn shows_progress(&self) -> bool {
        self.progress && !self.quiet
    }

    pub fn status(&self, message: &str) {
        if !self.quiet {
            println!("{}", now_line(message));
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{}", now_line(message).green());
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{}", now_line(message).yellow());
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", now_line(message).red());
    }
}
