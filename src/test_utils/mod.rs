//! Test utilities for libhelper
//!
//! This module provides utilities for writing tests without a terminal or
//! network access:
//! - [`ScriptedPrompter`] answers prompts from a script and records them
//! - [`fixtures`] builds installation layouts and zip archives
//! - [`http`] serves archives and the liveness page from localhost
//!
//! # Example
//!
//! ```rust,no_run
//! use libhelper::prompt::Decision;
//! use libhelper::test_utils::ScriptedPrompter;
//!
//! let prompter = ScriptedPrompter::new().with_confirmations([Decision::Yes]);
//! ```

pub mod fixtures;
pub mod http;

pub use fixtures::{ArchiveEntry, create_markers, sha1_hex, write_zip, zip_bytes};
pub use http::{TestServer, TestServerBuilder, unused_local_url};

use crate::prompt::{Decision, Prompter};
use anyhow::Result;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Prompter that replays canned answers.
///
/// Confirmations past the end of the script answer [`Decision::Cancel`];
/// selections past the end answer `None`. Every message is recorded.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    decisions: Mutex<VecDeque<Decision>>,
    selections: Mutex<VecDeque<Option<PathBuf>>>,
    confirm_messages: Mutex<Vec<String>>,
    selection_prompts: Mutex<Vec<String>>,
    acknowledgments: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirmations(self, decisions: impl IntoIterator<Item = Decision>) -> Self {
        self.decisions.lock().unwrap().extend(decisions);
        self
    }

    pub fn with_selections(self, selections: impl IntoIterator<Item = Option<PathBuf>>) -> Self {
        self.selections.lock().unwrap().extend(selections);
        self
    }

    /// Messages passed to `confirm`, in order.
    pub fn confirmations(&self) -> Vec<String> {
        self.confirm_messages.lock().unwrap().clone()
    }

    /// Prompts passed to `select_directory`, in order.
    pub fn selection_prompts(&self) -> Vec<String> {
        self.selection_prompts.lock().unwrap().clone()
    }

    /// Messages passed to `acknowledge`, in order.
    pub fn acknowledgments(&self) -> Vec<String> {
        self.acknowledgments.lock().unwrap().clone()
    }

    /// Scripted answers not consumed yet.
    pub fn remaining(&self) -> (usize, usize) {
        (self.decisions.lock().unwrap().len(), self.selections.lock().unwrap().len())
    }
}

impl Prompter for ScriptedPrompter {
    async fn confirm(&self, message: &str) -> Result<Decision> {
        self.confirm_messages.lock().unwrap().push(message.to_string());
        Ok(self.decisions.lock().unwrap().pop_front().unwrap_or(Decision::Cancel))
    }

    async fn select_directory(&self, prompt: &str) -> Result<Option<PathBuf>> {
        self.selection_prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.selections.lock().unwrap().pop_front().flatten())
    }

    async fn acknowledge(&self, message: &str) -> Result<()> {
        self.acknowledgments.lock().unwrap().push(message.to_string());
        Ok(())
    }
}
