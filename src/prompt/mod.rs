//! User decisions needed by the install pipeline.
//!
//! The pipeline never talks to the terminal directly when it needs an
//! answer. It goes through a [`Prompter`], which can confirm an action,
//! ask for a directory and hold the process open until the user has read
//! the outcome. [`TerminalPrompter`] is the interactive implementation;
//! tests use the scripted double in `test_utils`.

use anyhow::Result;
use colored::Colorize;
use std::future::Future;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::debug;

/// Answer to a yes/no/cancel question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
    Cancel,
}

impl Decision {
    #[must_use]
    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }

    /// Interpret a typed answer. Empty input counts as cancel.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Self::Yes,
            "n" | "no" => Self::No,
            _ => Self::Cancel,
        }
    }
}

/// Source of user decisions.
pub trait Prompter: Send + Sync {
    /// Ask a yes/no/cancel question.
    fn confirm(&self, message: &str) -> impl Future<Output = Result<Decision>> + Send;

    /// Ask for a directory. `None` means the user canceled the selection.
    fn select_directory(&self, prompt: &str)
    -> impl Future<Output = Result<Option<PathBuf>>> + Send;

    /// Block until the user acknowledges `message`.
    fn acknowledge(&self, message: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Prompts on stdin/stdout.
///
/// Every question reads one line from a single buffered stdin reader, so
/// answers piped in ahead of time are consumed in order. Clones share the
/// reader.
#[derive(Debug, Clone)]
pub struct TerminalPrompter {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl TerminalPrompter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    async fn read_answer(&self, question: &str) -> Result<Option<String>> {
        print!("{question} ");
        io::stdout().flush()?;

        let mut lines = self.lines.lock().await;
        let Some(line) = lines.next_line().await? else {
            debug!("stdin closed while waiting for an answer");
            return Ok(None);
        };
        Ok(Some(line.trim().to_string()))
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    async fn confirm(&self, message: &str) -> Result<Decision> {
        println!();
        println!("{}", message.yellow().bold());
        let question = "[y]es / [n]o / [c]ancel:".green().to_string();
        let answer = self.read_answer(&question).await?;
        Ok(answer.map_or(Decision::Cancel, |a| Decision::parse(&a)))
    }

    async fn select_directory(&self, prompt: &str) -> Result<Option<PathBuf>> {
        println!("{}", prompt.cyan());
        let answer = self.read_answer("Path (leave empty to cancel):").await?;
        Ok(answer.filter(|a| !a.is_empty()).map(|a| expand_home(&a)))
    }

    async fn acknowledge(&self, message: &str) -> Result<()> {
        if !io::stdin().is_terminal() {
            debug!("stdin is not a terminal, skipping acknowledgment");
            return Ok(());
        }
        self.read_answer(message).await?;
        Ok(())
    }
}

/// Answers every confirmation with [`Decision::Yes`] and forwards the rest.
pub struct AutoConfirm<P> {
    inner: P,
}

impl<P: Prompter> AutoConfirm<P> {
    pub const fn new(inner: P) -> Self {
        Self {
            inner,
        }
    }
}

impl<P: Prompter> Prompter for AutoConfirm<P> {
    async fn confirm(&self, message: &str) -> Result<Decision> {
        debug!("Auto-confirming: {}", message);
        Ok(Decision::Yes)
    }

    fn select_directory(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<Option<PathBuf>>> + Send {
        self.inner.select_directory(prompt)
    }

    fn acknowledge(&self, message: &str) -> impl Future<Output = Result<()>> + Send {
        self.inner.acknowledge(message)
    }
}

/// Expand a leading `~` to the home directory.
#[must_use]
pub fn expand_home(input: &str) -> PathBuf {
    let trimmed = input.trim().trim_matches('"');
    if let Some(rest) = trimmed.strip_prefix('~')
        && let Some(home) = dirs::home_dir()
    {
        let rest = rest.trim_start_matches(['/', '\\']);
        return if rest.is_empty() {
            home
        } else {
            home.join(rest)
        };
    }
    PathBuf::from(trimmed)
}
