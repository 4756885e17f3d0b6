//! Destructive replacement of the libraries directory.
//!
//! A [`ReplacementPlan`] names the installation root, the subdirectory to
//! replace and the verified archive. [`ReplaceEngine::run`] carries it out:
//!
//! 1. If the subdirectory exists, ask for confirmation. Declining removes the
//!    downloaded archive (best effort) and ends the run.
//! 2. Delete the subdirectory, retrying with backoff until the attempt budget
//!    is spent. Every attempt is used before giving up.
//! 3. Extract the archive into the root. A failure here is final; the old
//!    directory is already gone and is not restored.
//!
//! Filesystem effects go through [`ReplaceOps`] so the retry and ordering
//! rules can be exercised with scripted failures.

pub mod extract;

pub use extract::{ExtractSummary, archive_root, extract_zip};

use crate::config::ReplaceConfig;
use crate::core::LibhelperError;
use crate::prompt::Prompter;
use crate::utils::backoff::exponential_backoff_with_delay;
use anyhow::{Context, Result};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Filesystem effects of a replacement.
pub trait ReplaceOps: Send + Sync {
    /// Recursively delete `path`.
    fn remove_dir_all(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    /// Extract `archive` into `destination`. `expected_root` is the
    /// top-level directory the archive should contain.
    fn extract(
        &self,
        archive: &Path,
        destination: &Path,
        expected_root: &str,
    ) -> impl Future<Output = Result<ExtractSummary>> + Send;
}

/// Real filesystem operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReplaceOps;

impl ReplaceOps for FsReplaceOps {
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }

    async fn extract(
        &self,
        archive: &Path,
        destination: &Path,
        expected_root: &str,
    ) -> Result<ExtractSummary> {
        let archive = archive.to_path_buf();
        let destination = destination.to_path_buf();
        let expected_root = expected_root.to_string();

        tokio::task::spawn_blocking(move || {
            match archive_root(&archive)? {
                Some(root) if root == Path::new(&expected_root) => {}
                Some(root) => warn!(
                    "Archive top-level directory is '{}', expected '{}'",
                    root.display(),
                    expected_root
                ),
                None => warn!(
                    "Archive {} has no single top-level directory, expected '{}'",
                    archive.display(),
                    expected_root
                ),
            }
            extract_zip(&archive, &destination)
        })
        .await
        .context("Extraction task failed")?
    }
}

/// What to replace and with what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementPlan {
    pub destination_root: PathBuf,
    pub subdirectory: String,
    pub archive: PathBuf,
    pub max_attempts: u32,
}

impl ReplacementPlan {
    #[must_use]
    pub fn new(destination_root: &Path, archive: &Path, config: &ReplaceConfig) -> Self {
        Self {
            destination_root: destination_root.to_path_buf(),
            subdirectory: config.subdirectory.clone(),
            archive: archive.to_path_buf(),
            max_attempts: config.max_delete_attempts,
        }
    }

    /// `<destination_root>/<subdirectory>`
    #[must_use]
    pub fn target_dir(&self) -> PathBuf {
        self.destination_root.join(&self.subdirectory)
    }
}

/// Result of a completed replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub replaced_existing: bool,
    /// Deletion attempts used, `0` when nothing had to be deleted.
    pub delete_attempts: u32,
    pub summary: ExtractSummary,
}

/// Executes replacement plans.
pub struct ReplaceEngine<O> {
    ops: O,
    backoff: bool,
}

impl<O: ReplaceOps> ReplaceEngine<O> {
    pub const fn new(ops: O) -> Self {
        Self {
            ops,
            backoff: true,
        }
    }

    /// Retry deletions immediately instead of backing off.
    #[must_use]
    pub const fn without_backoff(mut self) -> Self {
        self.backoff = false;
        self
    }

    pub const fn ops(&self) -> &O {
        &self.ops
    }

    /// Carry out `plan`, asking `prompter` before deleting anything.
    pub async fn run<P: Prompter>(
        &self,
        plan: &ReplacementPlan,
        prompter: &P,
    ) -> Result<ReplaceOutcome> {
        self.confirm(plan, prompter).await?;
        self.execute(plan).await
    }

    /// Ask before replacing an existing subdirectory.
    ///
    /// Nothing is asked when the subdirectory is absent. A declined or
    /// canceled prompt removes the archive and fails with
    /// [`LibhelperError::ReplaceDeclined`].
    pub async fn confirm<P: Prompter>(&self, plan: &ReplacementPlan, prompter: &P) -> Result<()> {
        let target = plan.target_dir();
        if !target.exists() {
            debug!("{} does not exist, nothing to confirm", target.display());
            return Ok(());
        }

        let message = format!(
            "The '{}' folder already exists at {}. It has to be deleted to replace it. Do you want to continue?",
            plan.subdirectory,
            target.display()
        );
        let decision = prompter.confirm(&message).await?;
        if decision.is_yes() {
            return Ok(());
        }

        info!("Replacement of {} declined ({:?})", target.display(), decision);
        remove_archive(&plan.archive).await;
        Err(LibhelperError::ReplaceDeclined {
            path: target,
        }
        .into())
    }

    /// Delete the existing subdirectory if any, then extract the archive.
    ///
    /// Call [`confirm`](Self::confirm) first; this does not ask. The archive
    /// is removed once extraction finishes or deletion gives up.
    pub async fn execute(&self, plan: &ReplacementPlan) -> Result<ReplaceOutcome> {
        let target = plan.target_dir();
        let replaced_existing = target.exists();
        let delete_attempts = if replaced_existing {
            match self.delete_with_retry(&target, plan.max_attempts).await {
                Ok(attempts) => attempts,
                Err(e) => {
                    remove_archive(&plan.archive).await;
                    return Err(e);
                }
            }
        } else {
            0
        };

        info!("Extracting {} into {}", plan.archive.display(), plan.destination_root.display());
        let summary = self
            .ops
            .extract(&plan.archive, &plan.destination_root, &plan.subdirectory)
            .await
            .map_err(|e| {
                warn!("Extraction of {} failed: {:#}", plan.archive.display(), e);
                LibhelperError::ExtractionFailed {
                    archive: plan.archive.clone(),
                    reason: format!("{e:#}"),
                }
            })?;

        remove_archive(&plan.archive).await;

        Ok(ReplaceOutcome {
            replaced_existing,
            delete_attempts,
            summary,
        })
    }

    /// Delete `target`, using up to `max_attempts` tries. Returns the number used.
    async fn delete_with_retry(&self, target: &Path, max_attempts: u32) -> Result<u32> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.ops.remove_dir_all(target).await {
                Ok(()) => {
                    debug!("Deleted {} on attempt {}", target.display(), attempt);
                    return Ok(attempt);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{} vanished before deletion", target.display());
                    return Ok(attempt);
                }
                Err(e) if attempt < max_attempts => {
                    warn!(
                        "Delete attempt {}/{} for {} failed: {}. Retrying...",
                        attempt,
                        max_attempts,
                        target.display(),
                        e
                    );
                    if self.backoff {
                        exponential_backoff_with_delay(attempt - 1).await;
                    }
                }
                Err(e) => {
                    warn!("Giving up deleting {} after {} attempts: {}", target.display(), attempt, e);
                    return Err(LibhelperError::DeletionFailed {
                        path: target.to_path_buf(),
                        attempts: attempt,
                    }
                    .into());
                }
            }
        }
    }
}

/// Best-effort delete of the downloaded archive. Failures are only logged.
pub async fn remove_archive(archive: &Path) {
    match tokio::fs::remove_file(archive).await {
        Ok(()) => debug!("Removed temporary archive {}", archive.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Unable to delete temporary file {}: {}", archive.display(), e),
    }
}
