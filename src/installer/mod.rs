//! End-to-end install pipeline.
//!
//! [`InstallOrchestrator`] drives one run through the states of
//! [`InstallState`]:
//!
//! ```text
//! Init → LocatingTarget → [PromptingForPath] → CheckingConnectivity
//!      → Downloading → Verifying → [ConfirmingReplace] → Replacing → Done
//! ```
//!
//! Any state may end in `FatalExit`. Failures come back as a
//! [`LibhelperError`] inside the `anyhow::Error`; the caller reports them and
//! runs the acknowledgment gate. The orchestrator itself never exits the
//! process.

use crate::config::{InstallerConfig, RemoteArtifact};
use crate::core::LibhelperError;
use crate::net::{ConnectivityProbe, DownloadAttempt, DownloadStatus, Downloader};
use crate::prompt::Prompter;
use crate::replace::{FsReplaceOps, ReplaceEngine, ReplaceOps, ReplaceOutcome, ReplacementPlan};
use crate::target::InstallationTarget;
use crate::utils::{Console, ProgressBar};
use crate::verification::ChecksumVerifier;
use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Init,
    LocatingTarget,
    PromptingForPath,
    CheckingConnectivity,
    Downloading,
    Verifying,
    ConfirmingReplace,
    Replacing,
    Done,
    FatalExit,
}

impl InstallState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::FatalExit)
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::LocatingTarget => "locating-target",
            Self::PromptingForPath => "prompting-for-path",
            Self::CheckingConnectivity => "checking-connectivity",
            Self::Downloading => "downloading",
            Self::Verifying => "verifying",
            Self::ConfirmingReplace => "confirming-replace",
            Self::Replacing => "replacing",
            Self::Done => "done",
            Self::FatalExit => "fatal-exit",
        };
        f.write_str(name)
    }
}

/// A successful run.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub target: InstallationTarget,
    pub libraries_path: PathBuf,
    /// Digest of the installed archive as computed locally.
    pub digest: String,
    pub replace: ReplaceOutcome,
}

/// Sequences detection, connectivity checks, download, verification and
/// replacement for one run.
pub struct InstallOrchestrator<P, O = FsReplaceOps> {
    config: InstallerConfig,
    artifact: RemoteArtifact,
    start_dir: PathBuf,
    prompter: P,
    engine: ReplaceEngine<O>,
    console: Console,
    temp_root: PathBuf,
    history: Vec<InstallState>,
}

impl<P: Prompter> InstallOrchestrator<P, FsReplaceOps> {
    /// Orchestrator working on the real filesystem, starting from `start_dir`.
    pub fn new(config: InstallerConfig, start_dir: impl Into<PathBuf>, prompter: P) -> Self {
        Self::with_engine(config, start_dir, prompter, ReplaceEngine::new(FsReplaceOps))
    }
}

impl<P: Prompter, O: ReplaceOps> InstallOrchestrator<P, O> {
    pub fn with_engine(
        config: InstallerConfig,
        start_dir: impl Into<PathBuf>,
        prompter: P,
        engine: ReplaceEngine<O>,
    ) -> Self {
        let artifact = config.artifact();
        Self {
            config,
            artifact,
            start_dir: start_dir.into(),
            prompter,
            engine,
            console: Console::default(),
            temp_root: std::env::temp_dir(),
            history: vec![InstallState::Init],
        }
    }

    #[must_use]
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Create per-run download directories under `temp_root` instead of the
    /// system temp directory.
    #[must_use]
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    #[must_use]
    pub fn state(&self) -> InstallState {
        self.history.last().copied().unwrap_or(InstallState::Init)
    }

    /// Every state entered so far, in order.
    #[must_use]
    pub fn history(&self) -> &[InstallState] {
        &self.history
    }

    #[must_use]
    pub const fn prompter(&self) -> &P {
        &self.prompter
    }

    #[must_use]
    pub const fn artifact(&self) -> &RemoteArtifact {
        &self.artifact
    }

    /// Run the pipeline to `Done` or `FatalExit`.
    pub async fn run(&mut self) -> Result<InstallOutcome> {
        match self.run_pipeline().await {
            Ok(outcome) => {
                self.transition(InstallState::Done);
                Ok(outcome)
            }
            Err(e) => {
                self.transition(InstallState::FatalExit);
                Err(e)
            }
        }
    }

    async fn run_pipeline(&mut self) -> Result<InstallOutcome> {
        self.console.status("Starting up...");

        self.transition(InstallState::LocatingTarget);
        let target = self.locate_target().await?;
        info!("Installation root: {} (score {})", target.path().display(), target.score());

        self.transition(InstallState::CheckingConnectivity);
        self.check_connectivity().await?;

        self.transition(InstallState::Downloading);
        let attempt = self.download().await?;

        self.transition(InstallState::Verifying);
        let digest = self.verify(&attempt).await?;

        let plan =
            ReplacementPlan::new(target.path(), attempt.file_path(), &self.config.replace);
        if plan.target_dir().exists() {
            self.transition(InstallState::ConfirmingReplace);
            self.engine.confirm(&plan, &self.prompter).await?;
            self.console.status(&format!("Removing existing {} files...", plan.subdirectory));
        }

        self.transition(InstallState::Replacing);
        self.console.status(&format!("Extracting new files to '{}'...", plan.subdirectory));
        let replace = self.engine.execute(&plan).await?;
        self.console.success("Extraction complete! You should now try launching Minecraft again.");

        Ok(InstallOutcome {
            libraries_path: plan.target_dir(),
            target,
            digest,
            replace,
        })
    }

    fn transition(&mut self, next: InstallState) {
        debug!("Install state: {} -> {}", self.state(), next);
        self.history.push(next);
    }

    async fn locate_target(&mut self) -> Result<InstallationTarget> {
        let cutoff = self.config.target.confidence_cutoff;

        self.console.status("Checking environment...");
        let mut target = InstallationTarget::new(&self.start_dir);
        self.report_scan(&target);
        if target.meets(cutoff) {
            return Ok(target);
        }

        self.transition(InstallState::PromptingForPath);
        let message = format!(
            "It seems this program was not launched alongside the target directory for Minecraft ({}).\n\nWould you like to specify the target directory now?",
            self.start_dir.display()
        );
        if !self.prompter.confirm(&message).await?.is_yes() {
            return Err(LibhelperError::TargetNotConfirmed.into());
        }

        let max_attempts = self.config.target.max_selection_attempts;
        for used in 0..max_attempts {
            let left = max_attempts - used;
            let plural = if left > 1 { "tries" } else { "try" };
            let prompt = format!("Please select the target directory. ({left} {plural} left.)");
            match self.prompter.select_directory(&prompt).await? {
                Some(path) => {
                    target = InstallationTarget::new(path);
                    self.report_scan(&target);
                    if target.meets(cutoff) {
                        return Ok(target);
                    }
                    self.console.warning(&format!(
                        "{} does not look like a Minecraft installation.",
                        target.path().display()
                    ));
                }
                None => self.console.warning("Selection canceled, please try again."),
            }
        }

        Err(LibhelperError::TargetAttemptsExhausted {
            attempts: max_attempts,
        }
        .into())
    }

    fn report_scan(&self, target: &InstallationTarget) {
        self.console.status(&format!("Testing {}...", target.path().display()));
        for signal in target.signals() {
            self.console.status(&format!("Found '{signal}' folder!"));
        }
        debug!(
            "{} scored {} ({:?})",
            target.path().display(),
            target.score(),
            target.signals()
        );
    }

    async fn check_connectivity(&self) -> Result<()> {
        let probe = ConnectivityProbe::new(self.config.probe.clone());

        self.console.status("Checking internet connection...");
        if !probe.check_internet().await {
            return Err(LibhelperError::NoInternet.into());
        }

        self.console.status("Checking remote website availability...");
        let liveness_url = self.artifact.liveness_url();
        if !probe.check(&liveness_url).await {
            return Err(LibhelperError::EndpointUnreachable {
                url: liveness_url,
            }
            .into());
        }
        Ok(())
    }

    async fn download(&self) -> Result<DownloadAttempt> {
        let attempt = DownloadAttempt::create_in(&self.temp_root, self.artifact.file_name()).await?;
        let downloader = Downloader::new(self.config.download.timeout())?;
        let url = self.artifact.url();

        self.console.status("Downloading content...");
        let handle = downloader.start(url.clone(), attempt.file_path());

        let show_bar = self.console.shows_progress();
        let mut bar: Option<ProgressBar> = None;
        let status = handle
            .wait(|event| {
                debug!("Download progress: {}%", event.percent);
                if show_bar {
                    bar.get_or_insert_with(|| {
                        let bar = ProgressBar::for_download(event.total);
                        bar.set_prefix("Downloading");
                        bar
                    })
                    .update(&event);
                }
            })
            .await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        match status {
            DownloadStatus::Succeeded => Ok(attempt),
            DownloadStatus::Faulted(reason) => Err(LibhelperError::DownloadFailed {
                url,
                reason,
            }
            .into()),
            DownloadStatus::Canceled => Err(LibhelperError::DownloadCanceled {
                url,
            }
            .into()),
        }
    }

    async fn verify(&self, attempt: &DownloadAttempt) -> Result<String> {
        self.console.status("Download complete. Validating...");

        let result = ChecksumVerifier::verify_checksum(
            attempt.file_path(),
            self.artifact.expected_digest(),
            self.artifact.algorithm(),
        )
        .await;

        if let Err(e) = &result
            && matches!(
                e.downcast_ref::<LibhelperError>(),
                Some(LibhelperError::ChecksumMismatch { .. })
            )
        {
            warn!("Discarding {} after checksum mismatch", attempt.temp_dir().display());
            attempt.discard().await;
        }
        result
    }
}

/// Default starting directory: the current working directory.
pub fn default_start_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}
