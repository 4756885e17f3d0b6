//! Command-line interface for libhelper
//!
//! libhelper has no subcommands: one invocation is one install run. Flags
//! adjust where the run starts, what it downloads and how it talks to the
//! user.
//!
//! # Global Options
//!
//! - `--target <DIR>` - Installation root to check first (default: current directory)
//! - `--config <FILE>` - Configuration file (also `LIBHELPER_CONFIG`)
//! - `--base-url`, `--file-name`, `--digest`, `--algorithm` - Override the remote archive
//! - `--yes` - Replace an existing libraries folder without asking
//! - `--no-pause` - Exit without waiting for Enter
//! - `--no-progress` - Do not draw progress bars
//! - `--verbose` / `--quiet` - Log level
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Installed |
//! | 1 | Configuration or unexpected error |
//! | 2 | Installation folder not found |
//! | 3 | No internet connection |
//! | 4 | Download server unreachable |
//! | 5 | Download failed or canceled |
//! | 6 | Checksum mismatch |
//! | 7 | Replacement declined |
//! | 8 | Old libraries folder could not be deleted |
//! | 9 | Extraction failed |
//!
//! # Examples
//!
//! ```bash
//! # Run next to the Minecraft folder
//! libhelper
//!
//! # Unattended run against a mirror
//! libhelper --target ~/modpack --base-url https://mirror.example.com/ --yes --no-pause
//! ```

use crate::config::{ConfigOverrides, InstallerConfig};
use crate::core::user_friendly_error;
use crate::installer::{InstallOrchestrator, InstallOutcome, default_start_dir};
use crate::prompt::{AutoConfirm, Prompter, TerminalPrompter};
use crate::utils::Console;
use crate::verification::DigestAlgorithm;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Message shown by the acknowledgment gate.
pub const EXIT_PROMPT: &str = "Press Enter to exit...";

/// Settings derived from the command line that are not part of
/// [`InstallerConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
    pub quiet: bool,
    pub no_progress: bool,
    /// Whether to wait for the user before exiting.
    pub pause: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            quiet: false,
            no_progress: false,
            pause: true,
        }
    }
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over [`log_level`](Self::log_level).
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(&self.log_level)
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    #[must_use]
    pub const fn console(&self) -> Console {
        Console::new(self.quiet).with_progress(!self.no_progress)
    }
}

/// Replaces the `libraries` folder of a modpack installation with a verified
/// archive from the download server.
#[derive(Parser, Debug)]
#[command(
    name = "libhelper",
    about = "Replace the libraries folder of a Minecraft modpack with a verified download",
    version,
    author,
    long_about = "libhelper finds the modpack installation folder, downloads the current libraries \
archive, checks its SHA-1 and swaps it in for the existing libraries folder."
)]
pub struct Cli {
    /// Installation root to check first.
    ///
    /// Defaults to the current directory. If it does not look like a
    /// Minecraft installation you are asked to pick one.
    #[arg(long, value_name = "DIR")]
    target: Option<PathBuf>,

    /// Path to a configuration file.
    #[arg(long, env = "LIBHELPER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the download server.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Archive file name on the download server.
    #[arg(long, value_name = "NAME")]
    file_name: Option<String>,

    /// Expected hex digest of the archive.
    #[arg(long, value_name = "HEX")]
    digest: Option<String>,

    /// Digest algorithm of `--digest` (sha1 or sha256).
    #[arg(long, value_name = "ALG")]
    algorithm: Option<DigestAlgorithm>,

    /// Replace an existing libraries folder without asking.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Exit immediately instead of waiting for Enter.
    #[arg(long)]
    no_pause: bool,

    /// Disable progress bars.
    #[arg(long)]
    no_progress: bool,

    /// Enable debug logging.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            quiet: self.quiet,
            no_progress: self.no_progress,
            pause: !self.no_pause,
        }
    }

    /// Command-line values layered over the configuration file.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            file_name: self.file_name.clone(),
            digest: self.digest.clone(),
            algorithm: self.algorithm,
        }
    }

    /// Load, override and validate the installer configuration.
    pub async fn load_config(&self) -> Result<InstallerConfig> {
        let config = InstallerConfig::load_with_optional(self.config.clone())
            .await?
            .with_overrides(self.overrides());
        config.validate()?;
        Ok(config)
    }

    /// Run once, report the outcome and pass the acknowledgment gate.
    ///
    /// Returns the process exit code.
    pub async fn run(self) -> i32 {
        let cli_config = self.build_config();
        cli_config.init_logging();
        let console = cli_config.console();
        let prompter = TerminalPrompter::new();

        let code = match self.execute(console, prompter.clone()).await {
            Ok(outcome) => {
                console.success(&format!(
                    "Installed {} files into {}",
                    outcome.replace.summary.files,
                    outcome.libraries_path.display()
                ));
                0
            }
            Err(e) => {
                let context = user_friendly_error(e);
                context.display();
                context.exit_code()
            }
        };

        if cli_config.pause {
            if let Err(e) = prompter.acknowledge(EXIT_PROMPT).await {
                debug!("Acknowledgment failed: {}", e);
            }
        }
        code
    }

    /// Run the install pipeline, asking through `prompter`.
    pub async fn execute(
        self,
        console: Console,
        prompter: TerminalPrompter,
    ) -> Result<InstallOutcome> {
        let config = self.load_config().await?;
        let start_dir = match self.target.clone() {
            Some(target) => target,
            None => default_start_dir()?,
        };
        debug!("Starting from {}", start_dir.display());

        if self.yes {
            install(config, start_dir, AutoConfirm::new(prompter), console).await
        } else {
            install(config, start_dir, prompter, console).await
        }
    }
}

async fn install<P: Prompter>(
    config: InstallerConfig,
    start_dir: PathBuf,
    prompter: P,
    console: Console,
) -> Result<InstallOutcome> {
    InstallOrchestrator::new(config, start_dir, prompter).with_console(console).run().await
}
