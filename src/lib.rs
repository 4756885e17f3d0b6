//! libhelper - modpack libraries installer
//!
//! Replaces the `libraries` folder of a Minecraft modpack installation with
//! the current archive from the download server. A run:
//!
//! 1. Finds the installation root by scoring marker folders, asking the user
//!    for a folder when the working directory does not look right
//! 2. Checks that the internet and the download server are reachable
//! 3. Downloads the archive into a fresh temporary directory
//! 4. Verifies its SHA-1 against the expected digest
//! 5. Deletes the old `libraries` folder (after confirmation, with retries)
//!    and extracts the archive in its place
//!
//! # Modules
//!
//! - [`target`] - Installation root detection and confidence scoring
//! - [`net`] - Connectivity probes and the archive downloader
//! - [`verification`] - Streaming digest computation and comparison
//! - [`replace`] - Delete-then-extract of the libraries folder
//! - [`installer`] - The install state machine tying everything together
//! - [`prompt`] - User decisions (confirmations, folder selection)
//! - [`config`] - Defaults, configuration file and overrides
//! - [`core`] - Error types and user-facing error reporting
//! - [`cli`] - Command-line entry point
//! - [`utils`] - Console output, progress bars and retry backoff
//!
//! # Example
//!
//! ```rust,no_run
//! use libhelper::config::InstallerConfig;
//! use libhelper::installer::InstallOrchestrator;
//! use libhelper::prompt::TerminalPrompter;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = InstallerConfig::load_with_optional(None).await?;
//! config.validate()?;
//! let outcome = InstallOrchestrator::new(config, ".", TerminalPrompter::new()).run().await?;
//! println!("Installed into {}", outcome.libraries_path.display());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod installer;
pub mod net;
pub mod prompt;
pub mod replace;
pub mod target;
pub mod utils;
pub mod verification;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
