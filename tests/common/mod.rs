//! Common test utilities and fixtures for libhelper integration tests
//!
//! Every test gets its own installation root, its own scratch directory for
//! downloads and a local HTTP server standing in for both the internet probe
//! target and the download server.

// Allow dead code because these utilities are used across different test files
// and not all utilities are used in every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use libhelper::config::{InstallerConfig, ProbeConfig};
use libhelper::installer::InstallOrchestrator;
use libhelper::prompt::Prompter;
use libhelper::target::ConfidenceSignal;
use libhelper::test_utils::fixtures::libraries_archive;
use libhelper::test_utils::{TestServer, create_markers, sha1_hex};
use libhelper::utils::Console;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;

pub const PROBE_PATH: &str = "generate_204";
pub const LIVENESS_PATH: &str = "news.html";
pub const ARCHIVE_NAME: &str = "libraries.zip";

/// Local stand-in for the internet and the download server.
pub struct CdnFixture {
    pub server: TestServer,
    pub archive: Vec<u8>,
    pub digest: String,
}

impl CdnFixture {
    /// Serve the standard libraries archive.
    pub async fn start() -> Result<Self> {
        Self::serving(libraries_archive()?).await
    }

    /// Serve `archive` as `libraries.zip`.
    pub async fn serving(archive: Vec<u8>) -> Result<Self> {
        let server = TestServer::builder()
            .route(PROBE_PATH, Vec::new())
            .route(LIVENESS_PATH, b"<html>news</html>".to_vec())
            .route(ARCHIVE_NAME, archive.clone())
            .start()
            .await;
        let digest = sha1_hex(&archive);
        Ok(Self {
            server,
            archive,
            digest,
        })
    }

    /// Configuration pointing every network access at this server.
    pub fn config(&self) -> InstallerConfig {
        let mut config = InstallerConfig::default();
        config.remote.base_url = self.server.base_url();
        config.remote.digest = self.digest.clone();
        config.probe = ProbeConfig {
            timeout_ms: 2000,
            default_url: self.server.url(PROBE_PATH),
            locale_urls: BTreeMap::new(),
        };
        config
    }

    /// The same configuration as a TOML file the binary can load.
    pub fn write_config_file(&self, dir: &Path) -> Result<PathBuf> {
        let config = self.config();
        let content = toml::to_string(&config).context("Failed to serialize config")?;
        let path = dir.join("config.toml");
        fs::write(&path, content)?;
        Ok(path)
    }
}

/// An installation root plus a scratch directory for downloads.
pub struct TestInstall {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub scratch: PathBuf,
}

impl TestInstall {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("minecraft");
        let scratch = temp_dir.path().join("scratch");
        fs::create_dir_all(&root)?;
        fs::create_dir_all(&scratch)?;
        Ok(Self {
            _temp_dir: temp_dir,
            root,
            scratch,
        })
    }

    /// Root carrying every marker folder, with an old libraries folder.
    pub fn complete() -> Result<Self> {
        let install = Self::new()?;
        install.add_markers(&ConfidenceSignal::ALL)?;
        install.write_old_library()?;
        Ok(install)
    }

    pub fn add_markers(&self, signals: &[ConfidenceSignal]) -> Result<()> {
        create_markers(&self.root, signals)
    }

    /// Put a file into `libraries/old/` so replacement is observable.
    pub fn write_old_library(&self) -> Result<PathBuf> {
        let path = self.root.join("libraries/old/legacy.jar");
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, b"legacy")?;
        Ok(path)
    }

    /// A sibling directory of the root, for folder selection.
    pub fn sibling(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.parent().unwrap().join(name);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    pub fn libraries(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Quiet orchestrator downloading into the scratch directory.
    pub fn orchestrator<P: Prompter>(
        &self,
        config: InstallerConfig,
        prompter: P,
    ) -> InstallOrchestrator<P> {
        InstallOrchestrator::new(config, &self.root, prompter)
            .with_console(Console::new(true))
            .with_temp_root(&self.scratch)
    }

    /// Files left in per-run download directories.
    pub fn leftover_downloads(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for run_dir in fs::read_dir(&self.scratch)? {
            let run_dir = run_dir?.path();
            if run_dir.is_dir() {
                for file in fs::read_dir(&run_dir)? {
                    files.push(file?.path());
                }
            }
        }
        Ok(files)
    }

    /// Number of per-run download directories created.
    pub fn download_dirs(&self) -> Result<usize> {
        Ok(fs::read_dir(&self.scratch)?.filter_map(Result::ok).filter(|e| e.path().is_dir()).count())
    }

    /// The libhelper binary, started in the root with a clean environment.
    pub fn libhelper(&self) -> Command {
        let mut cmd = Command::cargo_bin("libhelper").unwrap();
        cmd.current_dir(&self.root)
            .env("LIBHELPER_NO_PROGRESS", "1")
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("LIBHELPER_CONFIG");
        cmd
    }

    /// Run the libhelper binary with `args` and a closed stdin.
    pub fn run_libhelper(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.libhelper().args(args).output().context("Failed to run libhelper")?;
        Ok(CommandOutput::from(output))
    }

    /// Run the libhelper binary with `args`, feeding `input` on stdin.
    pub fn run_libhelper_with_input(&self, args: &[&str], input: &str) -> Result<CommandOutput> {
        let output = self
            .libhelper()
            .args(args)
            .write_stdin(input)
            .output()
            .context("Failed to run libhelper")?;
        Ok(CommandOutput::from(output))
    }
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStdout: {}\nStderr: {}",
            self.code, self.stdout, self.stderr
        );
        self
    }

    /// Assert the command exited with `code`
    pub fn assert_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.code,
            Some(code),
            "Unexpected exit code\nStdout: {}\nStderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    /// Assert stderr contains the given text
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}

/// File assertion helpers
pub struct FileAssert;

impl FileAssert {
    /// Assert a file exists
    pub fn exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// Assert a file does not exist
    pub fn not_exists(path: impl AsRef<Path>) {
        let path = path.as_ref();
        assert!(!path.exists(), "Expected file to not exist: {}", path.display());
    }

    /// Assert a file has exactly `expected` as content
    pub fn content(path: impl AsRef<Path>, expected: &[u8]) {
        let path = path.as_ref();
        let content = fs::read(path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
        assert_eq!(content, expected, "Unexpected content in {}", path.display());
    }
}
