//! Configuration management for libhelper
//!
//! Every tunable of an install run has a built-in default in
//! [`crate::constants`]. A TOML file can override any of them, and CLI flags
//! override the file:
//!
//! 1. Built-in defaults
//! 2. Configuration file (`--config`, `LIBHELPER_CONFIG`, or the default path)
//! 3. Command-line flags
//!
//! **Default location:**
//! - Unix/macOS: `~/.libhelper/config.toml`
//! - Windows: `%LOCALAPPDATA%\libhelper\config.toml`
//!
//! A missing default file is not an error. A file that was named explicitly
//! must exist.
//!
//! ```toml
//! [remote]
//! base_url = "https://cdn.example.com/"
//! file_name = "libraries.zip"
//! digest = "4CCC254CA84988184064DDE4EC150F2601D4C98C"
//! algorithm = "sha1"
//!
//! [probe]
//! timeout_ms = 1000
//! default_url = "http://www.gstatic.com/generate_204"
//!
//! [probe.locale_urls]
//! zh = "http://www.baidu.com"
//!
//! [target]
//! max_selection_attempts = 3
//!
//! [replace]
//! max_delete_attempts = 10
//! subdirectory = "libraries"
//! ```

mod locale;

pub use locale::{current_locale, locale_from_env_values};

use crate::constants::{
    CONFIDENCE_CUTOFF, DEFAULT_BASE_URL, DEFAULT_DIGEST, DEFAULT_FILE_NAME, DEFAULT_PROBE_URL,
    DOWNLOAD_TIMEOUT_SECS, LIBRARIES_DIR, LIVENESS_PAGE, LOCALE_PROBE_URLS, MAX_DELETE_ATTEMPTS,
    MAX_SELECTION_ATTEMPTS, PROBE_TIMEOUT_MS,
};
use crate::core::LibhelperError;
use crate::verification::DigestAlgorithm;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Full configuration of an install run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallerConfig {
    pub remote: RemoteConfig,
    pub probe: ProbeConfig,
    pub target: TargetConfig,
    pub replace: ReplaceConfig,
    pub download: DownloadConfig,
}

/// The archive to fetch and how to check it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub file_name: String,
    pub digest: String,
    pub algorithm: DigestAlgorithm,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            digest: DEFAULT_DIGEST.to_string(),
            algorithm: DigestAlgorithm::Sha1,
        }
    }
}

/// Connectivity probe settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_ms: u64,
    pub default_url: String,
    /// Locale prefix (`zh`, `fa`, ...) to probe URL.
    pub locale_urls: BTreeMap<String, String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: PROBE_TIMEOUT_MS,
            default_url: DEFAULT_PROBE_URL.to_string(),
            locale_urls: LOCALE_PROBE_URLS
                .iter()
                .map(|(prefix, url)| ((*prefix).to_string(), (*url).to_string()))
                .collect(),
        }
    }
}

impl ProbeConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Probe URL for a locale name such as `zh-CN` or `fa_IR.UTF-8`.
    ///
    /// The longest matching prefix wins; no match falls back to `default_url`.
    #[must_use]
    pub fn url_for_locale(&self, locale: Option<&str>) -> &str {
        let Some(locale) = locale else {
            return &self.default_url;
        };
        let locale = locale.to_ascii_lowercase();
        self.locale_urls
            .iter()
            .filter(|(prefix, _)| !prefix.is_empty() && locale.starts_with(&prefix.to_ascii_lowercase()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(&self.default_url, |(_, url)| url)
    }

    /// Probe URL for the locale of the running system.
    #[must_use]
    pub fn url_for_system_locale(&self) -> &str {
        let locale = current_locale();
        debug!("System locale: {:?}", locale);
        self.url_for_locale(locale.as_deref())
    }
}

/// Directory detection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetConfig {
    pub max_selection_attempts: u32,
    pub confidence_cutoff: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            max_selection_attempts: MAX_SELECTION_ATTEMPTS,
            confidence_cutoff: CONFIDENCE_CUTOFF,
        }
    }
}

/// Replacement settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReplaceConfig {
    pub max_delete_attempts: u32,
    pub subdirectory: String,
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        Self {
            max_delete_attempts: MAX_DELETE_ATTEMPTS,
            subdirectory: LIBRARIES_DIR.to_string(),
        }
    }
}

/// Transfer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DownloadConfig {
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

impl DownloadConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub file_name: Option<String>,
    pub digest: Option<String>,
    pub algorithm: Option<DigestAlgorithm>,
}

impl InstallerConfig {
    /// Load from an explicit path, or from the default path when it exists.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(&path).await,
            None => {
                let Ok(path) = Self::default_path() else {
                    return Ok(Self::default());
                };
                if path.exists() {
                    Self::load_from(&path).await
                } else {
                    debug!("No config file at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("libhelper")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".libhelper")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Apply command-line values on top of this configuration.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(base_url) = overrides.base_url {
            self.remote.base_url = base_url;
        }
        if let Some(file_name) = overrides.file_name {
            self.remote.file_name = file_name;
        }
        if let Some(digest) = overrides.digest {
            self.remote.digest = digest;
        }
        if let Some(algorithm) = overrides.algorithm {
            self.remote.algorithm = algorithm;
        }
        self
    }

    /// Reject values that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| {
            anyhow::Error::from(LibhelperError::ConfigError {
                message,
            })
        };

        if self.remote.base_url.trim().is_empty() {
            return Err(invalid("remote.base_url must not be empty".to_string()));
        }
        if self.remote.file_name.trim().is_empty() {
            return Err(invalid("remote.file_name must not be empty".to_string()));
        }
        if self.remote.file_name.contains(['/', '\\']) {
            return Err(invalid(format!(
                "remote.file_name '{}' must be a plain file name",
                self.remote.file_name
            )));
        }
        self.remote
            .algorithm
            .validate_hex(self.remote.digest.trim())
            .map_err(|e| invalid(format!("remote.digest: {e}")))?;
        if self.target.max_selection_attempts == 0 {
            return Err(invalid("target.max_selection_attempts must be at least 1".to_string()));
        }
        if self.replace.max_delete_attempts == 0 {
            return Err(invalid("replace.max_delete_attempts must be at least 1".to_string()));
        }
        if self.replace.subdirectory.trim().is_empty()
            || self.replace.subdirectory.contains(['/', '\\'])
            || self.replace.subdirectory == ".."
        {
            return Err(invalid(format!(
                "replace.subdirectory '{}' must be a single directory name",
                self.replace.subdirectory
            )));
        }
        if self.probe.timeout_ms == 0 {
            return Err(invalid("probe.timeout_ms must be greater than 0".to_string()));
        }
        if self.download.timeout_secs == 0 {
            return Err(invalid("download.timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// The remote artifact described by this configuration.
    #[must_use]
    pub fn artifact(&self) -> RemoteArtifact {
        RemoteArtifact::new(
            &self.remote.base_url,
            &self.remote.file_name,
            self.remote.digest.trim(),
            self.remote.algorithm,
        )
    }
}

/// The archive identity: where it lives and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArtifact {
    base_url: String,
    file_name: String,
    expected_digest: String,
    algorithm: DigestAlgorithm,
}

impl RemoteArtifact {
    /// A trailing `/` is added to `base_url` when missing.
    #[must_use]
    pub fn new(
        base_url: &str,
        file_name: &str,
        expected_digest: &str,
        algorithm: DigestAlgorithm,
    ) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            file_name: file_name.to_string(),
            expected_digest: expected_digest.to_string(),
            algorithm,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn expected_digest(&self) -> &str {
        &self.expected_digest
    }

    #[must_use]
    pub const fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// `<base_url><file_name>`
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.file_name)
    }

    /// `<base_url>news.html`
    #[must_use]
    pub fn liveness_url(&self) -> String {
        format!("{}{}", self.base_url, LIVENESS_PAGE)
    }
}
