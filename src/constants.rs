//! Global constants used throughout the libhelper codebase.
//!
//! This module contains the built-in defaults for the remote artifact, the
//! directory heuristics, timeouts and retry budgets. Every value here can be
//! overridden through [`crate::config::InstallerConfig`]; these are only the
//! values used when no configuration file or CLI flag says otherwise.

use std::time::Duration;

/// Base URL of the CDN hosting the archive and the liveness page.
pub const DEFAULT_BASE_URL: &str = "https://cdn.lutonmediagroup.com/";

/// File name of the archive below [`DEFAULT_BASE_URL`].
pub const DEFAULT_FILE_NAME: &str = "libraries.zip";

/// Expected SHA-1 digest of [`DEFAULT_FILE_NAME`].
pub const DEFAULT_DIGEST: &str = "4CCC254CA84988184064DDE4EC150F2601D4C98C";

/// Page fetched below the base URL to check that the CDN is serving.
pub const LIVENESS_PAGE: &str = "news.html";

/// Name of the subdirectory that gets replaced by the archive contents.
pub const LIBRARIES_DIR: &str = "libraries";

/// Scores at or below this value are not trusted as an installation root.
pub const CONFIDENCE_CUTOFF: u32 = 8;

/// Number of directory selections offered before giving up.
pub const MAX_SELECTION_ATTEMPTS: u32 = 3;

/// Number of times deletion of the existing subdirectory is attempted.
pub const MAX_DELETE_ATTEMPTS: u32 = 10;

/// Timeout for connectivity probes in milliseconds.
pub const PROBE_TIMEOUT_MS: u64 = 1000;

/// Probe URL used when no locale-specific URL matches.
pub const DEFAULT_PROBE_URL: &str = "http://www.gstatic.com/generate_204";

/// Locale prefix to probe URL mapping for regions where the default is blocked.
pub const LOCALE_PROBE_URLS: &[(&str, &str)] =
    &[("fa", "http://www.aparat.com"), ("zh", "http://www.baidu.com")];

/// Total timeout for the archive transfer (10 minutes).
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Connect timeout for the archive transfer.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum backoff delay for exponential backoff (500ms).
///
/// Exponential backoff delays are capped at this value to prevent
/// excessive wait times between deletion attempts.
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Starting delay for exponential backoff (10ms).
///
/// This is the initial delay used in exponential backoff calculations,
/// which doubles on each retry attempt.
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Prefix of the per-run temporary download directory.
pub const TEMP_DIR_PREFIX: &str = "libhelper-";

/// Environment variable that hides progress bars when set.
pub const NO_PROGRESS_ENV: &str = "LIBHELPER_NO_PROGRESS";
