//! Error handling for libhelper
//!
//! Every terminal condition of an install run is a variant of
//! [`LibhelperError`]. The variants follow the failure classes of the
//! pipeline:
//!
//! - **Environment**: [`LibhelperError::TargetNotConfirmed`],
//!   [`LibhelperError::TargetAttemptsExhausted`]
//! - **Connectivity**: [`LibhelperError::NoInternet`],
//!   [`LibhelperError::EndpointUnreachable`]
//! - **Transfer**: [`LibhelperError::DownloadFailed`],
//!   [`LibhelperError::DownloadCanceled`]
//! - **Integrity**: [`LibhelperError::ChecksumMismatch`]
//! - **Destructive operation**: [`LibhelperError::ReplaceDeclined`],
//!   [`LibhelperError::DeletionFailed`]
//! - **Extraction**: [`LibhelperError::ExtractionFailed`]
//!
//! Each class exits the process with its own code (see
//! [`LibhelperError::exit_code`]). [`user_friendly_error`] turns any
//! `anyhow::Error` into an [`ErrorContext`] carrying a suggestion for the user.
//!
//! # Examples
//!
//! ```rust,no_run
//! use libhelper::core::{LibhelperError, ErrorContext};
//!
//! let context = ErrorContext::new(LibhelperError::NoInternet)
//!     .with_suggestion("Check your network connection and try again");
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds of an install run.
#[derive(Error, Debug)]
pub enum LibhelperError {
    /// The user declined to pick a directory when the default scored too low.
    #[error(
        "Please move this program to the same directory as your Minecraft folder and try again."
    )]
    TargetNotConfirmed,

    /// Every directory selection scored at or below the cutoff.
    #[error("Too many attempts to find the target directory. Please exit and try again.")]
    TargetAttemptsExhausted {
        attempts: u32,
    },

    #[error("Failed to detect internet connection! Terminating...")]
    NoInternet,

    #[error("Failed to connect to CDN endpoint! Terminating...")]
    EndpointUnreachable {
        url: String,
    },

    /// The transfer faulted. `reason` carries the transport error for logs.
    #[error("Failed to download '{url}'! Terminating...")]
    DownloadFailed {
        url: String,
        reason: String,
    },

    #[error("Download of '{url}' was canceled! Terminating...")]
    DownloadCanceled {
        url: String,
    },

    #[error(
        "Downloaded archive failed checksum verification.\nExpected: '{expected}'\nGot: '{actual}'\nThis program will now terminate."
    )]
    ChecksumMismatch {
        expected: String,
        actual: String,
    },

    #[error("Replacement operation canceled! Terminating...")]
    ReplaceDeclined {
        path: PathBuf,
    },

    #[error(
        "Failed to delete existing '{}' directory after {attempts} attempts.\nTry deleting the folder manually and start this program again.",
        path.display()
    )]
    DeletionFailed {
        path: PathBuf,
        attempts: u32,
    },

    #[error("Archive extraction failed! Terminating...")]
    ExtractionFailed {
        archive: PathBuf,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{message}")]
    Other {
        message: String,
    },
}

impl LibhelperError {
    /// Process exit code for this failure kind.
    ///
    /// `0` is reserved for success and `1` for anything unclassified.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::TargetNotConfirmed
            | Self::TargetAttemptsExhausted {
                ..
            } => 2,
            Self::NoInternet => 3,
            Self::EndpointUnreachable {
                ..
            } => 4,
            Self::DownloadFailed {
                ..
            }
            | Self::DownloadCanceled {
                ..
            } => 5,
            Self::ChecksumMismatch {
                ..
            } => 6,
            Self::ReplaceDeclined {
                ..
            } => 7,
            Self::DeletionFailed {
                ..
            } => 8,
            Self::ExtractionFailed {
                ..
            } => 9,
            Self::ConfigError {
                ..
            }
            | Self::IoError(_)
            | Self::Other {
                ..
            } => 1,
        }
    }

    /// Whether the run ended because the user said no, rather than a fault.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::TargetNotConfirmed
                | Self::ReplaceDeclined {
                    ..
                }
        )
    }
}

impl Clone for LibhelperError {
    fn clone(&self) -> Self {
        match self {
            Self::TargetNotConfirmed => Self::TargetNotConfirmed,
            Self::TargetAttemptsExhausted {
                attempts,
            } => Self::TargetAttemptsExhausted {
                attempts: *attempts,
            },
            Self::NoInternet => Self::NoInternet,
            Self::EndpointUnreachable {
                url,
            } => Self::EndpointUnreachable {
                url: url.clone(),
            },
            Self::DownloadFailed {
                url,
                reason,
            } => Self::DownloadFailed {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::DownloadCanceled {
                url,
            } => Self::DownloadCanceled {
                url: url.clone(),
            },
            Self::ChecksumMismatch {
                expected,
                actual,
            } => Self::ChecksumMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            },
            Self::ReplaceDeclined {
                path,
            } => Self::ReplaceDeclined {
                path: path.clone(),
            },
            Self::DeletionFailed {
                path,
                attempts,
            } => Self::DeletionFailed {
                path: path.clone(),
                attempts: *attempts,
            },
            Self::ExtractionFailed {
                archive,
                reason,
            } => Self::ExtractionFailed {
                archive: archive.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // io::Error is not Clone, keep its message
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// An error plus the hints shown to the user.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: LibhelperError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: LibhelperError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colored labels.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }

    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion.
///
/// Typed [`LibhelperError`]s anywhere in the chain keep their exit code;
/// everything else becomes [`LibhelperError::Other`] carrying the full chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(libhelper_error) =
        error.chain().find_map(|cause| cause.downcast_ref::<LibhelperError>())
    {
        return create_error_context(libhelper_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(LibhelperError::Other {
            message: error.to_string(),
        })
        .with_suggestion(
            "Close any program using the installation folder, or run with elevated permissions",
        );
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(LibhelperError::Other {
        message,
    })
}

fn create_error_context(error: LibhelperError) -> ErrorContext {
    match &error {
        LibhelperError::NoInternet => ErrorContext::new(error)
            .with_suggestion("Check your network connection, proxy and firewall settings"),

        LibhelperError::EndpointUnreachable { url } => {
            let details = format!("The liveness page {url} did not answer successfully");
            ErrorContext::new(error)
                .with_suggestion("The download server may be down. Try again later")
                .with_details(details)
        }

        LibhelperError::DownloadFailed { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check your network connection and try again")
                .with_details(details)
        }

        LibhelperError::ChecksumMismatch { .. } => ErrorContext::new(error)
            .with_suggestion("The download may be corrupted or the archive was updated. Try again or update this program"),

        LibhelperError::DeletionFailed { path, .. } => {
            let details = format!("Could not remove {}", path.display());
            ErrorContext::new(error)
                .with_suggestion("Close Minecraft and any launcher that may be holding files open")
                .with_details(details)
        }

        LibhelperError::ExtractionFailed { archive, reason } => {
            let details = format!("{}: {reason}", archive.display());
            ErrorContext::new(error)
                .with_suggestion("The libraries folder was removed. Run this program again to reinstall it")
                .with_details(details)
        }

        _ => ErrorContext::new(error),
    }
}
