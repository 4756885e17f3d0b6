//! Installation directory detection.
//!
//! A modpack installation root is recognised by the child directories it
//! carries. Each known child is a [`ConfidenceSignal`] with a fixed weight;
//! the weights of all signals present add up to the confidence score of an
//! [`InstallationTarget`]. Scores at or below [`CONFIDENCE_CUTOFF`] mean the
//! directory is probably not the installation root.
//!
//! | Marker       | Weight |
//! |--------------|--------|
//! | `libraries/` | 5      |
//! | `instances/` | 5      |
//! | `assets/`    | 3      |
//! | `versions/`  | 3      |

use crate::constants::CONFIDENCE_CUTOFF;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A named child directory that hints at an installation root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfidenceSignal {
    Libraries,
    Instances,
    Assets,
    Versions,
}

impl ConfidenceSignal {
    /// All signals in scan order.
    pub const ALL: [Self; 4] = [Self::Libraries, Self::Instances, Self::Assets, Self::Versions];

    /// Highest score a directory can reach.
    pub const MAX_SCORE: u32 = 16;

    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Libraries => "libraries",
            Self::Instances => "instances",
            Self::Assets => "assets",
            Self::Versions => "versions",
        }
    }

    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Libraries | Self::Instances => 5,
            Self::Assets | Self::Versions => 3,
        }
    }

    /// Whether this marker is present below `root`.
    #[must_use]
    pub fn is_present(self, root: &Path) -> bool {
        root.join(self.dir_name()).is_dir()
    }
}

impl fmt::Display for ConfidenceSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Result of scanning one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub score: u32,
    pub signals: Vec<ConfidenceSignal>,
}

/// Read-only scan of `root` for every marker.
///
/// All markers are checked; the score is the sum of the weights found.
#[must_use]
pub fn scan(root: &Path) -> ScanReport {
    let signals: Vec<ConfidenceSignal> =
        ConfidenceSignal::ALL.into_iter().filter(|signal| signal.is_present(root)).collect();
    let score = signals.iter().map(|signal| signal.weight()).sum();
    debug!("Scanned {} -> score {} ({:?})", root.display(), score, signals);
    ScanReport {
        score,
        signals,
    }
}

/// Confidence score of `root`.
#[must_use]
pub fn score_directory(root: &Path) -> u32 {
    scan(root).score
}

/// Whether a score is high enough to trust a directory without asking.
#[must_use]
pub const fn is_confident(score: u32, cutoff: u32) -> bool {
    score > cutoff
}

/// A candidate installation root and its last computed score.
#[derive(Debug, Clone)]
pub struct InstallationTarget {
    path: PathBuf,
    report: ScanReport,
}

impl InstallationTarget {
    /// Scan `path` and wrap it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let report = scan(&path);
        Self {
            path,
            report,
        }
    }

    /// Recompute the score from scratch.
    pub fn rescan(&mut self) -> u32 {
        self.report = scan(&self.path);
        self.report.score
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.report.score
    }

    #[must_use]
    pub fn signals(&self) -> &[ConfidenceSignal] {
        &self.report.signals
    }

    #[must_use]
    pub const fn is_confident(&self) -> bool {
        is_confident(self.report.score, CONFIDENCE_CUTOFF)
    }

    /// Same as [`is_confident`](Self::is_confident) with a custom cutoff.
    #[must_use]
    pub const fn meets(&self, cutoff: u32) -> bool {
        is_confident(self.report.score, cutoff)
    }
}
