//! Network side of the install pipeline.
//!
//! - [`probe`] answers whether the internet and the CDN are reachable
//! - [`download`] fetches the archive on a background task with progress

pub mod download;
pub mod probe;

pub use download::{
    DownloadAttempt, DownloadHandle, DownloadProgress, DownloadStatus, Downloader, ProgressTracker,
};
pub use probe::{ConnectivityProbe, is_reachable};
