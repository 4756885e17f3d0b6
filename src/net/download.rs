//! Archive transfer to a per-run temporary directory.
//!
//! The transfer runs as its own tokio task. The caller gets a
//! [`DownloadHandle`] that can be polled ([`DownloadHandle::is_finished`],
//! [`DownloadHandle::percent`]), canceled, or awaited with
//! [`DownloadHandle::wait`], which forwards progress events in order and
//! resolves to a [`DownloadStatus`] once the task has succeeded, faulted or
//! been canceled.
//!
//! Progress is reported as whole percentages. Each percentage is emitted at
//! most once and never goes backwards.

use anyhow::{Context, Result, bail};
use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::{CONNECT_TIMEOUT, TEMP_DIR_PREFIX};

const USER_AGENT: &str = concat!("libhelper/", env!("CARGO_PKG_VERSION"));

/// One progress step of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub percent: u8,
    pub received: u64,
    pub total: Option<u64>,
}

/// How a transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Succeeded,
    /// Network or IO failure, with the underlying cause.
    Faulted(String),
    Canceled,
}

impl DownloadStatus {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Turns byte counts into de-duplicated, monotonic percentage events.
#[derive(Debug)]
pub struct ProgressTracker {
    total: Option<u64>,
    received: u64,
    last_percent: u8,
}

impl ProgressTracker {
    /// A zero length counts as unknown.
    #[must_use]
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|t| *t > 0),
            received: 0,
            last_percent: 0,
        }
    }

    /// Record `bytes` more; returns an event only when the percentage rose.
    pub fn advance(&mut self, bytes: u64) -> Option<DownloadProgress> {
        self.received = self.received.saturating_add(bytes);
        let total = self.total?;
        let percent = (self.received.saturating_mul(100) / total).min(100) as u8;
        self.emit_if_higher(percent)
    }

    /// Close out the transfer at 100% unless that was already reported.
    pub fn finish(&mut self) -> Option<DownloadProgress> {
        if self.total.is_none() {
            self.total = Some(self.received);
        }
        self.emit_if_higher(100)
    }

    #[must_use]
    pub const fn received(&self) -> u64 {
        self.received
    }

    fn emit_if_higher(&mut self, percent: u8) -> Option<DownloadProgress> {
        if percent <= self.last_percent {
            return None;
        }
        self.last_percent = percent;
        Some(DownloadProgress {
            percent,
            received: self.received,
            total: self.total,
        })
    }
}

/// Temporary directory and archive path of one run.
///
/// The directory is not removed on drop: a verified archive is consumed by
/// extraction, and only the failure paths clean up explicitly.
#[derive(Debug, Clone)]
pub struct DownloadAttempt {
    temp_dir: PathBuf,
    file_path: PathBuf,
}

impl DownloadAttempt {
    /// Create a fresh, uniquely named directory under `root`.
    pub async fn create_in(root: &Path, file_name: &str) -> Result<Self> {
        let temp_dir = root.join(format!("{TEMP_DIR_PREFIX}{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&temp_dir).await.with_context(|| {
            format!("Failed to create temporary directory: {}", temp_dir.display())
        })?;
        debug!("Created temporary directory {}", temp_dir.display());

        let file_path = temp_dir.join(file_name);
        Ok(Self {
            temp_dir,
            file_path,
        })
    }

    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Best-effort removal of the whole temporary directory.
    pub async fn discard(&self) -> bool {
        match fs::remove_dir_all(&self.temp_dir).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!("Unable to remove temporary directory {}: {}", self.temp_dir.display(), e);
                false
            }
        }
    }
}

/// In-flight transfer.
pub struct DownloadHandle {
    url: String,
    task: JoinHandle<Result<u64>>,
    progress: UnboundedReceiver<DownloadProgress>,
    percent: Arc<AtomicU8>,
}

impl DownloadHandle {
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Highest percentage reported so far.
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::SeqCst)
    }

    /// Whether the transfer task has stopped, for whatever reason.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Abort the transfer. [`wait`](Self::wait) then reports `Canceled`.
    pub fn cancel(&self) {
        debug!("Canceling download of {}", self.url);
        self.task.abort();
    }

    /// Forward progress to `on_progress` until the transfer ends.
    pub async fn wait<F>(mut self, mut on_progress: F) -> DownloadStatus
    where
        F: FnMut(DownloadProgress),
    {
        let result = loop {
            tokio::select! {
                biased;
                Some(event) = self.progress.recv() => on_progress(event),
                result = &mut self.task => break result,
            }
        };

        while let Ok(event) = self.progress.try_recv() {
            on_progress(event);
        }

        match result {
            Ok(Ok(bytes)) => {
                info!("Downloaded {} bytes from {}", bytes, self.url);
                DownloadStatus::Succeeded
            }
            Ok(Err(e)) => {
                warn!("Download of {} faulted: {:#}", self.url, e);
                DownloadStatus::Faulted(format!("{e:#}"))
            }
            Err(e) if e.is_cancelled() => {
                warn!("Download of {} was canceled", self.url);
                DownloadStatus::Canceled
            }
            Err(e) => {
                warn!("Download task for {} panicked: {}", self.url, e);
                DownloadStatus::Faulted(e.to_string())
            }
        }
    }
}

/// Fetches remote files over HTTP(S).
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// `timeout` bounds the whole transfer.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
        })
    }

    /// Start fetching `url` into `destination` on a background task.
    pub fn start(&self, url: impl Into<String>, destination: impl Into<PathBuf>) -> DownloadHandle {
        let url = url.into();
        let destination = destination.into();
        let (tx, rx) = unbounded_channel();
        let percent = Arc::new(AtomicU8::new(0));

        info!("Starting download of {} to {}", url, destination.display());
        let task = tokio::spawn(transfer(
            self.client.clone(),
            url.clone(),
            destination,
            tx,
            Arc::clone(&percent),
        ));

        DownloadHandle {
            url,
            task,
            progress: rx,
            percent,
        }
    }

    /// Fetch `<base_url><file_name>` to `<destination_dir>/<file_name>` and wait.
    pub async fn download<F>(
        &self,
        base_url: &str,
        file_name: &str,
        destination_dir: &Path,
        on_progress: F,
    ) -> DownloadStatus
    where
        F: FnMut(DownloadProgress),
    {
        let url = format!("{base_url}{file_name}");
        self.start(url, destination_dir.join(file_name)).wait(on_progress).await
    }
}

async fn transfer(
    client: Client,
    url: String,
    destination: PathBuf,
    progress: UnboundedSender<DownloadProgress>,
    percent: Arc<AtomicU8>,
) -> Result<u64> {
    let response =
        client.get(&url).send().await.with_context(|| format!("HTTP request failed for {url}"))?;

    let status = response.status();
    debug!("Received HTTP status {} for {}", status, url);
    if !status.is_success() {
        bail!("HTTP error {status} for URL {url}");
    }

    let mut tracker = ProgressTracker::new(response.content_length());
    let file = File::create(&destination)
        .await
        .with_context(|| format!("Failed to create {}", destination.display()))?;
    let mut writer = BufWriter::new(file);

    let report = |event: DownloadProgress| {
        percent.store(event.percent, Ordering::SeqCst);
        // the receiver is gone only if the handle was dropped
        let _ = progress.send(event);
    };

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("Failed to read response body from {url}"))?;
        writer
            .write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write to {}", destination.display()))?;
        if let Some(event) = tracker.advance(chunk.len() as u64) {
            report(event);
        }
    }

    writer.flush().await.with_context(|| format!("Failed to flush {}", destination.display()))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .with_context(|| format!("Failed to sync {}", destination.display()))?;

    if let Some(event) = tracker.finish() {
        report(event);
    }
    Ok(tracker.received())
}
