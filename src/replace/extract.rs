//! Zip extraction into the installation root.
//!
//! Runs synchronously; callers move it onto a blocking thread. Entries whose
//! names would escape the destination are skipped.

use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// What an extraction wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
    pub skipped: usize,
}

/// Single top-level directory shared by every entry, if there is one.
pub fn archive_root(archive_path: &Path) -> Result<Option<PathBuf>> {
    let mut archive = open(archive_path)?;
    let mut roots = BTreeSet::new();

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i).with_context(|| {
            format!("Error reading ZIP index {} in {}", i, archive_path.display())
        })?;
        let path = PathBuf::from(entry.name());
        match path.components().next() {
            Some(Component::Normal(name)) => {
                roots.insert(PathBuf::from(name));
            }
            Some(other) => {
                debug!("Non-standard top-level component {:?} in {}", other, archive_path.display());
                return Ok(None);
            }
            None => {}
        }
        if roots.len() > 1 {
            return Ok(None);
        }
    }

    Ok(roots.into_iter().next())
}

/// Extract every entry of `archive_path` under `destination`.
pub fn extract_zip(archive_path: &Path, destination: &Path) -> Result<ExtractSummary> {
    let mut archive = open(archive_path)?;
    fs::create_dir_all(destination)
        .with_context(|| format!("Failed to create {}", destination.display()))?;

    debug!("Extracting {} entries from {}", archive.len(), archive_path.display());
    let mut summary = ExtractSummary::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).with_context(|| {
            format!("Error reading ZIP index {} in {}", i, archive_path.display())
        })?;

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe ZIP entry name {}", entry.name());
            summary.skipped += 1;
            continue;
        };
        let out_path = destination.join(&relative);
        if !out_path.starts_with(destination) {
            bail!("ZIP path traversal detected in {}", archive_path.display());
        }

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("Failed to create {}", out_path.display()))?;
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut out_file = File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out_file)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to set permissions on {}", out_path.display()))?;
        }
        summary.files += 1;
    }

    debug!(
        "Extracted {} files and {} directories into {}",
        summary.files,
        summary.directories,
        destination.display()
    );
    Ok(summary)
}

fn open(archive_path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
    ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Failed to open ZIP {}", archive_path.display()))
}
