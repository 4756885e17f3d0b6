//! Test fixtures for installation roots and archives
//!
//! This module builds on-disk installation layouts and in-memory zip
//! archives shaped like the ones the CDN serves.

use crate::target::ConfidenceSignal;
use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Create the marker directories for `signals` under `root`.
pub fn create_markers(root: &Path, signals: &[ConfidenceSignal]) -> Result<()> {
    for signal in signals {
        let dir = root.join(signal.dir_name());
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// One entry of a test archive.
#[derive(Clone, Debug)]
pub struct ArchiveEntry {
    pub name: String,
    /// `None` for directories
    pub contents: Option<Vec<u8>>,
}

impl ArchiveEntry {
    pub fn file(name: &str, contents: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            contents: Some(contents.to_vec()),
        }
    }

    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            contents: None,
        }
    }
}

/// Build a zip archive in memory.
pub fn zip_bytes(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in entries {
        match &entry.contents {
            Some(contents) => {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(contents)?;
            }
            None => writer.add_directory(entry.name.as_str(), options)?,
        }
    }

    Ok(writer.finish()?.into_inner())
}

/// Build a zip archive and write it to `path`.
pub fn write_zip(path: &Path, entries: &[ArchiveEntry]) -> Result<()> {
    let bytes = zip_bytes(entries)?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// A small `libraries/` archive like the one the CDN serves.
pub fn libraries_archive() -> Result<Vec<u8>> {
    zip_bytes(&[
        ArchiveEntry::dir("libraries/"),
        ArchiveEntry::file("libraries/net/minecraft/launchwrapper-1.12.jar", b"launchwrapper"),
        ArchiveEntry::file("libraries/org/lwjgl/lwjgl-2.9.4.jar", b"lwjgl"),
        ArchiveEntry::file("libraries/README.txt", b"managed by libhelper"),
    ])
}

/// Uppercase hex SHA-1 of `bytes`.
pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(bytes))
}
