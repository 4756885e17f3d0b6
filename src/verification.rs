//! Integrity verification of downloaded archives.
//!
//! Files are hashed by streaming them through the digest in fixed-size
//! buffered reads, so archives of any size are verified without loading
//! them into memory. Digests are rendered as uppercase hexadecimal without
//! separators and compared case-insensitively.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{debug, info};

use crate::core::LibhelperError;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithms accepted for the expected archive checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// 160-bit SHA-1, the format published next to the archive.
    #[default]
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    /// Digest length in bytes.
    #[must_use]
    pub const fn digest_length(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    /// Length of the hex rendering.
    #[must_use]
    pub const fn hex_length(self) -> usize {
        self.digest_length() * 2
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Check that `digest` is a well-formed hex digest for this algorithm.
    pub fn validate_hex(self, digest: &str) -> Result<()> {
        if digest.len() != self.hex_length() {
            bail!(
                "Invalid {} digest length: expected {} hex characters, got {}",
                self.as_str(),
                self.hex_length(),
                digest.len()
            );
        }
        if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Invalid {} digest '{digest}': not a hexadecimal string", self.as_str());
        }
        Ok(())
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => bail!("Unsupported digest algorithm: {other}"),
        }
    }
}

/// Computes and checks archive digests.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Stream `file_path` through `algorithm` and return the uppercase hex digest.
    pub async fn compute(file_path: &Path, algorithm: DigestAlgorithm) -> Result<String> {
        debug!("Computing {} checksum for: {:?}", algorithm, file_path);

        let file = File::open(file_path)
            .await
            .with_context(|| format!("Failed to open file: {file_path:?}"))?;
        let mut reader = BufReader::new(file);

        match algorithm {
            DigestAlgorithm::Sha1 => hash_reader::<Sha1, _>(&mut reader, file_path).await,
            DigestAlgorithm::Sha256 => hash_reader::<Sha256, _>(&mut reader, file_path).await,
        }
    }

    /// SHA-1 of `file_path` as 40 uppercase hex characters.
    pub async fn compute_sha1(file_path: &Path) -> Result<String> {
        Self::compute(file_path, DigestAlgorithm::Sha1).await
    }

    /// Compare two hex digests ignoring case.
    #[must_use]
    pub fn digests_match(expected: &str, actual: &str) -> bool {
        expected.trim().eq_ignore_ascii_case(actual.trim())
    }

    /// Hash `file_path` and fail with [`LibhelperError::ChecksumMismatch`]
    /// unless it matches `expected_checksum`.
    ///
    /// Returns the computed digest on success.
    pub async fn verify_checksum(
        file_path: &Path,
        expected_checksum: &str,
        algorithm: DigestAlgorithm,
    ) -> Result<String> {
        info!("Verifying checksum for: {:?}", file_path);

        let actual_checksum = Self::compute(file_path, algorithm).await?;

        if !Self::digests_match(expected_checksum, &actual_checksum) {
            return Err(LibhelperError::ChecksumMismatch {
                expected: expected_checksum.to_string(),
                actual: actual_checksum,
            }
            .into());
        }

        info!("Checksum verification successful");
        Ok(actual_checksum)
    }
}

async fn hash_reader<D, R>(reader: &mut R, file_path: &Path) -> Result<String>
where
    D: Digest,
    R: AsyncReadExt + Unpin,
{
    let mut hasher = D::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let read = reader
            .read(&mut buffer)
            .await
            .with_context(|| format!("Failed to read file: {file_path:?}"))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        total += read as u64;
    }

    debug!("Hashed {} bytes of {:?}", total, file_path);
    Ok(hex::encode_upper(hasher.finalize()))
}
