//! Checksum verification of the downloaded archive

use anyhow::Result;
use libhelper::core::{LibhelperError, user_friendly_error};
use libhelper::installer::InstallState;
use libhelper::test_utils::ScriptedPrompter;

use crate::common::{CdnFixture, FileAssert, TestInstall};

const WRONG_DIGEST: &str = "4CCC254CA84988184064DDE4EC150F2601D4C98C";

/// Mismatch names both digests, never extracts and discards the download
#[tokio::test]
async fn test_mismatch_stops_before_extraction() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::complete()?;
    let legacy = install.root.join("libraries/old/legacy.jar");

    let mut config = cdn.config();
    config.remote.digest = WRONG_DIGEST.to_string();
    let mut run = install.orchestrator(config, ScriptedPrompter::new());
    let err = run.run().await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains(WRONG_DIGEST), "missing expected digest: {message}");
    assert!(message.contains(&cdn.digest), "missing computed digest: {message}");

    match err.downcast_ref::<LibhelperError>() {
        Some(LibhelperError::ChecksumMismatch {
            expected,
            actual,
        }) => {
            assert_eq!(expected, WRONG_DIGEST);
            assert_eq!(actual, &cdn.digest);
        }
        other => panic!("Expected ChecksumMismatch, got {other:?}"),
    }

    // nothing was asked or touched
    assert!(run.prompter().confirmations().is_empty());
    assert!(!run.history().contains(&InstallState::Replacing));
    FileAssert::content(&legacy, b"legacy");
    FileAssert::not_exists(install.libraries().join("README.txt"));

    // the temporary directory is gone
    assert_eq!(install.download_dirs()?, 0);
    Ok(())
}

/// A single flipped byte in the served archive is caught
#[tokio::test]
async fn test_corrupted_download_detected() -> Result<()> {
    let good = CdnFixture::start().await?;
    let mut corrupted = good.archive.clone();
    let middle = corrupted.len() / 2;
    corrupted[middle] ^= 0x01;
    let bad = CdnFixture::serving(corrupted).await?;

    let install = TestInstall::complete()?;
    let mut config = bad.config();
    config.remote.digest = good.digest.clone();
    let err = install.orchestrator(config, ScriptedPrompter::new()).run().await.unwrap_err();

    let context = user_friendly_error(err);
    assert_eq!(context.exit_code(), 6);
    assert!(context.suggestion.is_some());
    Ok(())
}
