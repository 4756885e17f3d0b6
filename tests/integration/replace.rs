//! Confirmation and cleanup around the destructive step

use anyhow::Result;
use libhelper::core::LibhelperError;
use libhelper::prompt::Decision;
use libhelper::test_utils::ScriptedPrompter;

use crate::common::{CdnFixture, FileAssert, TestInstall};

/// Declining keeps the old folder and removes the downloaded archive
#[tokio::test]
async fn test_declined_replacement_keeps_existing() -> Result<()> {
    for decision in [Decision::No, Decision::Cancel] {
        let cdn = CdnFixture::start().await?;
        let install = TestInstall::complete()?;
        let legacy = install.root.join("libraries/old/legacy.jar");

        let prompter = ScriptedPrompter::new().with_confirmations([decision]);
        let mut run = install.orchestrator(cdn.config(), prompter);
        let err = run.run().await.unwrap_err();

        let error = err.downcast_ref::<LibhelperError>().unwrap();
        assert!(matches!(error, LibhelperError::ReplaceDeclined { .. }));
        assert_eq!(error.exit_code(), 7);
        assert!(error.is_user_initiated());

        FileAssert::content(&legacy, b"legacy");
        FileAssert::not_exists(install.libraries().join("README.txt"));
        assert_eq!(install.download_dirs()?, 1);
        assert!(install.leftover_downloads()?.is_empty(), "archive was not cleaned up");
    }
    Ok(())
}

/// The confirmation names the folder that would be deleted
#[tokio::test]
async fn test_confirmation_mentions_target() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::complete()?;

    let prompter = ScriptedPrompter::new().with_confirmations([Decision::No]);
    let mut run = install.orchestrator(cdn.config(), prompter);
    let _ = run.run().await;

    let asked = run.prompter().confirmations();
    assert_eq!(asked.len(), 1);
    assert!(asked[0].contains(&install.libraries().display().to_string()));
    Ok(())
}
