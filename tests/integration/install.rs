//! Successful installs

use anyhow::Result;
use libhelper::installer::InstallState;
use libhelper::prompt::Decision;
use libhelper::test_utils::ScriptedPrompter;

use crate::common::{ARCHIVE_NAME, CdnFixture, FileAssert, LIVENESS_PATH, PROBE_PATH, TestInstall};

#[tokio::test]
async fn test_replaces_existing_libraries() -> Result<()> {
    libhelper::test_utils::init_test_logging(None);
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::complete()?;
    let legacy = install.root.join("libraries/old/legacy.jar");

    let prompter = ScriptedPrompter::new().with_confirmations([Decision::Yes]);
    let mut run = install.orchestrator(cdn.config(), prompter);
    let outcome = run.run().await?;

    FileAssert::not_exists(&legacy);
    FileAssert::content(install.libraries().join("org/lwjgl/lwjgl-2.9.4.jar"), b"lwjgl");
    FileAssert::content(install.libraries().join("README.txt"), b"managed by libhelper");

    assert!(outcome.replace.replaced_existing);
    assert_eq!(outcome.replace.delete_attempts, 1);
    assert_eq!(outcome.replace.summary.files, 3);
    assert_eq!(outcome.digest, cdn.digest);
    assert_eq!(outcome.libraries_path, install.libraries());

    assert_eq!(run.prompter().confirmations().len(), 1);
    assert!(run.prompter().confirmations()[0].contains("libraries"));
    assert_eq!(
        run.history(),
        &[
            InstallState::Init,
            InstallState::LocatingTarget,
            InstallState::CheckingConnectivity,
            InstallState::Downloading,
            InstallState::Verifying,
            InstallState::ConfirmingReplace,
            InstallState::Replacing,
            InstallState::Done,
        ]
    );

    // probe, liveness page, archive; in that order
    assert_eq!(
        cdn.server.hits(),
        vec![format!("/{PROBE_PATH}"), format!("/{LIVENESS_PATH}"), format!("/{ARCHIVE_NAME}")]
    );
    // archive consumed by extraction
    assert!(install.leftover_downloads()?.is_empty());
    Ok(())
}

/// Without an existing libraries folder nothing is asked
#[tokio::test]
async fn test_fresh_install_skips_confirmation() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::new()?;
    install.add_markers(&[
        libhelper::target::ConfidenceSignal::Instances,
        libhelper::target::ConfidenceSignal::Assets,
        libhelper::target::ConfidenceSignal::Versions,
    ])?;

    let mut run = install.orchestrator(cdn.config(), ScriptedPrompter::new());
    let outcome = run.run().await?;

    assert!(!outcome.replace.replaced_existing);
    assert_eq!(outcome.replace.delete_attempts, 0);
    assert!(run.prompter().confirmations().is_empty());
    assert!(!run.history().contains(&InstallState::ConfirmingReplace));
    FileAssert::exists(install.libraries().join("net/minecraft/launchwrapper-1.12.jar"));
    Ok(())
}

/// Expected digests compare case-insensitively
#[tokio::test]
async fn test_lowercase_expected_digest() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::complete()?;

    let mut config = cdn.config();
    config.remote.digest = cdn.digest.to_lowercase();
    let prompter = ScriptedPrompter::new().with_confirmations([Decision::Yes]);
    let outcome = install.orchestrator(config, prompter).run().await?;

    assert_eq!(outcome.digest, cdn.digest);
    Ok(())
}

/// Each run downloads into its own directory
#[tokio::test]
async fn test_runs_use_distinct_download_dirs() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::complete()?;

    for _ in 0..2 {
        let prompter = ScriptedPrompter::new().with_confirmations([Decision::Yes]);
        install.orchestrator(cdn.config(), prompter).run().await?;
    }

    assert_eq!(install.download_dirs()?, 2);
    assert_eq!(cdn.server.hit_count(ARCHIVE_NAME), 2);
    Ok(())
}
