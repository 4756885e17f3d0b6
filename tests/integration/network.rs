//! Connectivity and transfer failures

use anyhow::Result;
use libhelper::core::LibhelperError;
use libhelper::installer::InstallState;
use libhelper::test_utils::{ScriptedPrompter, TestServer, unused_local_url};

use crate::common::{ARCHIVE_NAME, CdnFixture, LIVENESS_PATH, PROBE_PATH, TestInstall};

#[tokio::test]
async fn test_no_internet() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::complete()?;

    let mut config = cdn.config();
    config.probe.default_url = unused_local_url().await;
    config.probe.timeout_ms = 500;
    let mut run = install.orchestrator(config, ScriptedPrompter::new());
    let err = run.run().await.unwrap_err();

    let error = err.downcast_ref::<LibhelperError>().unwrap();
    assert!(matches!(error, LibhelperError::NoInternet));
    assert_eq!(error.exit_code(), 3);
    assert!(cdn.server.hits().is_empty());
    assert_eq!(install.download_dirs()?, 0);
    Ok(())
}

#[tokio::test]
async fn test_cdn_down_is_distinct_from_no_internet() -> Result<()> {
    let internet = TestServer::builder().route(PROBE_PATH, Vec::new()).start().await;
    let cdn = TestServer::builder().status(LIVENESS_PATH, 500).start().await;
    let install = TestInstall::complete()?;

    let fixture = CdnFixture::start().await?;
    let mut config = fixture.config();
    config.probe.default_url = internet.url(PROBE_PATH);
    config.remote.base_url = cdn.base_url();
    let mut run = install.orchestrator(config, ScriptedPrompter::new());
    let err = run.run().await.unwrap_err();

    let error = err.downcast_ref::<LibhelperError>().unwrap();
    assert!(matches!(error, LibhelperError::EndpointUnreachable { .. }));
    assert_eq!(error.exit_code(), 4);
    assert_eq!(cdn.hit_count(ARCHIVE_NAME), 0);
    Ok(())
}

/// A connection dropped mid-transfer is a transfer failure, not a checksum one
#[tokio::test]
async fn test_truncated_transfer() -> Result<()> {
    let server = TestServer::builder()
        .route(PROBE_PATH, Vec::new())
        .route(LIVENESS_PATH, b"ok".to_vec())
        .truncated(ARCHIVE_NAME, vec![0u8; 128], 1 << 20)
        .start()
        .await;
    let install = TestInstall::complete()?;

    let fixture = CdnFixture::start().await?;
    let mut config = fixture.config();
    config.probe.default_url = server.url(PROBE_PATH);
    config.remote.base_url = server.base_url();
    let mut run = install.orchestrator(config, ScriptedPrompter::new());
    let err = run.run().await.unwrap_err();

    let error = err.downcast_ref::<LibhelperError>().unwrap();
    assert!(matches!(error, LibhelperError::DownloadFailed { .. }));
    assert_eq!(error.exit_code(), 5);
    assert!(!run.history().contains(&InstallState::Verifying));
    assert!(install.root.join("libraries/old/legacy.jar").exists());
    Ok(())
}
