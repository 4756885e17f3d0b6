//! The `libhelper` binary: flags, output and exit codes

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;

use libhelper::target::ConfidenceSignal;

use crate::common::{CdnFixture, FileAssert, TestInstall};

#[test]
fn test_help_lists_flags() {
    Command::cargo_bin("libhelper")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--digest"))
        .stdout(predicate::str::contains("--no-pause"))
        .stdout(predicate::str::contains("--target"));
}

#[test]
fn test_version() {
    Command::cargo_bin("libhelper")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_digest_is_config_error() -> Result<()> {
    let install = TestInstall::complete()?;
    let config = install.scratch.join("empty.toml");
    std::fs::write(&config, "")?;

    let output = install.run_libhelper(&[
        "--config",
        config.to_str().unwrap(),
        "--digest",
        "XYZ",
        "--no-pause",
    ])?;

    output.assert_code(1).assert_stderr_contains("Configuration error");
    Ok(())
}

// The binary blocks this thread; the fixture server needs worker threads.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unattended_install() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::complete()?;
    let config = cdn.write_config_file(&install.scratch)?;

    let output =
        install.run_libhelper(&["--config", config.to_str().unwrap(), "--yes", "--no-pause"])?;

    output
        .assert_success()
        .assert_stdout_contains("Checking internet connection...")
        .assert_stdout_contains("Extraction complete!");
    FileAssert::not_exists(install.root.join("libraries/old/legacy.jar"));
    FileAssert::content(install.libraries().join("README.txt"), b"managed by libhelper");
    Ok(())
}

/// stdin is closed, so the replacement question is answered with cancel
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_closed_stdin_cancels_replacement() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::complete()?;
    let config = cdn.write_config_file(&install.scratch)?;

    // no --no-pause: the exit gate is skipped without a terminal
    let output = install.run_libhelper(&["--config", config.to_str().unwrap()])?;

    output.assert_code(7).assert_stderr_contains("Replacement operation canceled");
    FileAssert::content(install.root.join("libraries/old/legacy.jar"), b"legacy");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_checksum_mismatch_exit_code() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::complete()?;
    let config = cdn.write_config_file(&install.scratch)?;
    let wrong = "0".repeat(40);

    let output = install.run_libhelper(&[
        "--config",
        config.to_str().unwrap(),
        "--digest",
        &wrong,
        "--yes",
        "--no-pause",
    ])?;

    output
        .assert_code(6)
        .assert_stderr_contains(&format!("Expected: '{wrong}'"))
        .assert_stderr_contains(&format!("Got: '{}'", cdn.digest));
    FileAssert::content(install.root.join("libraries/old/legacy.jar"), b"legacy");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unrecognised_directory_exit_code() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::new()?;
    let config = cdn.write_config_file(&install.scratch)?;

    let output = install.run_libhelper(&["--config", config.to_str().unwrap(), "--no-pause"])?;

    output.assert_code(2).assert_stderr_contains("Please move this program");
    assert!(cdn.server.hits().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_target_flag_overrides_working_directory() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::new()?;
    let elsewhere = TestInstall::complete()?;
    let config = cdn.write_config_file(&install.scratch)?;

    let output = install.run_libhelper(&[
        "--config",
        config.to_str().unwrap(),
        "--target",
        elsewhere.root.to_str().unwrap(),
        "--yes",
        "--no-pause",
        "--quiet",
    ])?;

    output.assert_success();
    assert!(output.stdout.is_empty(), "quiet run printed: {}", output.stdout);
    FileAssert::exists(elsewhere.libraries().join("README.txt"));
    FileAssert::not_exists(install.libraries());
    Ok(())
}

/// Answers piped in together are read one per question
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_piped_answers_select_target() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::new()?;
    let good = install.sibling("NewBeginnings")?;
    libhelper::test_utils::create_markers(
        &good,
        &[ConfidenceSignal::Libraries, ConfidenceSignal::Instances],
    )?;
    let config = cdn.write_config_file(&install.scratch)?;

    // start question, folder, replacement question
    let input = format!("y\n{}\ny\n", good.display());
    let output = install
        .run_libhelper_with_input(&["--config", config.to_str().unwrap(), "--no-pause"], &input)?;

    output.assert_success().assert_stdout_contains("Extraction complete!");
    FileAssert::content(good.join("libraries/README.txt"), b"managed by libhelper");
    FileAssert::not_exists(install.libraries());
    Ok(())
}

/// A weak folder first, then a good one: both lines are consumed
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_piped_second_selection_accepted() -> Result<()> {
    let cdn = CdnFixture::start().await?;
    let install = TestInstall::new()?;
    let weak = install.sibling("Downloads")?;
    let good = install.sibling("NewBeginnings")?;
    libhelper::test_utils::create_markers(
        &good,
        &[ConfidenceSignal::Instances, ConfidenceSignal::Assets, ConfidenceSignal::Versions],
    )?;
    let config = cdn.write_config_file(&install.scratch)?;

    // --yes answers the start question, so only folders are piped
    let input = format!("{}\n{}\n", weak.display(), good.display());
    let output = install.run_libhelper_with_input(
        &["--config", config.to_str().unwrap(), "--yes", "--no-pause"],
        &input,
    )?;

    output
        .assert_success()
        .assert_stdout_contains("(3 tries left.)")
        .assert_stdout_contains("(2 tries left.)");
    assert!(!output.stdout.contains("(1 try left.)"), "third prompt shown: {}", output.stdout);
    FileAssert::exists(good.join("libraries/README.txt"));
    Ok(())
}

/// Each selection prompt is printed once
#[test]
fn test_selection_prompt_printed_once() -> Result<()> {
    let install = TestInstall::new()?;
    let config = install.scratch.join("empty.toml");
    std::fs::write(&config, "")?;

    let output =
        install.run_libhelper_with_input(&["--config", config.to_str().unwrap(), "--no-pause"], "y\n")?;

    output.assert_code(2);
    for prompt in ["(3 tries left.)", "(2 tries left.)", "(1 try left.)"] {
        assert_eq!(output.stdout.matches(prompt).count(), 1, "stdout: {}", output.stdout);
    }
    Ok(())
}
