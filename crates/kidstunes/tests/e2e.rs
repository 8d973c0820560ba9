// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the `kidstunes` binary and the assembled engine.
//!
//! The CLI tests run the compiled binary against temp config files. The
//! pipeline tests drive a TestHarness, which wires the same store, runner,
//! gate and dispatcher that `serve` does, with mock media tools.

use std::path::Path;
use std::process::{Command, Output};

use kidstunes_core::RequestStatus;
use kidstunes_core::types::SurfaceStage;
use kidstunes_engine::{RetryOutcome, SignalOutcome};
use kidstunes_test_utils::{FetchBehavior, MockSearch, TestHarness};

const COMPLETE_CONFIG: &str = r#"
[discord]
token = "test-token"
request_channel_id = 1001
approval_channel_id = 1002
moderator_role_id = 1003

[paths]
output_dir = "library"
database = "requests.db"

[ytdlp]
audio_format = "opus"
"#;

fn kidstunes(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kidstunes"))
        .args(args)
        .env_clear()
        .output()
        .expect("binary should run")
}

fn write_config(dir: &Path, content: &str) -> String {
    let path = dir.join("kidstunes.toml");
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

// ---- CLI: check-config ----

#[test]
fn check_config_accepts_complete_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), COMPLETE_CONFIG);

    let output = kidstunes(&["check-config", "--config", &path]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("config OK"));
    assert!(stdout.contains("output_dir=library"));
    assert!(stdout.contains("resolver=disabled"));
}

#[test]
fn check_config_reports_missing_discord_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[paths]\noutput_dir = \"library\"\n");

    let output = kidstunes(&["check-config", "--config", &path]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("discord.token"));
    assert!(stderr.contains("discord.moderator_role_id"));
}

#[test]
fn check_config_flags_typos() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        &COMPLETE_CONFIG.replace("token = ", "tokne = "),
    );

    let output = kidstunes(&["check-config", "--config", &path]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("tokne"));
}

#[test]
fn check_config_fails_for_missing_file() {
    let output = kidstunes(&["check-config", "--config", "/nonexistent/kidstunes.toml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn no_subcommand_prints_hint() {
    let output = kidstunes(&[]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--help"));
}

// ---- Pipeline: request to library ----

#[tokio::test]
async fn request_lands_in_library_and_surface_follows() {
    let h = TestHarness::builder()
        .with_search(MockSearch::hit("https://media.test/watch?v=1", "Chris Tomlin - Holy Forever"))
        .build()
        .await
        .unwrap();

    let request = h.request("holy forever").await.unwrap();
    assert_eq!(
        h.approve(request.id).await.unwrap(),
        SignalOutcome::Approved(request.id)
    );
    h.settle().await;

    let done = h.get(request.id).await.unwrap();
    assert_eq!(done.status, RequestStatus::Complete);
    assert_eq!(done.source_url.as_deref(), Some("https://media.test/watch?v=1"));
    assert_eq!(done.source_title.as_deref(), Some("Chris Tomlin - Holy Forever"));
    let path = h.target_path(&done);
    assert!(path.starts_with(h.output_root()));
    assert!(path.exists());
    assert_eq!(
        h.notifier.surfaces_for(request.id),
        vec![SurfaceStage::Downloading, SurfaceStage::Complete]
    );
}

// ---- Pipeline: failure then retry ----

#[tokio::test]
async fn failed_request_is_retried_to_complete() {
    let h = TestHarness::builder()
        .with_search(MockSearch::empty())
        .build()
        .await
        .unwrap();

    let request = h.request("an obscure hymn").await.unwrap();
    h.approve(request.id).await.unwrap();
    h.settle().await;

    let failed = h.get(request.id).await.unwrap();
    assert_eq!(failed.status, RequestStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("no results"));
    assert_eq!(h.fetcher.calls(), 0);

    // Retrying with no results again fails the same way; the record is re-armed once.
    assert_eq!(
        h.retry(request.id).await.unwrap(),
        RetryOutcome::Relaunched(request.id)
    );
    h.settle().await;
    assert_eq!(h.get(request.id).await.unwrap().status, RequestStatus::Failed);
    assert_eq!(
        h.notifier.surfaces_for(request.id),
        vec![
            SurfaceStage::Downloading,
            SurfaceStage::Failed("no results".to_string()),
            SurfaceStage::Downloading,
            SurfaceStage::Failed("no results".to_string()),
        ]
    );
}

#[tokio::test]
async fn rejected_request_never_downloads() {
    let h = TestHarness::builder()
        .with_fetch(FetchBehavior::Write)
        .build()
        .await
        .unwrap();

    let request = h.request("loud song").await.unwrap();
    assert_eq!(
        h.reject(request.id).await.unwrap(),
        SignalOutcome::Rejected(request.id)
    );
    h.settle().await;

    assert_eq!(h.get(request.id).await.unwrap().status, RequestStatus::Rejected);
    assert_eq!(h.fetcher.calls(), 0);
    assert!(matches!(
        h.retry(request.id).await.unwrap(),
        RetryOutcome::NotRetryable(RequestStatus::Rejected)
    ));
    assert_eq!(h.notifier.surfaces_for(request.id), vec![SurfaceStage::Rejected]);
}
