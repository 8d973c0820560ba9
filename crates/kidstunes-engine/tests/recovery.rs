// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup reconciliation of interrupted and never-started jobs.

use std::sync::Arc;

use kidstunes_core::types::SurfaceStage;
use kidstunes_core::{Notifier, RequestStatus, RequestStore, RequestUpdate};
use kidstunes_engine::{INTERRUPTED_MESSAGE, RecoveryReport, recover};
use kidstunes_test_utils::TestHarness;

#[tokio::test]
async fn interrupted_downloads_fail_and_approved_ones_relaunch() {
    let h = TestHarness::new().await.unwrap();
    let interrupted = h.request("half downloaded").await.unwrap();
    let waiting = h.request("never started").await.unwrap();
    let untouched = h.request("still pending").await.unwrap();

    for (from, to) in [
        (RequestStatus::Pending, RequestStatus::Approved),
        (RequestStatus::Approved, RequestStatus::Downloading),
    ] {
        assert!(
            h.store
                .update(interrupted.id, &RequestUpdate::transition(from, to))
                .await
                .unwrap()
        );
    }
    assert!(
        h.store
            .update(
                waiting.id,
                &RequestUpdate::transition(RequestStatus::Pending, RequestStatus::Approved)
            )
            .await
            .unwrap()
    );

    // What the killed fetch left behind.
    let target = h.target_path(&interrupted);
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, b"partial").unwrap();
    let part = target.with_extension("webm.part");
    std::fs::write(&part, b"partial").unwrap();
    let converting = target.with_extension("temp.mp3");
    std::fs::write(&converting, b"partial").unwrap();

    let notifier: Arc<dyn Notifier> = h.notifier.clone();
    let report = recover(
        h.store.as_ref(),
        h.launcher.as_ref(),
        Some(&notifier),
        &h.settings,
    )
    .await
    .unwrap();
    h.settle().await;

    assert_eq!(
        report,
        RecoveryReport {
            interrupted: 1,
            relaunched: 1
        }
    );

    let failed = h.get(interrupted.id).await.unwrap();
    assert_eq!(failed.status, RequestStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some(INTERRUPTED_MESSAGE));
    assert!(!target.exists());
    assert!(!part.exists());
    assert!(!converting.exists());
    assert_eq!(
        h.notifier.surfaces_for(interrupted.id),
        vec![SurfaceStage::Failed(INTERRUPTED_MESSAGE.to_string())]
    );

    assert_eq!(h.get(waiting.id).await.unwrap().status, RequestStatus::Complete);
    assert_eq!(h.get(untouched.id).await.unwrap().status, RequestStatus::Pending);
    assert_eq!(h.fetcher.calls(), 1);
}

#[tokio::test]
async fn recovery_on_clean_store_does_nothing() {
    let h = TestHarness::new().await.unwrap();
    h.request("pending one").await.unwrap();

    let report = recover(h.store.as_ref(), h.launcher.as_ref(), None, &h.settings)
        .await
        .unwrap();

    assert_eq!(report, RecoveryReport::default());
    assert_eq!(h.fetcher.calls(), 0);
}
