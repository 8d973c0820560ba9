// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup reconciliation of records a previous process left mid-flight.
//!
//! * `downloading`: the fetch was interrupted. The record fails with
//!   [`INTERRUPTED_MESSAGE`] and whatever the fetch left at the target path
//!   is removed, so a moderator can retry it.
//! * `approved`: the job was never started. It is launched again.

use std::sync::Arc;

use kidstunes_core::{Notifier, RequestStatus, RequestStore, RequestUpdate, KidsTunesError};
use kidstunes_downloader::{DownloadJob, RunnerSettings, remove_partial_files};
use tracing::{info, warn};

use crate::launcher::{JobLauncher, publish_outcome};

/// Error message recorded on downloads cut short by a restart.
pub const INTERRUPTED_MESSAGE: &str = "interrupted before completion";

/// Counts of what recovery did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub interrupted: usize,
    pub relaunched: usize,
}

/// Reconcile the store with the fact that no job is running yet.
pub async fn recover(
    store: &dyn RequestStore,
    launcher: &dyn JobLauncher,
    notifier: Option<&Arc<dyn Notifier>>,
    settings: &RunnerSettings,
) -> Result<RecoveryReport, KidsTunesError> {
    let mut report = RecoveryReport::default();

    for request in store.list_by_status(RequestStatus::Downloading).await? {
        if !store
            .update(request.id, &RequestUpdate::failed(INTERRUPTED_MESSAGE))
            .await?
        {
            continue;
        }
        let target = DownloadJob::for_request(&request)
            .layout()
            .target_path(&settings.output_root, &settings.audio_format);
        let removed = remove_partial_files(&target).await;
        warn!(
            request_id = %request.id,
            removed,
            "download interrupted by restart, marked failed"
        );
        if let Some(notifier) = notifier {
            publish_outcome(store, notifier.as_ref(), request.id).await;
        }
        report.interrupted += 1;
    }

    for request in store.list_by_status(RequestStatus::Approved).await? {
        info!(request_id = %request.id, "relaunching approved request");
        launcher.launch(&request);
        report.relaunched += 1;
    }

    Ok(report)
}
