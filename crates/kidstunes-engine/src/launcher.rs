// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hands approved requests to download workers.
//!
//! Launching never blocks the caller: the job runs on a tracked task so the
//! dispatch path keeps serving other records while a fetch takes minutes.

use std::sync::Arc;

use kidstunes_core::types::SurfaceStage;
use kidstunes_core::{KidsTunesError, Notifier, Request, RequestId, RequestStatus, RequestStore};
use kidstunes_downloader::{DownloadJob, DownloadJobRunner};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

/// Starts the download pipeline for a request that was just moved to `approved`.
pub trait JobLauncher: Send + Sync {
    fn launch(&self, request: &Request);
}

/// Production launcher: one tracked task per job. The approval surface shows
/// the download starting and then how it ended.
pub struct TrackedLauncher {
    runner: DownloadJobRunner,
    store: Arc<dyn RequestStore>,
    notifier: Option<Arc<dyn Notifier>>,
    tracker: TaskTracker,
}

impl TrackedLauncher {
    pub fn new(
        runner: DownloadJobRunner,
        store: Arc<dyn RequestStore>,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            runner,
            store,
            notifier: None,
            tracker,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }
}

impl JobLauncher for TrackedLauncher {
    fn launch(&self, request: &Request) {
        let job = DownloadJob::for_request(request);
        let runner = self.runner.clone();
        let store = self.store.clone();
        let notifier = self.notifier.clone();
        let request = request.clone();

        self.tracker.spawn(async move {
            let id = job.request_id;
            if let Some(notifier) = &notifier
                && request.approval_ref.is_some()
                && let Err(e) = notifier
                    .update_surface(&request, &SurfaceStage::Downloading)
                    .await
            {
                warn!(request_id = %id, error = %e, "failed to update approval surface");
            }
            match runner.run(&job).await {
                Ok(_) => {}
                // The claim was lost: another job owns the record.
                Err(KidsTunesError::InvalidRequest(_)) => return,
                Err(e) if e.is_fatal() => {
                    error!(request_id = %id, error = %e, "download job aborted");
                }
                Err(_) => {}
            }
            if let Some(notifier) = notifier {
                publish_outcome(store.as_ref(), notifier.as_ref(), id).await;
            }
        });
    }
}

/// Mirror the record's terminal state onto its approval surface.
pub(crate) async fn publish_outcome(store: &dyn RequestStore, notifier: &dyn Notifier, id: RequestId) {
    let request = match store.get(id).await {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(e) => {
            error!(request_id = %id, error = %e, "failed to reload request after job");
            return;
        }
    };

    let Some(stage) = terminal_stage(&request) else {
        debug!(request_id = %id, status = %request.status, "no terminal surface for status");
        return;
    };
    if let Err(e) = notifier.update_surface(&request, &stage).await {
        warn!(request_id = %id, error = %e, "failed to update approval surface");
    }
}

fn terminal_stage(request: &Request) -> Option<SurfaceStage> {
    match request.status {
        RequestStatus::Complete => Some(SurfaceStage::Complete),
        RequestStatus::Failed => Some(SurfaceStage::Failed(
            request.error_message.clone().unwrap_or_default(),
        )),
        _ => None,
    }
}
