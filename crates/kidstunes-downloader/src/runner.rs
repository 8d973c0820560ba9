// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The download job: search, fetch, finalize, tag.
//!
//! A job owns its record from `approved` onward. It first moves the record to
//! `downloading` with a conditional write; losing that write means another
//! job already owns the record and nothing else happens. From then on every
//! failure ends in `downloading -> failed` with the cause recorded, and any
//! file the fetch left behind is removed first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kidstunes_core::types::{FetchRequest, Request, RequestId, RequestUpdate};
use kidstunes_core::{
    KidsTunesError, MediaFetcher, MediaSearch, RequestStatus, RequestStore, TagTool,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cleanup::remove_partial_files;
use crate::layout::TrackLayout;

/// Library settings shared by every job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub output_root: PathBuf,
    pub audio_format: String,
}

/// What one job needs to know about its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub request_id: RequestId,
    pub search_term: String,
    pub artist: Option<String>,
    pub song: Option<String>,
    pub album: Option<String>,
}

impl DownloadJob {
    pub fn for_request(request: &Request) -> Self {
        Self {
            request_id: request.id,
            search_term: request.search_term().to_string(),
            artist: request.artist.clone(),
            song: request.song.clone(),
            album: Some(request.album.clone()),
        }
    }

    pub fn layout(&self) -> TrackLayout {
        TrackLayout::new(
            self.artist.as_deref(),
            self.album.as_deref(),
            self.song.as_deref(),
        )
    }
}

/// Executes download jobs against the injected collaborators.
#[derive(Clone)]
pub struct DownloadJobRunner {
    store: Arc<dyn RequestStore>,
    search: Arc<dyn MediaSearch>,
    fetcher: Arc<dyn MediaFetcher>,
    tagger: Option<Arc<dyn TagTool>>,
    settings: RunnerSettings,
    cancel: CancellationToken,
}

impl DownloadJobRunner {
    pub fn new(
        store: Arc<dyn RequestStore>,
        search: Arc<dyn MediaSearch>,
        fetcher: Arc<dyn MediaFetcher>,
        settings: RunnerSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            search,
            fetcher,
            tagger: None,
            settings,
            cancel,
        }
    }

    /// Enable the post-download tagging pass.
    pub fn with_tagger(mut self, tagger: Arc<dyn TagTool>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Path the job for `job` writes to.
    pub fn target_path(&self, job: &DownloadJob) -> PathBuf {
        job.layout()
            .target_path(&self.settings.output_root, &self.settings.audio_format)
    }

    /// Run `job` to completion.
    ///
    /// Returns the library path on success. On failure the record has already
    /// been moved to `failed` (unless the store itself is what failed), and
    /// the returned error is the cause.
    pub async fn run(&self, job: &DownloadJob) -> Result<PathBuf, KidsTunesError> {
        let id = job.request_id;
        let claimed = self
            .store
            .update(
                id,
                &RequestUpdate::transition(RequestStatus::Approved, RequestStatus::Downloading),
            )
            .await?;
        if !claimed {
            debug!(request_id = %id, "request is not approved, job skipped");
            return Err(KidsTunesError::InvalidRequest(format!(
                "request {id} is not approved"
            )));
        }
        info!(request_id = %id, term = %job.search_term, "download started");

        let path = match self.pipeline(job).await {
            Ok(path) => path,
            Err(e) => {
                self.record_failure(id, &e).await;
                return Err(e);
            }
        };
        info!(request_id = %id, path = %path.display(), "download complete");

        if let Some(tagger) = &self.tagger {
            if let Err(e) = tagger.apply(&path).await {
                warn!(request_id = %id, error = %e, "tagging pass failed");
            }
        }

        Ok(path)
    }

    async fn pipeline(&self, job: &DownloadJob) -> Result<PathBuf, KidsTunesError> {
        let id = job.request_id;

        let hit = self
            .search
            .search(&job.search_term)
            .await?
            .ok_or_else(|| KidsTunesError::download("no results"))?;
        debug!(request_id = %id, url = %hit.url, title = %hit.title, "search hit");

        if !self
            .store
            .update(id, &RequestUpdate::source(&hit.url, &hit.title))
            .await?
        {
            return Err(KidsTunesError::Internal(format!(
                "request {id} disappeared while downloading"
            )));
        }

        let layout = job.layout();
        let root = &self.settings.output_root;
        let target = layout.target_path(root, &self.settings.audio_format);
        tokio::fs::create_dir_all(layout.target_dir(root))
            .await
            .map_err(|e| KidsTunesError::Download {
                message: format!("failed to create library directory: {e}"),
                source: Some(Box::new(e)),
            })?;

        let request = FetchRequest {
            url: hit.url,
            output_template: layout.output_template(root),
            target_format: self.settings.audio_format.clone(),
            metadata: layout.metadata(),
        };

        // The fetcher has stopped writing by the time it returns, cancelled or not.
        let fetched = self.fetcher.fetch(&request, &self.cancel).await;

        let path = match fetched {
            Ok(outcome) => outcome.file_path.unwrap_or_else(|| target.clone()),
            Err(e) => {
                remove_partial_files(&target).await;
                return Err(e);
            }
        };

        if !file_exists(&path).await {
            remove_partial_files(&target).await;
            return Err(KidsTunesError::download(format!(
                "fetch finished but {} does not exist",
                path.display()
            )));
        }

        let completed = self
            .store
            .update(id, &RequestUpdate::complete(path.display().to_string()))
            .await;
        match completed {
            Ok(true) => Ok(path),
            Ok(false) => {
                remove_partial_files(&path).await;
                Err(KidsTunesError::Internal(format!(
                    "request {id} left downloading before completion"
                )))
            }
            Err(e) => {
                remove_partial_files(&path).await;
                Err(e)
            }
        }
    }

    async fn record_failure(&self, id: RequestId, cause: &KidsTunesError) {
        let message = failure_message(cause);
        if cause.is_fatal() {
            error!(request_id = %id, error = %cause, "download failed");
        } else {
            warn!(request_id = %id, error = %cause, "download failed");
        }
        match self.store.update(id, &RequestUpdate::failed(&message)).await {
            Ok(true) => {}
            Ok(false) => warn!(request_id = %id, "failure not recorded, request left downloading"),
            Err(e) => error!(request_id = %id, error = %e, "failed to record download failure"),
        }
    }
}

/// Human-readable cause stored on a failed record.
pub fn failure_message(error: &KidsTunesError) -> String {
    match error {
        KidsTunesError::Download { message, .. } => message.clone(),
        KidsTunesError::Cancelled => "cancelled".to_string(),
        other => other.to_string(),
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
