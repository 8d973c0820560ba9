// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the real engine (SQLite store in a temp directory,
//! download runner, launcher, approval gate, intake, dispatcher) around mock
//! media tools and a recording notifier. Tests drive it through the same
//! [`EngineHandle`] the chat transport uses.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use kidstunes_core::types::{IntakeRequest, OriginRef, Signal, SignalKind};
use kidstunes_core::{ApprovalRef, KidsTunesError, Request, RequestId, RequestStore};
use kidstunes_downloader::{DownloadJob, DownloadJobRunner, RunnerSettings};
use kidstunes_engine::{
    ApprovalGate, DEFAULT_QUEUE_CAPACITY, Dispatcher, EngineHandle, Intake, RetryOutcome,
    SignalOutcome, TrackedLauncher, drain_jobs,
};
use kidstunes_resolver::MetadataResolver;
use kidstunes_storage::SqliteRequestStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::mock_media::{FetchBehavior, MockFetcher, MockSearch, MockTagTool};
use crate::mock_transport::RecordingNotifier;

/// Role id the harness treats as the moderator role.
pub const MODERATOR_ROLE: &str = "424242";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    resolver: MetadataResolver,
    search: MockSearch,
    fetch: FetchBehavior,
    tagger: Option<MockTagTool>,
    audio_format: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            resolver: MetadataResolver::disabled(),
            search: MockSearch::hit("u", "t"),
            fetch: FetchBehavior::Write,
            tagger: None,
            audio_format: "mp3".to_string(),
        }
    }

    pub fn with_resolver(mut self, resolver: MetadataResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_search(mut self, search: MockSearch) -> Self {
        self.search = search;
        self
    }

    pub fn with_fetch(mut self, behavior: FetchBehavior) -> Self {
        self.fetch = behavior;
        self
    }

    pub fn with_tagger(mut self, tagger: MockTagTool) -> Self {
        self.tagger = Some(tagger);
        self
    }

    /// Build the harness and start its dispatcher.
    pub async fn build(self) -> Result<TestHarness, KidsTunesError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| KidsTunesError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");
        let output_root = temp_dir.path().join("music");

        let store = Arc::new(SqliteRequestStore::open(db_path.to_string_lossy()).await?);
        let search = Arc::new(self.search);
        let fetcher = Arc::new(MockFetcher::new(self.fetch));
        let tagger = self.tagger.map(Arc::new);
        let notifier = Arc::new(RecordingNotifier::new());

        let settings = RunnerSettings {
            output_root,
            audio_format: self.audio_format,
        };
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();

        let mut runner = DownloadJobRunner::new(
            store.clone(),
            search.clone(),
            fetcher.clone(),
            settings.clone(),
            cancel.clone(),
        );
        if let Some(tagger) = &tagger {
            runner = runner.with_tagger(tagger.clone());
        }

        let launcher = Arc::new(
            TrackedLauncher::new(runner, store.clone(), tracker.clone())
                .with_notifier(notifier.clone()),
        );
        let gate = Arc::new(
            ApprovalGate::new(store.clone(), launcher.clone(), MODERATOR_ROLE)
                .with_notifier(notifier.clone())
                .with_tracker(tracker.clone()),
        );
        let intake = Arc::new(Intake::new(store.clone(), self.resolver));

        let (dispatcher, handle) =
            Dispatcher::new(gate, intake, tracker.clone(), DEFAULT_QUEUE_CAPACITY);
        let dispatcher = tokio::spawn(dispatcher.run(cancel.clone()));

        Ok(TestHarness {
            handle,
            store,
            search,
            fetcher,
            tagger,
            notifier,
            launcher,
            settings,
            cancel,
            tracker,
            dispatcher: Some(dispatcher),
            next_message: std::sync::atomic::AtomicU64::new(1),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine with mock collaborators and temp storage.
pub struct TestHarness {
    /// The transport-facing engine handle.
    pub handle: EngineHandle,
    /// The SQLite store (temp DB, removed on drop).
    pub store: Arc<SqliteRequestStore>,
    pub search: Arc<MockSearch>,
    pub fetcher: Arc<MockFetcher>,
    pub tagger: Option<Arc<MockTagTool>>,
    pub notifier: Arc<RecordingNotifier>,
    pub launcher: Arc<TrackedLauncher>,
    pub settings: RunnerSettings,
    /// Cancels the dispatcher and every running job.
    pub cancel: CancellationToken,
    tracker: TaskTracker,
    dispatcher: Option<JoinHandle<()>>,
    next_message: std::sync::atomic::AtomicU64,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with every default: resolver disabled, search hits `u`/`t`,
    /// fetch writes the file.
    pub async fn new() -> Result<Self, KidsTunesError> {
        Self::builder().build().await
    }

    pub fn approval_ref(id: RequestId) -> ApprovalRef {
        ApprovalRef(format!("surface-{id}"))
    }

    pub fn moderator() -> Vec<String> {
        vec!["1".to_string(), MODERATOR_ROLE.to_string()]
    }

    /// Submit `query` and attach its approval surface, like the transport does.
    pub async fn request(&self, query: &str) -> Result<Request, KidsTunesError> {
        let n = self
            .next_message
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let created = self
            .handle
            .submit(IntakeRequest {
                requester_id: "1001".to_string(),
                requester_name: "kid".to_string(),
                query: query.to_string(),
                origin: Some(OriginRef {
                    channel_id: "request-channel".to_string(),
                    message_id: format!("origin-{n}"),
                }),
            })
            .await?;
        self.handle
            .attach_approval_ref(created.id, Self::approval_ref(created.id))
            .await?;
        self.get(created.id).await
    }

    pub async fn signal_as(
        &self,
        kind: SignalKind,
        id: RequestId,
        roles: Vec<String>,
    ) -> Result<SignalOutcome, KidsTunesError> {
        self.handle
            .signal(Signal {
                kind,
                actor_roles: roles,
                approval_ref: Self::approval_ref(id),
            })
            .await
    }

    pub async fn approve(&self, id: RequestId) -> Result<SignalOutcome, KidsTunesError> {
        self.signal_as(SignalKind::Approve, id, Self::moderator())
            .await
    }

    pub async fn reject(&self, id: RequestId) -> Result<SignalOutcome, KidsTunesError> {
        self.signal_as(SignalKind::Reject, id, Self::moderator())
            .await
    }

    pub async fn retry(&self, id: RequestId) -> Result<RetryOutcome, KidsTunesError> {
        self.handle.retry(id, Self::moderator()).await
    }

    /// Wait until every launched job and pending intake has finished.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    pub async fn get(&self, id: RequestId) -> Result<Request, KidsTunesError> {
        self.store.get(id).await?.ok_or_else(|| KidsTunesError::NotFound {
            what: format!("request {id}"),
        })
    }

    pub fn output_root(&self) -> &Path {
        &self.settings.output_root
    }

    /// Library path the runner computes for `request`.
    pub fn target_path(&self, request: &Request) -> PathBuf {
        DownloadJob::for_request(request)
            .layout()
            .target_path(&self.settings.output_root, &self.settings.audio_format)
    }

    /// Cancel everything and drain jobs. Returns whether the drain finished in time.
    pub async fn shutdown(&mut self) -> bool {
        self.cancel.cancel();
        let drained = drain_jobs(&self.tracker, Duration::from_secs(5)).await;
        if let Some(dispatcher) = self.dispatcher.take() {
            let _ = dispatcher.await;
        }
        drained
    }
}
