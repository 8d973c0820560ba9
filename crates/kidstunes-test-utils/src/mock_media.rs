// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock media index, fetcher and tagger for deterministic testing.
//!
//! None of these touch the network or spawn processes. `MockFetcher` writes
//! real files under the output template so cleanup can be asserted on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use kidstunes_core::types::{FetchOutcome, FetchRequest, SearchHit};
use kidstunes_core::{
    AdapterType, HealthStatus, KidsTunesError, MediaFetcher, MediaSearch, PluginAdapter, TagTool,
};

macro_rules! mock_adapter {
    ($ty:ty, $name:literal, $kind:expr) => {
        #[async_trait]
        impl PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> AdapterType {
                $kind
            }

            async fn health_check(&self) -> Result<HealthStatus, KidsTunesError> {
                Ok(HealthStatus::Healthy)
            }
        }
    };
}

/// A media index that always answers the same way.
pub struct MockSearch {
    answer: Result<Option<SearchHit>, String>,
    terms: Arc<Mutex<Vec<String>>>,
}

impl MockSearch {
    /// Every search finds `url` titled `title`.
    pub fn hit(url: &str, title: &str) -> Self {
        Self::answering(Ok(Some(SearchHit {
            url: url.to_string(),
            title: title.to_string(),
        })))
    }

    /// Every search comes back empty.
    pub fn empty() -> Self {
        Self::answering(Ok(None))
    }

    /// Every search fails with a download error.
    pub fn failing(message: &str) -> Self {
        Self::answering(Err(message.to_string()))
    }

    fn answering(answer: Result<Option<SearchHit>, String>) -> Self {
        Self {
            answer,
            terms: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Terms searched so far, in order.
    pub async fn terms(&self) -> Vec<String> {
        self.terms.lock().await.clone()
    }
}

mock_adapter!(MockSearch, "mock-search", AdapterType::MediaSource);

#[async_trait]
impl MediaSearch for MockSearch {
    async fn search(&self, term: &str) -> Result<Option<SearchHit>, KidsTunesError> {
        self.terms.lock().await.push(term.to_string());
        self.answer.clone().map_err(KidsTunesError::download)
    }
}

/// What a [`MockFetcher`] does when asked to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchBehavior {
    /// Write the file at the template path and report it.
    Write,
    /// Write the file at the template path but report nothing.
    WriteUnreported,
    /// Report `path` without writing anything.
    Report(PathBuf),
    /// Leave a downloaded source file and a `.part` download next to the
    /// target, then fail with the message.
    FailAfterPartialWrite(String),
    /// Write a `.part` download and wait for cancellation. Once cancelled, a
    /// conversion file is written before the fetch returns.
    Hang,
}

/// Contents written by [`MockFetcher`].
pub const MOCK_AUDIO: &[u8] = b"ID3mock-audio";

/// Extension of the source media [`MockFetcher`] pretends to download.
pub const MOCK_SOURCE_EXT: &str = "webm";

/// A fetcher that produces files on disk according to a [`FetchBehavior`].
pub struct MockFetcher {
    behavior: FetchBehavior,
    calls: AtomicUsize,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
    started: Notify,
}

impl MockFetcher {
    pub fn new(behavior: FetchBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            requests: Arc::new(Mutex::new(Vec::new())),
            started: Notify::new(),
        }
    }

    /// Number of fetches started.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fetch requests received so far.
    pub async fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().await.clone()
    }

    /// Resolves once a fetch has started (for [`FetchBehavior::Hang`], once
    /// its `.part` download is on disk).
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }
}

/// The path the fetch tool would write for `request`.
pub fn rendered_path(request: &FetchRequest) -> PathBuf {
    render(request, &request.target_format)
}

/// The source download the fetch tool keeps before conversion.
pub fn source_path(request: &FetchRequest) -> PathBuf {
    render(request, MOCK_SOURCE_EXT)
}

/// The intermediate file audio conversion writes.
fn conversion_path(request: &FetchRequest) -> PathBuf {
    render(request, &format!("temp.{}", request.target_format))
}

fn render(request: &FetchRequest, ext: &str) -> PathBuf {
    let template = request.output_template.to_string_lossy();
    PathBuf::from(template.replace("%(ext)s", ext).replace("%%", "%"))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

async fn write(path: &Path, contents: &[u8]) -> Result<(), KidsTunesError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| KidsTunesError::download(format!("mock write failed: {e}")))
}

mock_adapter!(MockFetcher, "mock-fetcher", AdapterType::MediaSource);

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, KidsTunesError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        let path = rendered_path(request);
        if self.behavior != FetchBehavior::Hang {
            self.started.notify_one();
        }
        match &self.behavior {
            FetchBehavior::Write => {
                write(&path, MOCK_AUDIO).await?;
                Ok(FetchOutcome {
                    file_path: Some(path),
                })
            }
            FetchBehavior::WriteUnreported => {
                write(&path, MOCK_AUDIO).await?;
                Ok(FetchOutcome::default())
            }
            FetchBehavior::Report(reported) => Ok(FetchOutcome {
                file_path: Some(reported.clone()),
            }),
            FetchBehavior::FailAfterPartialWrite(message) => {
                let source = source_path(request);
                write(&source, &MOCK_AUDIO[..3]).await?;
                write(&with_suffix(&source, ".part"), &MOCK_AUDIO[..3]).await?;
                Err(KidsTunesError::download(message.clone()))
            }
            FetchBehavior::Hang => {
                let source = source_path(request);
                write(&with_suffix(&source, ".part"), &MOCK_AUDIO[..3]).await?;
                self.started.notify_one();
                cancel.cancelled().await;
                write(&conversion_path(request), &MOCK_AUDIO[..3]).await?;
                Err(KidsTunesError::Cancelled)
            }
        }
    }
}

/// A tagger that records what it was given.
pub struct MockTagTool {
    fail: bool,
    applied: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockTagTool {
    pub fn new() -> Self {
        Self {
            fail: false,
            applied: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A tagger whose every run fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub async fn applied(&self) -> Vec<PathBuf> {
        self.applied.lock().await.clone()
    }
}

impl Default for MockTagTool {
    fn default() -> Self {
        Self::new()
    }
}

mock_adapter!(MockTagTool, "mock-tagger", AdapterType::Tagger);

#[async_trait]
impl TagTool for MockTagTool {
    async fn apply(&self, path: &Path) -> Result<(), KidsTunesError> {
        self.applied.lock().await.push(path.to_path_buf());
        if self.fail {
            return Err(KidsTunesError::tagging("mock tagger failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidstunes_core::types::MetadataOverrides;

    fn request(dir: &Path) -> FetchRequest {
        FetchRequest {
            url: "https://example.invalid/watch?v=1".into(),
            output_template: dir.join("Song.%(ext)s"),
            target_format: "mp3".into(),
            metadata: MetadataOverrides {
                artist: "A".into(),
                title: "Song".into(),
                album: "Singles".into(),
            },
        }
    }

    #[tokio::test]
    async fn write_behavior_creates_reported_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = MockFetcher::new(FetchBehavior::Write);
        let outcome = fetcher
            .fetch(&request(dir.path()), &CancellationToken::new())
            .await
            .unwrap();
        let path = outcome.file_path.unwrap();
        assert_eq!(path, dir.path().join("Song.mp3"));
        assert_eq!(std::fs::read(&path).unwrap(), MOCK_AUDIO);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn partial_write_leaves_files_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = MockFetcher::new(FetchBehavior::FailAfterPartialWrite("boom".into()));
        let err = fetcher
            .fetch(&request(dir.path()), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(dir.path().join("Song.webm").exists());
        assert!(dir.path().join("Song.webm.part").exists());
        assert!(!dir.path().join("Song.mp3").exists());
    }

    #[tokio::test]
    async fn hang_writes_conversion_file_once_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = MockFetcher::new(FetchBehavior::Hang);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = fetcher.fetch(&request(dir.path()), &cancel).await.unwrap_err();
        assert!(matches!(err, KidsTunesError::Cancelled));
        assert!(dir.path().join("Song.webm.part").exists());
        assert!(dir.path().join("Song.temp.mp3").exists());
    }

    #[test]
    fn rendered_path_unescapes_percent() {
        let mut req = request(Path::new("/out"));
        req.output_template = PathBuf::from("/out/100%% Hits.%(ext)s");
        assert_eq!(rendered_path(&req), PathBuf::from("/out/100% Hits.mp3"));
    }

    #[tokio::test]
    async fn search_records_terms() {
        let search = MockSearch::hit("u", "t");
        let hit = search.search("abc").await.unwrap().unwrap();
        assert_eq!(hit.url, "u");
        assert_eq!(search.terms().await, vec!["abc".to_string()]);
        assert!(MockSearch::empty().search("x").await.unwrap().is_none());
    }
}
