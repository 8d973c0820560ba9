// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resolver and its fallback chain.
//!
//! | Situation                         | Result                                    |
//! |-----------------------------------|-------------------------------------------|
//! | no backend configured             | pass-through, album `Singles`             |
//! | backend error or timeout          | pass-through, album `Singles`             |
//! | answer is not the expected JSON   | raw answer as the refined query           |
//! | answer parses                     | parsed fields, blanks replaced by defaults|

use std::sync::Arc;
use std::time::Duration;

use kidstunes_core::{DEFAULT_ALBUM, Resolution, ResolverBackend};
use serde::Deserialize;
use tracing::{debug, warn};

/// Upper bound for one backend call regardless of configuration.
pub const MAX_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Maps free-text queries to structured metadata.
#[derive(Clone)]
pub struct MetadataResolver {
    backend: Option<Arc<dyn ResolverBackend>>,
    timeout: Duration,
}

impl MetadataResolver {
    /// A resolver that calls `backend`, bounded by `timeout` (capped at
    /// [`MAX_RESOLVE_TIMEOUT`]).
    pub fn new(backend: Arc<dyn ResolverBackend>, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            timeout: timeout.min(MAX_RESOLVE_TIMEOUT),
        }
    }

    /// A resolver with no backend: every query passes through unchanged.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            timeout: MAX_RESOLVE_TIMEOUT,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Resolve `query`. Never fails.
    pub async fn resolve(&self, query: &str) -> Resolution {
        let Some(backend) = &self.backend else {
            return Resolution::passthrough(query);
        };

        match tokio::time::timeout(self.timeout, backend.refine(query)).await {
            Ok(Ok(content)) => {
                let resolution = parse_resolution(query, &content);
                debug!(
                    refined = %resolution.refined_query,
                    album = %resolution.album,
                    "query resolved"
                );
                resolution
            }
            Ok(Err(e)) => {
                warn!(error = %e, backend = backend.name(), "resolver unavailable, passing query through");
                Resolution::passthrough(query)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    backend = backend.name(),
                    "resolver timed out, passing query through"
                );
                Resolution::passthrough(query)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawResolution {
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    song: Option<String>,
    #[serde(default)]
    album: Option<String>,
    #[serde(default, alias = "refined_query")]
    refined_search_term: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Interpret a backend answer for `query`.
///
/// A JSON object with the expected keys is used field by field. Anything else
/// becomes the refined query verbatim (or `query` itself when the answer is
/// blank), with no artist or song and the default album.
pub fn parse_resolution(query: &str, content: &str) -> Resolution {
    let content = content.trim();
    match serde_json::from_str::<RawResolution>(content) {
        Ok(raw) => Resolution {
            refined_query: non_blank(raw.refined_search_term).unwrap_or_else(|| query.to_string()),
            artist: non_blank(raw.artist),
            song: non_blank(raw.song),
            album: non_blank(raw.album).unwrap_or_else(|| DEFAULT_ALBUM.to_string()),
        },
        Err(e) => {
            warn!(error = %e, "resolver answer is not structured, using it as the search term");
            let refined = if content.is_empty() { query } else { content };
            Resolution::passthrough(refined)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kidstunes_core::{AdapterType, HealthStatus, KidsTunesError, PluginAdapter};
    use proptest::prelude::*;

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct StubBackend(Reply);

    #[async_trait]
    impl PluginAdapter for StubBackend {
        fn name(&self) -> &str {
            "stub"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Resolver
        }
        async fn health_check(&self) -> Result<HealthStatus, KidsTunesError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl ResolverBackend for StubBackend {
        async fn refine(&self, _query: &str) -> Result<String, KidsTunesError> {
            match self.0 {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(KidsTunesError::Resolver {
                    message: "503".into(),
                    source: None,
                }),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(String::new())
                }
            }
        }
    }

    fn resolver(reply: Reply) -> MetadataResolver {
        MetadataResolver::new(Arc::new(StubBackend(reply)), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn disabled_resolver_passes_through() {
        let r = MetadataResolver::disabled().resolve("no one like the lord").await;
        assert_eq!(r, Resolution::passthrough("no one like the lord"));
        assert_eq!(r.album, "Singles");
    }

    #[tokio::test]
    async fn structured_answer_is_used() {
        let r = resolver(Reply::Text(
            r#"{"artist": "Queen", "song": "Bohemian Rhapsody", "album": "A Night at the Opera", "refined_search_term": "Queen Bohemian Rhapsody"}"#,
        ))
        .resolve("bohemian rhapsody queen live")
        .await;
        assert_eq!(r.artist.as_deref(), Some("Queen"));
        assert_eq!(r.song.as_deref(), Some("Bohemian Rhapsody"));
        assert_eq!(r.album, "A Night at the Opera");
        assert_eq!(r.refined_query, "Queen Bohemian Rhapsody");
    }

    #[tokio::test]
    async fn null_album_defaults_to_singles() {
        let r = resolver(Reply::Text(r#"{"artist": "A", "song": "B", "album": null}"#))
            .resolve("q")
            .await;
        assert_eq!(r.album, "Singles");
        assert_eq!(r.refined_query, "q");
    }

    #[tokio::test]
    async fn unparseable_answer_becomes_refined_query() {
        let r = resolver(Reply::Text("  Queen Bohemian Rhapsody  ")).resolve("q").await;
        assert_eq!(r, Resolution::passthrough("Queen Bohemian Rhapsody"));
    }

    #[tokio::test]
    async fn blank_answer_falls_back_to_query() {
        let r = resolver(Reply::Text("   ")).resolve("the query").await;
        assert_eq!(r, Resolution::passthrough("the query"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn backend_error_passes_through() {
        let r = resolver(Reply::Fail).resolve("q").await;
        assert_eq!(r, Resolution::passthrough("q"));
        assert!(logs_contain("resolver unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_passes_through() {
        let r = resolver(Reply::Hang).resolve("slow").await;
        assert_eq!(r, Resolution::passthrough("slow"));
    }

    #[test]
    fn configured_timeout_is_capped() {
        let r = MetadataResolver::new(
            Arc::new(StubBackend(Reply::Fail)),
            Duration::from_secs(60),
        );
        assert_eq!(r.timeout, MAX_RESOLVE_TIMEOUT);
        assert!(r.is_enabled());
        assert!(!MetadataResolver::disabled().is_enabled());
    }

    #[test]
    fn json_that_is_not_an_object_is_raw_text() {
        let r = parse_resolution("q", "[1, 2, 3]");
        assert_eq!(r.refined_query, "[1, 2, 3]");
        assert_eq!(r.artist, None);
    }

    proptest! {
        #[test]
        fn disabled_mode_is_identity(query in ".*") {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let r = rt.block_on(MetadataResolver::disabled().resolve(&query));
            prop_assert_eq!(r.refined_query, query);
            prop_assert_eq!(r.artist, None);
            prop_assert_eq!(r.song, None);
            prop_assert_eq!(r.album, "Singles");
        }

        #[test]
        fn album_is_never_empty(content in ".*") {
            let r = parse_resolution("q", &content);
            prop_assert!(!r.album.trim().is_empty());
            prop_assert!(!r.refined_query.is_empty());
        }
    }
}
