// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end resolver tests against a mock chat-completions server.

use std::sync::Arc;
use std::time::Duration;

use kidstunes_core::Resolution;
use kidstunes_resolver::{MetadataResolver, XaiBackend};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer, timeout: Duration) -> MetadataResolver {
    let backend = XaiBackend::new(
        "key".into(),
        "grok-3-mini".into(),
        server.uri(),
        timeout,
    )
    .unwrap();
    MetadataResolver::new(Arc::new(backend), timeout)
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

#[tokio::test]
async fn structured_answer_resolves_all_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"artist": "for KING + COUNTRY", "song": "Little Drummer Boy", "album": "A Drummer Boy Christmas", "refined_search_term": "for KING + COUNTRY Little Drummer Boy"}"#,
        )))
        .mount(&server)
        .await;

    let r = resolver_for(&server, Duration::from_secs(5))
        .resolve("drummer boy king and country audio")
        .await;
    assert_eq!(r.artist.as_deref(), Some("for KING + COUNTRY"));
    assert_eq!(r.song.as_deref(), Some("Little Drummer Boy"));
    assert_eq!(r.album, "A Drummer Boy Christmas");
}

#[tokio::test]
async fn prose_answer_becomes_search_term() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Queen Bohemian Rhapsody")))
        .mount(&server)
        .await;

    let r = resolver_for(&server, Duration::from_secs(5)).resolve("q").await;
    assert_eq!(r, Resolution::passthrough("Queen Bohemian Rhapsody"));
}

#[tokio::test]
async fn unavailable_backend_falls_back_to_passthrough() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let r = resolver_for(&server, Duration::from_secs(5))
        .resolve("no one like the lord")
        .await;
    assert_eq!(r, Resolution::passthrough("no one like the lord"));
}

#[tokio::test]
async fn slow_backend_falls_back_to_passthrough() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("{}"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let r = resolver_for(&server, Duration::from_millis(200)).resolve("slow").await;
    assert_eq!(r, Resolution::passthrough("slow"));
}
