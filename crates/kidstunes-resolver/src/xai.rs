// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for an OpenAI-compatible chat-completions endpoint (xAI by default).

use std::time::Duration;

use async_trait::async_trait;
use kidstunes_core::{
    AdapterType, HealthStatus, KidsTunesError, PluginAdapter, ResolverBackend,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompt::build_prompt;

const MAX_TOKENS: u32 = 200;
const TEMPERATURE: f32 = 0.1;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions resolver backend.
#[derive(Debug, Clone)]
pub struct XaiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl XaiBackend {
    /// Creates a backend that posts to `endpoint` with bearer `api_key`.
    pub fn new(
        api_key: String,
        model: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, KidsTunesError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KidsTunesError::Resolver {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            model,
            endpoint,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl PluginAdapter for XaiBackend {
    fn name(&self) -> &str {
        "xai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Resolver
    }

    async fn health_check(&self) -> Result<HealthStatus, KidsTunesError> {
        // Probing would spend tokens; report configuration state only.
        if self.api_key.trim().is_empty() {
            return Ok(HealthStatus::Unhealthy("api key is empty".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ResolverBackend for XaiBackend {
    async fn refine(&self, query: &str) -> Result<String, KidsTunesError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(query),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| KidsTunesError::Resolver {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "resolver response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KidsTunesError::Resolver {
                message: format!("API returned {status}: {body}"),
                source: None,
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| KidsTunesError::Resolver {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default().trim().to_string())
            .ok_or_else(|| KidsTunesError::Resolver {
                message: "API response had no choices".into(),
                source: None,
            })
    }
}
