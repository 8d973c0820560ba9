// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the engine.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::lifecycle::RequestStatus;

/// Album used whenever the real album is unknown.
pub const DEFAULT_ALBUM: &str = "Singles";

/// Store-assigned identifier of a request record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub i64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to the moderation-surface message tied to a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalRef(pub String);

impl fmt::Display for ApprovalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an inbound request came from, so the requester can be signalled later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRef {
    pub channel_id: String,
    pub message_id: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator an adapter stands in for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Resolver,
    MediaSource,
    Tagger,
    Transport,
}

/// Structured metadata extracted from a free-text request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub refined_query: String,
    pub artist: Option<String>,
    pub song: Option<String>,
    pub album: String,
}

impl Resolution {
    /// The degraded-mode resolution: pass-through query, no artist or song,
    /// default album.
    pub fn passthrough(query: &str) -> Self {
        Self {
            refined_query: query.to_string(),
            artist: None,
            song: None,
            album: DEFAULT_ALBUM.to_string(),
        }
    }
}

/// A persisted music request and its full lifecycle record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub requester_id: String,
    pub requester_name: String,
    pub original_query: String,
    pub origin: Option<OriginRef>,
    pub refined_query: Option<String>,
    pub artist: Option<String>,
    pub song: Option<String>,
    pub album: String,
    pub status: RequestStatus,
    pub approval_ref: Option<ApprovalRef>,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
    pub file_path: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Request {
    /// The term handed to the media search: the refined query when present,
    /// otherwise what the requester typed.
    pub fn search_term(&self) -> &str {
        self.refined_query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(&self.original_query)
    }
}

/// Fields supplied by intake when creating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub requester_id: String,
    pub requester_name: String,
    pub original_query: String,
    pub origin: Option<OriginRef>,
    pub resolution: Resolution,
}

impl NewRequest {
    /// The album to persist: never empty.
    pub fn album(&self) -> &str {
        let album = self.resolution.album.trim();
        if album.is_empty() { DEFAULT_ALBUM } else { album }
    }
}

/// A conditional status change: applies only while the record is in `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

/// A partial update to a request record.
///
/// This is the only way records are mutated after creation. When `status` is
/// set, the write is a compare-and-set against the persisted status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestUpdate {
    pub status: Option<StatusChange>,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
    pub file_path: Option<String>,
    pub error_message: Option<String>,
}

impl RequestUpdate {
    /// A bare status transition.
    pub fn transition(from: RequestStatus, to: RequestStatus) -> Self {
        Self {
            status: Some(StatusChange { from, to }),
            ..Self::default()
        }
    }

    /// Record the search hit chosen for the download.
    pub fn source(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source_url: Some(url.into()),
            source_title: Some(title.into()),
            ..Self::default()
        }
    }

    /// `downloading -> complete` together with the final file path.
    pub fn complete(file_path: impl Into<String>) -> Self {
        Self {
            file_path: Some(file_path.into()),
            ..Self::transition(RequestStatus::Downloading, RequestStatus::Complete)
        }
    }

    /// `downloading -> failed` together with a human-readable cause.
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            error_message: Some(error_message.into()),
            ..Self::transition(RequestStatus::Downloading, RequestStatus::Failed)
        }
    }

    /// Whether this update carries no changes at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What a moderator gesture asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Approve,
    Reject,
}

/// An approve/reject gesture on an approval surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub kind: SignalKind,
    pub actor_roles: Vec<String>,
    pub approval_ref: ApprovalRef,
}

/// A command-style request from an end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeRequest {
    pub requester_id: String,
    pub requester_name: String,
    pub query: String,
    pub origin: Option<OriginRef>,
}

/// The decision a requester is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Decision {
    Approved,
    Rejected,
}

/// What the moderation surface should currently show for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceStage {
    Pending,
    Downloading,
    Complete,
    Failed(String),
    Rejected,
}

/// A media index hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
}

/// Tags the fetch tool writes into the encoded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOverrides {
    pub artist: String,
    pub title: String,
    pub album: String,
}

/// One fetch-and-encode invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Output path with the extension left as the `%(ext)s` placeholder.
    pub output_template: PathBuf,
    pub target_format: String,
    pub metadata: MetadataOverrides,
}

/// Result of a fetch: the path the tool reports, if it reports one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchOutcome {
    pub file_path: Option<PathBuf>,
}
