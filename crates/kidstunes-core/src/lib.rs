// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for KidsTunes.
//!
//! This crate provides the request lifecycle, the error taxonomy, the domain
//! types, and the adapter traits for every external collaborator (store,
//! resolver backend, media source, tagger, chat transport).

pub mod error;
pub mod lifecycle;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KidsTunesError;
pub use lifecycle::RequestStatus;
pub use types::{
    AdapterType, ApprovalRef, DEFAULT_ALBUM, HealthStatus, NewRequest, OriginRef, Request,
    RequestId, RequestUpdate, Resolution,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    MediaFetcher, MediaSearch, Notifier, PluginAdapter, RequestStore, ResolverBackend, TagTool,
};
