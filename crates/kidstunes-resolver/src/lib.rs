// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metadata resolution for KidsTunes.
//!
//! [`MetadataResolver`] turns a free-text music request into a [`Resolution`]
//! and never fails: a missing backend, a transport error, a timeout, or a
//! malformed answer each degrade to a deterministic fallback.
//! [`XaiBackend`] is the chat-completions implementation of
//! [`ResolverBackend`].
//!
//! [`Resolution`]: kidstunes_core::Resolution
//! [`ResolverBackend`]: kidstunes_core::ResolverBackend

pub mod prompt;
pub mod resolver;
pub mod xai;

pub use resolver::{MAX_RESOLVE_TIMEOUT, MetadataResolver, parse_resolution};
pub use xai::XaiBackend;
