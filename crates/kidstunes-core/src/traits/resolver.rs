// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metadata resolution backend trait.

use async_trait::async_trait;

use crate::error::KidsTunesError;
use crate::traits::adapter::PluginAdapter;

/// A service that turns a free-text music request into a structured answer.
///
/// The backend returns the raw response text; interpreting it (and falling
/// back when it is not the expected JSON) is the resolver's job.
#[async_trait]
pub trait ResolverBackend: PluginAdapter {
    /// Sends `query` with the fixed extraction instructions and returns the
    /// raw response content.
    async fn refine(&self, query: &str) -> Result<String, KidsTunesError>;
}
