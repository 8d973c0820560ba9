// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media index, fetch, and tagging collaborator traits.

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::KidsTunesError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{FetchOutcome, FetchRequest, SearchHit};

/// Looks up a search term in the external media index.
#[async_trait]
pub trait MediaSearch: PluginAdapter {
    /// Returns the first match, or `None` when the index has no results.
    async fn search(&self, term: &str) -> Result<Option<SearchHit>, KidsTunesError>;
}

/// Downloads and encodes one media item into the library.
///
/// When `cancel` fires, implementations stop the underlying tool and wait for
/// it to exit before returning [`KidsTunesError::Cancelled`], so the caller's
/// cleanup never races a writer. Dropping the future must also stop work.
#[async_trait]
pub trait MediaFetcher: PluginAdapter {
    async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, KidsTunesError>;
}

/// Optional post-processing pass over a finished library file.
#[async_trait]
pub trait TagTool: PluginAdapter {
    async fn apply(&self, path: &Path) -> Result<(), KidsTunesError>;
}
