// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Download pipeline for approved requests.
//!
//! [`DownloadJobRunner`] drives one request through search, fetch, finalize
//! and the optional tagging pass. The external tools sit behind the
//! `MediaSearch`, `MediaFetcher` and `TagTool` traits; [`YtDlp`] and
//! [`BeetsTagTool`] are the subprocess-backed implementations.

pub mod beets;
pub mod cleanup;
pub mod layout;
pub mod runner;
pub mod sanitize;
pub mod ytdlp;

pub use beets::{BeetsSettings, BeetsTagTool};
pub use cleanup::remove_partial_files;
pub use layout::TrackLayout;
pub use runner::{DownloadJob, DownloadJobRunner, RunnerSettings, failure_message};
pub use sanitize::sanitize_name;
pub use ytdlp::{YtDlp, YtDlpSettings};
