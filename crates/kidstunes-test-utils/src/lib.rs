// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for KidsTunes integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without Discord, yt-dlp or beets.
//!
//! # Components
//!
//! - [`MockSearch`], [`MockFetcher`], [`MockTagTool`] - media collaborators
//! - [`RecordingNotifier`] - captures requester and surface notifications
//! - [`CountingLauncher`] - counts pipeline launches without running them
//! - [`StubResolverBackend`] - canned resolver answers
//! - [`TestHarness`] - the real engine wired over a temp SQLite database

pub mod harness;
pub mod mock_media;
pub mod mock_transport;

pub use harness::{MODERATOR_ROLE, TestHarness};
pub use mock_media::{FetchBehavior, MOCK_AUDIO, MockFetcher, MockSearch, MockTagTool, rendered_path};
pub use mock_transport::{CountingLauncher, RecordingNotifier, StubResolverBackend};
