// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for KidsTunes.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and the [`RequestStore`] contract
//! implemented over one `requests` table.
//!
//! [`RequestStore`]: kidstunes_core::RequestStore

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteRequestStore;
pub use database::Database;
pub use models::*;
