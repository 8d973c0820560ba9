// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for KidsTunes.

use thiserror::Error;

/// The primary error type used across all KidsTunes adapter traits and core operations.
///
/// Only [`Storage`](KidsTunesError::Storage) and [`Internal`](KidsTunesError::Internal)
/// are fatal; every other variant is absorbed somewhere in the engine (fallback,
/// `failed` state, or a silent drop).
#[derive(Debug, Error)]
pub enum KidsTunesError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Request store errors (database unavailable, query failure, bad row).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Metadata resolution backend unavailable or returned garbage.
    #[error("resolver error: {message}")]
    Resolver {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Search or fetch failure. Terminal for the current download attempt.
    #[error("download error: {message}")]
    Download {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Post-processing (tagging) failure. Never changes a terminal state.
    #[error("tagging error: {message}")]
    Tagging {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chat transport failure (send, edit, react).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The acting user lacks the moderator role.
    #[error("actor is not authorized")]
    Unauthorized,

    /// A signal or command referenced a record that does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// An inbound request was malformed (e.g. an empty query).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The operation was abandoned because the process is shutting down.
    #[error("cancelled")]
    Cancelled,

    /// Internal or unexpected errors, including contract violations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KidsTunesError {
    /// Shorthand for a [`Download`](KidsTunesError::Download) error without a source.
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`Tagging`](KidsTunesError::Tagging) error without a source.
    pub fn tagging(message: impl Into<String>) -> Self {
        Self::Tagging {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error must escalate to the operator instead of being absorbed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Internal(_))
    }
}
