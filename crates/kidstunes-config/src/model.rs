// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for KidsTunes.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level KidsTunes configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KidsTunesConfig {
    /// Discord bot settings.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Library and database locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Media search and download tool settings.
    #[serde(default)]
    pub ytdlp: YtDlpConfig,

    /// Metadata resolution backend settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Optional tagging pass settings.
    #[serde(default)]
    pub beets: BeetsConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordConfig {
    /// Bot token. Required by `serve`.
    #[serde(default)]
    pub token: Option<String>,

    /// Channel where `!request` is accepted.
    #[serde(default)]
    pub request_channel_id: u64,

    /// Channel where moderation embeds are posted and reacted to.
    #[serde(default)]
    pub approval_channel_id: u64,

    /// Role a member needs to approve, reject, or retry.
    #[serde(default)]
    pub moderator_role_id: u64,

    /// Prefix for text commands.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            request_channel_id: 0,
            approval_channel_id: 0,
            moderator_role_id: 0,
            command_prefix: default_command_prefix(),
        }
    }
}

fn default_command_prefix() -> String {
    "!".to_string()
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Root of the music library.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Path to the SQLite database file.
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            database: default_database(),
        }
    }
}

fn default_output_dir() -> String {
    "music".to_string()
}

fn default_database() -> String {
    "kidstunes.db".to_string()
}

/// `yt-dlp` invocation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct YtDlpConfig {
    /// Binary name or path.
    #[serde(default = "default_ytdlp_binary")]
    pub binary: String,

    /// Audio codec the download is encoded to; also the file extension.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Encoder quality passed through to the post-processor.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Search prefix that returns exactly one result.
    #[serde(default = "default_search_prefix")]
    pub search_prefix: String,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: default_ytdlp_binary(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            search_prefix: default_search_prefix(),
        }
    }
}

fn default_ytdlp_binary() -> String {
    "yt-dlp".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192".to_string()
}

fn default_search_prefix() -> String {
    "ytsearch1:".to_string()
}

/// Metadata resolution backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// API key. `None` disables the backend and every request passes through.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat model used for extraction.
    #[serde(default = "default_resolver_model")]
    pub model: String,

    /// Chat-completions endpoint.
    #[serde(default = "default_resolver_endpoint")]
    pub endpoint: String,

    /// Upper bound for one resolution call.
    #[serde(default = "default_resolver_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_resolver_model(),
            endpoint: default_resolver_endpoint(),
            timeout_secs: default_resolver_timeout_secs(),
        }
    }
}

impl ResolverConfig {
    /// Whether a backend should be constructed at all.
    pub fn is_enabled(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

fn default_resolver_model() -> String {
    "grok-3-mini".to_string()
}

fn default_resolver_endpoint() -> String {
    "https://api.x.ai/v1/chat/completions".to_string()
}

fn default_resolver_timeout_secs() -> u64 {
    10
}

/// Tagging pass configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BeetsConfig {
    /// Run `beet move` after each completed download.
    #[serde(default)]
    pub enabled: bool,

    /// Binary name or path.
    #[serde(default = "default_beets_binary")]
    pub binary: String,

    /// Beets library database; its directory becomes `BEETSDIR`.
    #[serde(default = "default_beets_library_path")]
    pub library_path: String,

    /// Working directory for the tagger. Falls back to `paths.output_dir`.
    #[serde(default)]
    pub music_directory: Option<String>,
}

impl Default for BeetsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            binary: default_beets_binary(),
            library_path: default_beets_library_path(),
            music_directory: None,
        }
    }
}

fn default_beets_binary() -> String {
    "beet".to_string()
}

fn default_beets_library_path() -> String {
    "/tmp/beets_library.db".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl KidsTunesConfig {
    /// Working directory handed to the tagger.
    pub fn beets_music_directory(&self) -> PathBuf {
        PathBuf::from(
            self.beets
                .music_directory
                .as_deref()
                .unwrap_or(&self.paths.output_dir),
        )
    }
}
