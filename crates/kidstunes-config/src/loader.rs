// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./kidstunes.toml` > `~/.config/kidstunes/kidstunes.toml`
//! > `/etc/kidstunes/kidstunes.toml` with environment variable overrides via the
//! `KIDSTUNES_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KidsTunesConfig;

/// Config sections that env var names are mapped onto.
const SECTIONS: &[&str] = &["discord", "paths", "ytdlp", "resolver", "beets", "logging"];

const SYSTEM_CONFIG: &str = "/etc/kidstunes/kidstunes.toml";
const LOCAL_CONFIG: &str = "kidstunes.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/kidstunes/kidstunes.toml` (system-wide)
/// 3. `~/.config/kidstunes/kidstunes.toml` (user XDG config)
/// 4. `./kidstunes.toml` (local directory)
/// 5. `KIDSTUNES_*` environment variables
pub fn load_config() -> Result<KidsTunesConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing.
pub fn load_config_from_str(toml_content: &str) -> Result<KidsTunesConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KidsTunesConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KidsTunesConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KidsTunesConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchical config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KidsTunesConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Every file the hierarchy consults, most general first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG)];
    paths.extend(user_config_path());
    paths.push(PathBuf::from(LOCAL_CONFIG));
    paths
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kidstunes/kidstunes.toml"))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` so underscore-containing key names
/// survive: `KIDSTUNES_DISCORD_REQUEST_CHANNEL_ID` must map to
/// `discord.request_channel_id`, not `discord.request.channel.id`.
fn env_provider() -> Env {
    Env::prefixed("KIDSTUNES_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config key.
///
/// Only a leading section name is rewritten; anything else is left untouched
/// and will be rejected by `deny_unknown_fields`.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
