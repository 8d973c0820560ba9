// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, the resolver time bound, and known log levels.

use crate::diagnostic::ConfigError;
use crate::model::KidsTunesConfig;

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Hard upper bound for one resolver call, in seconds.
pub const MAX_RESOLVER_TIMEOUT_SECS: u64 = 10;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KidsTunesConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    for (key, value) in [
        ("paths.output_dir", &config.paths.output_dir),
        ("paths.database", &config.paths.database),
        ("ytdlp.binary", &config.ytdlp.binary),
        ("ytdlp.audio_format", &config.ytdlp.audio_format),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    }

    // The format doubles as a file extension.
    let format = config.ytdlp.audio_format.trim();
    if !format.is_empty() && !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "ytdlp.audio_format `{format}` must be a single alphanumeric token such as `mp3`"
            ),
        });
    }

    let timeout = config.resolver.timeout_secs;
    if !(1..=MAX_RESOLVER_TIMEOUT_SECS).contains(&timeout) {
        errors.push(ConfigError::Validation {
            message: format!(
                "resolver.timeout_secs must be between 1 and {MAX_RESOLVER_TIMEOUT_SECS}, got {timeout}"
            ),
        });
    }

    if config.resolver.is_enabled() {
        let endpoint = config.resolver.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            errors.push(ConfigError::Validation {
                message: format!("resolver.endpoint `{endpoint}` must be an http(s) URL"),
            });
        }
        if config.resolver.model.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "resolver.model must not be empty when an api_key is set".to_string(),
            });
        }
    }

    if config.beets.enabled && config.beets.binary.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "beets.binary must not be empty when beets is enabled".to_string(),
        });
    }

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Extra checks for running the bot: the Discord identity must be complete.
pub fn validate_for_serve(config: &KidsTunesConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = match validate_config(config) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if config
        .discord
        .token
        .as_deref()
        .is_none_or(|t| t.trim().is_empty())
    {
        errors.push(ConfigError::MissingKey {
            key: "discord.token".to_string(),
        });
    }

    for (key, value) in [
        ("discord.request_channel_id", config.discord.request_channel_id),
        ("discord.approval_channel_id", config.discord.approval_channel_id),
        ("discord.moderator_role_id", config.discord.moderator_role_id),
    ] {
        if value == 0 {
            errors.push(ConfigError::MissingKey {
                key: key.to_string(),
            });
        }
    }

    if config.discord.command_prefix.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "discord.command_prefix must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        let config = KidsTunesConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_output_dir_fails_validation() {
        let mut config = KidsTunesConfig::default();
        config.paths.output_dir = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("paths.output_dir"))));
    }

    #[test]
    fn resolver_timeout_is_bounded() {
        let mut config = KidsTunesConfig::default();
        config.resolver.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
        config.resolver.timeout_secs = 11;
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("resolver.timeout_secs"));
        config.resolver.timeout_secs = 10;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn audio_format_must_be_path_safe() {
        let mut config = KidsTunesConfig::default();
        config.ytdlp.audio_format = "../mp3".to_string();
        assert!(validate_config(&config).is_err());
        config.ytdlp.audio_format = "opus".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn endpoint_checked_only_when_resolver_enabled() {
        let mut config = KidsTunesConfig::default();
        config.resolver.endpoint = "ftp://example".to_string();
        assert!(validate_config(&config).is_ok());
        config.resolver.api_key = Some("key".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("resolver.endpoint")));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = KidsTunesConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = KidsTunesConfig::default();
        config.paths.database = String::new();
        config.resolver.timeout_secs = 60;
        config.logging.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn serve_requires_discord_identity() {
        let config = KidsTunesConfig::default();
        let errors = validate_for_serve(&config).unwrap_err();
        let keys: Vec<String> = errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::MissingKey { key } => Some(key.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                "discord.token",
                "discord.request_channel_id",
                "discord.approval_channel_id",
                "discord.moderator_role_id",
            ]
        );
    }

    #[test]
    fn complete_discord_section_passes_serve_checks() {
        let mut config = KidsTunesConfig::default();
        config.discord.token = Some("token".to_string());
        config.discord.request_channel_id = 1;
        config.discord.approval_channel_id = 2;
        config.discord.moderator_role_id = 3;
        assert!(validate_for_serve(&config).is_ok());
    }
}
