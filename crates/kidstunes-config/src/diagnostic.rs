// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich diagnostics for configuration errors.
//!
//! Figment reports unknown keys, missing keys and type mismatches; each is
//! turned into a [`ConfigError`] that miette renders with the offending line
//! of `kidstunes.toml` and, for typos, the closest valid key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key needs before it is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section of the config declares.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(kidstunes::config::unknown_key),
        help("{}", unknown_key_help(section.as_deref(), suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Section the key was found in, `None` at the top level.
        section: Option<String>,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(kidstunes::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `resolver.timeout_secs`.
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(kidstunes::config::missing_key),
        help("add `{key} = <value>` to your kidstunes.toml")
    )]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(kidstunes::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(kidstunes::config::other))]
    Other(String),
}

fn unknown_key_help(section: Option<&str>, suggestion: Option<&str>, valid_keys: &str) -> String {
    let scope = match section {
        Some(section) => format!("keys allowed in [{section}]"),
        None => "valid sections".to_string(),
    };
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {scope}: {valid_keys}"),
        None => format!("{scope}: {valid_keys}"),
    }
}

/// A key located inside one of the loaded TOML files.
struct Located {
    span: SourceSpan,
    source: NamedSource<String>,
}

/// Convert every error figment collected into a diagnostic.
///
/// `toml_sources` holds `(path, content)` pairs for the files that were
/// loaded, so unknown keys can be pointed at in place.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, toml_sources))
        .collect()
}

fn convert(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let located = locate(error, field, toml_sources);
            let (span, src) = match located {
                Some(Located { span, source }) => (Some(span), Some(source)),
                None => (None, None),
            };
            ConfigError::UnknownKey {
                key: field.clone(),
                section: error.path.first().cloned(),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => {
            let key = if error.path.is_empty() {
                field.to_string()
            } else {
                format!("{}.{field}", error.path.join("."))
            };
            ConfigError::MissingKey { key }
        }
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: error.path.join("."),
            detail: format!("found {actual}, expected {expected}"),
            expected: expected.clone(),
            span: None,
            src: None,
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Find `field` in the file figment says the error came from.
fn locate(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<Located> {
    let figment::Source::File(origin) = error.metadata.as_ref()?.source.as_ref()? else {
        return None;
    };
    let origin = origin.display().to_string();
    let (path, content) = toml_sources.iter().find(|(path, _)| *path == origin)?;

    let offset = find_key_offset(content, &error.path, field)?;
    Some(Located {
        span: SourceSpan::new(offset.into(), field.len()),
        source: NamedSource::new(path, content.clone()),
    })
}

/// Byte offset of `field` as a key line inside the section named by
/// `path[0]`, or anywhere from the top when `path` is empty.
///
/// The search stops at the next section header, so a key of the same name in
/// a later section is never reported.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let mut in_scope = path.is_empty();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            if let Some(section) = path.first() {
                in_scope = trimmed.trim_end() == format!("[{section}]");
            }
        } else if in_scope && is_key_line(trimmed, field) {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

fn is_key_line(trimmed: &str, field: &str) -> bool {
    trimmed
        .strip_prefix(field)
        .is_some_and(|rest| rest.starts_with([' ', '\t', '=']))
}

/// Closest valid key by Jaro-Winkler similarity, if any clears the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_tokne_for_token() {
        let valid = &[
            "token",
            "request_channel_id",
            "approval_channel_id",
            "moderator_role_id",
            "command_prefix",
        ];
        assert_eq!(suggest_key("tokne", valid), Some("token".to_string()));
    }

    #[test]
    fn suggest_audio_fromat_for_audio_format() {
        let valid = &["binary", "audio_format", "audio_quality", "search_prefix"];
        assert_eq!(
            suggest_key("audio_fromat", valid),
            Some("audio_format".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["enabled", "binary", "library_path", "music_directory"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[paths]\noutput_dir = \"music\"\n\n[ytdlp]\nbinay = \"yt-dlp\"\n";
        let path = vec!["ytdlp".to_string()];
        let o = find_key_offset(content, &path, "binay").unwrap();
        assert_eq!(&content[o..o + 5], "binay");
    }

    #[test]
    fn find_key_offset_ignores_other_sections() {
        let content = "[paths]\ndatabase = \"a.db\"\n";
        let path = vec!["ytdlp".to_string()];
        assert_eq!(find_key_offset(content, &path, "database"), None);

        // Same key name in a later section does not match.
        let content = "[beets]\n[ytdlp]\nbinary = \"y\"\n";
        let path = vec!["beets".to_string()];
        assert_eq!(find_key_offset(content, &path, "binary"), None);
    }

    #[test]
    fn find_key_offset_handles_indentation() {
        let content = "[beets]\n  library_pth = \"x\"\n";
        let path = vec!["beets".to_string()];
        let o = find_key_offset(content, &path, "library_pth").unwrap();
        assert_eq!(o, "[beets]\n  ".len());
    }

    #[test]
    fn unknown_key_help_names_the_section() {
        let help = unknown_key_help(Some("discord"), Some("token"), "token, command_prefix");
        assert_eq!(
            help,
            "did you mean `token`? keys allowed in [discord]: token, command_prefix"
        );
        assert_eq!(
            unknown_key_help(None, None, "paths, ytdlp"),
            "valid sections: paths, ytdlp"
        );
    }
}
