// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Library layout: `<root>/<artist>/<album>/<song>.<format>`.

use std::path::{Path, PathBuf};

use kidstunes_core::DEFAULT_ALBUM;
use kidstunes_core::types::MetadataOverrides;

use crate::sanitize::sanitize_name;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_SONG: &str = "Unknown Song";

/// Where one track lives in the library, and the tags it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLayout {
    artist: String,
    album: String,
    song: String,
}

fn or_default(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

impl TrackLayout {
    /// Apply defaults for missing or blank metadata.
    pub fn new(artist: Option<&str>, album: Option<&str>, song: Option<&str>) -> Self {
        Self {
            artist: or_default(artist, UNKNOWN_ARTIST),
            album: or_default(album, DEFAULT_ALBUM),
            song: or_default(song, UNKNOWN_SONG),
        }
    }

    /// Tags written into the encoded file. These keep the original spelling.
    pub fn metadata(&self) -> MetadataOverrides {
        MetadataOverrides {
            artist: self.artist.clone(),
            title: self.song.clone(),
            album: self.album.clone(),
        }
    }

    /// Directory holding the track.
    pub fn target_dir(&self, root: &Path) -> PathBuf {
        root.join(component(&self.artist, UNKNOWN_ARTIST))
            .join(component(&self.album, DEFAULT_ALBUM))
    }

    fn file_stem(&self) -> String {
        component(&self.song, UNKNOWN_SONG)
    }

    /// Final path of the encoded file.
    pub fn target_path(&self, root: &Path, format: &str) -> PathBuf {
        self.target_dir(root)
            .join(format!("{}.{format}", self.file_stem()))
    }

    /// Output template handed to the fetch tool. The extension is left as the
    /// `%(ext)s` placeholder and literal `%` in the name is escaped.
    pub fn output_template(&self, root: &Path) -> PathBuf {
        let stem = self.file_stem().replace('%', "%%");
        self.target_dir(root).join(format!("{stem}.%(ext)s"))
    }
}

/// A sanitized component, falling back to the sanitized default if the name
/// sanitizes to nothing.
fn component(name: &str, default: &str) -> String {
    let sanitized = sanitize_name(name);
    if sanitized.is_empty() {
        sanitize_name(default)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_metadata_uses_defaults() {
        let layout = TrackLayout::new(None, None, None);
        assert_eq!(
            layout.target_path(Path::new("/out"), "mp3"),
            PathBuf::from("/out/Unknown Artist/Singles/Unknown Song.mp3")
        );
    }

    #[test]
    fn blank_metadata_counts_as_missing() {
        let layout = TrackLayout::new(Some("  "), Some(""), Some("\t"));
        assert_eq!(layout, TrackLayout::new(None, None, None));
    }

    #[test]
    fn components_are_sanitized_but_tags_are_not() {
        let layout = TrackLayout::new(
            Some("for KING + COUNTRY"),
            Some("A Drummer Boy Christmas"),
            Some("Little Drummer Boy"),
        );
        assert_eq!(
            layout.target_path(Path::new("/lib"), "mp3"),
            PathBuf::from("/lib/for KING _ COUNTRY/A Drummer Boy Christmas/Little Drummer Boy.mp3")
        );
        assert_eq!(layout.metadata().artist, "for KING + COUNTRY");
        assert_eq!(layout.metadata().title, "Little Drummer Boy");
    }

    #[test]
    fn traversal_names_stay_inside_root() {
        let layout = TrackLayout::new(Some(".."), Some("../.."), Some("/etc/passwd"));
        let path = layout.target_path(Path::new("/lib"), "mp3");
        assert_eq!(path, PathBuf::from("/lib/__/.._../_etc_passwd.mp3"));
        assert!(path.starts_with("/lib"));
        assert_eq!(path.components().count(), 5);
    }

    #[test]
    fn output_template_escapes_percent() {
        let layout = TrackLayout::new(Some("A"), None, Some("100% Love"));
        assert_eq!(
            layout.output_template(Path::new("/lib")),
            PathBuf::from("/lib/A/Singles/100%% Love.%(ext)s")
        );
    }
}
