// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort removal of partially written downloads.
//!
//! The fetch tool does not write straight to the target. It downloads
//! `<stem>.<source-ext>.part`, renames it to `<stem>.<source-ext>`, and the
//! audio conversion then goes through `<stem>.temp.<format>` before the final
//! `<stem>.<format>` appears. A failure can strand any of these, so cleanup
//! sweeps the target's directory for every name the tool derives from the
//! target's stem.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

/// Extensions the fetch tool may download or convert through.
const MEDIA_EXTENSIONS: &[&str] = &[
    "aac", "alac", "flac", "m4a", "mka", "mkv", "mp3", "mp4", "oga", "ogg", "opus", "vorbis",
    "wav", "webm",
];

/// Suffixes the fetch tool appends to files it is still working on.
const WORK_SUFFIXES: &[&str] = &["part", "ytdl", "temp"];

/// Remove `target` and every intermediate file the fetch tool derives from it.
///
/// Only regular files named `<stem>.<…>` with recognized media or work-file
/// segments are touched, so `Song.Remix.mp3` or `Song 2.mp3` next to
/// `Song.mp3` survive. Missing files are fine. Any other failure is logged and
/// swallowed so it never masks the error that triggered the cleanup. Returns
/// the number of files actually removed.
pub async fn remove_partial_files(target: &Path) -> usize {
    let (Some(dir), Some(stem)) = (target.parent(), target.file_stem().and_then(|s| s.to_str()))
    else {
        return 0;
    };
    let format = target.extension().and_then(|e| e.to_str()).unwrap_or_default();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to scan for partial downloads");
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to scan for partial downloads");
                break;
            }
        };
        let name = entry.file_name();
        if !name.to_str().is_some_and(|name| is_leftover(name, stem, format)) {
            continue;
        }

        let path = entry.path();
        if entry.file_type().await.is_ok_and(|kind| kind.is_dir()) {
            warn!(path = %path.display(), "directory in the way of a download, left in place");
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed partial download");
                removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove partial download");
            }
        }
    }
    removed
}

/// Whether `name` is one of the files the fetch tool writes for a target
/// whose file stem is `stem` and whose extension is `format`.
pub fn is_leftover(name: &str, stem: &str, format: &str) -> bool {
    let Some(rest) = name.strip_prefix(stem).and_then(|r| r.strip_prefix('.')) else {
        return false;
    };
    let mut segments = rest.split('.');
    let first_ok = segments
        .next()
        .is_some_and(|first| first == "temp" || is_media(first, format) || is_format_id(first));
    first_ok
        && segments.all(|segment| {
            is_media(segment, format)
                || WORK_SUFFIXES.contains(&segment)
                || is_format_id(segment)
                || segment.starts_with("part-Frag")
        })
}

fn is_media(segment: &str, format: &str) -> bool {
    let segment = segment.to_ascii_lowercase();
    (!format.is_empty() && segment == format.to_ascii_lowercase())
        || MEDIA_EXTENSIONS.contains(&segment.as_str())
}

/// Per-stream names such as `f251` used when formats are merged.
fn is_format_id(segment: &str) -> bool {
    segment
        .strip_prefix('f')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"partial").unwrap();
    }

    #[tokio::test]
    async fn removes_target_and_part_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("Song.mp3");
        touch(dir.path(), "Song.mp3");
        touch(dir.path(), "Song.mp3.part");

        assert_eq!(remove_partial_files(&target).await, 2);
        assert!(!target.exists());
        assert!(!dir.path().join("Song.mp3.part").exists());
    }

    #[tokio::test]
    async fn removes_source_download_and_conversion_files() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("Song.mp3");
        for name in [
            "Song.webm.part",
            "Song.webm",
            "Song.webm.ytdl",
            "Song.temp.mp3",
            "Song.f251.webm.part",
            "Song.webm.part-Frag3",
        ] {
            touch(dir.path(), name);
        }
        for name in ["Song Two.mp3", "Song.Remix.mp3", "Other.mp3", "Songbook.webm"] {
            touch(dir.path(), name);
        }

        assert_eq!(remove_partial_files(&target).await, 6);
        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["Other.mp3", "Song Two.mp3", "Song.Remix.mp3", "Songbook.webm"]);
    }

    #[tokio::test]
    async fn stems_with_dots_are_matched_whole() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("Mr. Blue Sky.opus");
        touch(dir.path(), "Mr. Blue Sky.webm.part");
        touch(dir.path(), "Mr. Blue.opus");

        assert_eq!(remove_partial_files(&target).await, 1);
        assert!(dir.path().join("Mr. Blue.opus").exists());
    }

    #[tokio::test]
    async fn missing_files_are_not_an_error() {
        let dir = tempdir().unwrap();
        assert_eq!(remove_partial_files(&dir.path().join("nothing.mp3")).await, 0);
        assert_eq!(remove_partial_files(&dir.path().join("gone/nothing.mp3")).await, 0);
    }

    #[tokio::test]
    async fn directory_in_the_way_is_logged_not_raised() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("Song.mp3");
        std::fs::create_dir(&target).unwrap();
        assert_eq!(remove_partial_files(&target).await, 0);
        assert!(target.exists());
    }

    #[test]
    fn leftover_names() {
        assert!(is_leftover("Song.mp3", "Song", "mp3"));
        assert!(is_leftover("Song.MP3.part", "Song", "mp3"));
        assert!(is_leftover("Song.m4a.ytdl", "Song", "mp3"));
        assert!(!is_leftover("Song", "Song", "mp3"));
        assert!(!is_leftover("Song.", "Song", "mp3"));
        assert!(!is_leftover("Song.txt", "Song", "mp3"));
        assert!(!is_leftover("Song.jpg.part", "Song", "mp3"));
        assert!(!is_leftover("Song.Live.webm", "Song", "mp3"));
    }
}
