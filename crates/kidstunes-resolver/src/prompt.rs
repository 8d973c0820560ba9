// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed extraction instructions sent with every resolution call.

/// Build the user message for `query`.
pub fn build_prompt(query: &str) -> String {
    format!(
        r#"A child asked for this song: "{query}"

Identify the song and answer with metadata for a music library.
Rules:
- "artist" is the primary artist or band only. Leave out featured artists and collaborators.
- "song" is the canonical title. Strip video-platform boilerplate such as "Official Video",
  "Official Music Video", "Lyric Video", "Audio" or "Live", any "Artist - " prefix,
  "(feat. ...)" or "[feat. ...]" annotations, and trailing label or publisher names.
- "album" is the album the song appears on. It is required and must never be null.
  Use "Singles" for a standalone single or when the album is unknown.
- "refined_search_term" is a video search query likely to find the official recording.

Examples:
"drummer boy king and country audio" ->
{{"artist": "for KING + COUNTRY", "song": "Little Drummer Boy", "album": "A Drummer Boy Christmas", "refined_search_term": "for KING + COUNTRY Little Drummer Boy Official Music Video"}}
"bohemian rhapsody queen live" ->
{{"artist": "Queen", "song": "Bohemian Rhapsody", "album": "A Night at the Opera", "refined_search_term": "Queen Bohemian Rhapsody Official Music Video"}}
"no fear we the kingdom" ->
{{"artist": "We The Kingdom", "song": "No Fear", "album": "Holy Water", "refined_search_term": "We The Kingdom No Fear Official Music Video"}}

Reply with the JSON object only, using exactly the keys "artist", "song", "album" and "refined_search_term"."#
    )
}
