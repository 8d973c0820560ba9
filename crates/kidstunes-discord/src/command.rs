// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prefix command parsing.

/// A recognized text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!request <query>`; the query may be empty.
    Request(String),
    /// `!retry <id>`; `None` when the id is not a number.
    Retry(Option<i64>),
}

/// Parse `content` as a command under `prefix`.
///
/// Command names are case-sensitive and must be followed by whitespace or
/// the end of the message, so `!requests` is not `!request`.
pub fn parse_command(content: &str, prefix: &str) -> Option<Command> {
    let body = content.trim_start().strip_prefix(prefix)?;
    let (name, rest) = match body.find(char::is_whitespace) {
        Some(at) => (&body[..at], body[at..].trim()),
        None => (body, ""),
    };
    match name {
        "request" => Some(Command::Request(rest.to_string())),
        "retry" => {
            let id = rest
                .split_whitespace()
                .next()
                .and_then(|arg| arg.trim_start_matches('#').parse::<i64>().ok());
            Some(Command::Retry(id))
        }
        _ => None,
    }
}
