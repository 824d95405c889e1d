//! Completion markers injected into the shell's output.

use std::fmt;

use crate::command::CommandId;
use crate::session::SessionId;

const PREFIX: &str = "__SHQ_";

/// A session-unique token that delimits one command's output.
///
/// The shell is asked to print the marker followed by `$?` after each
/// command. The token is written in two quoted halves so that a terminal
/// echo of the input line never contains it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    text: String,
}

/// A marker occurrence found in an output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelMatch<'a> {
    /// Output that preceded the marker on the same line.
    pub prefix: &'a str,
    /// Parsed exit code, or `None` if the tail was not `\s+-?\d+`.
    pub exit_code: Option<i32>,
}

impl Marker {
    /// Marker closing command `command` in session `session`.
    pub fn for_command(session: SessionId, command: CommandId) -> Self {
        Self {
            text: format!("{}{:08x}_{}__", PREFIX, session.as_u64(), command.as_u64()),
        }
    }

    /// Marker printed once the startup preamble has run.
    pub fn ready(session: SessionId) -> Self {
        Self {
            text: format!("{}{:08x}_READY__", PREFIX, session.as_u64()),
        }
    }

    /// The literal token.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn quoted(&self) -> String {
        let (head, tail) = self.text.split_at(3);
        format!("\"{}\"\"{}\"", head, tail)
    }

    /// Shell statement printing the bare marker.
    pub fn echo_command(&self) -> String {
        format!("echo {}", self.quoted())
    }

    /// Shell statement printing the marker and the last exit status.
    pub fn sentinel_command(&self) -> String {
        format!("echo {} $?", self.quoted())
    }

    /// Check whether `line` ends with the bare marker.
    pub fn matches_bare(&self, line: &str) -> bool {
        line.trim_end().ends_with(&self.text)
    }

    /// Look for a sentinel (`<marker>\s+(-?\d+)`) in `line`.
    pub fn find_sentinel<'a>(&self, line: &'a str) -> Option<SentinelMatch<'a>> {
        let start = line.find(&self.text)?;
        let prefix = &line[..start];
        let tail = &line[start + self.text.len()..];

        Some(SentinelMatch {
            prefix,
            exit_code: parse_exit_code(tail),
        })
    }
}

fn parse_exit_code(tail: &str) -> Option<i32> {
    if !tail.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let value = tail.trim();
    let digits = value.strip_prefix('-').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
