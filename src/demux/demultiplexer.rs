//! Routing of output lines to the active command.

use tracing::{debug, trace};

use super::Marker;
use crate::error::ShellQueueError;

/// What a single output line means for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Demuxed {
    /// The startup handshake completed.
    Ready,
    /// An output line belonging to the active command.
    Output(String),
    /// The active command's marker arrived.
    Completed(Result<i32, ShellQueueError>),
    /// A line with nobody to receive it.
    Discarded(String),
}

#[derive(Debug, Clone)]
enum Phase {
    Handshake(Marker),
    Idle,
    Armed(Marker),
}

/// Line-level state machine splitting one shell stream into commands.
///
/// The demultiplexer knows nothing about the queue: the session arms it
/// with the marker of the command it just dispatched and acts on the
/// [`Demuxed`] values it returns.
#[derive(Debug)]
pub struct Demultiplexer {
    phase: Phase,
    stray_lines: u64,
}

impl Demultiplexer {
    /// Create a demultiplexer waiting for the `ready` handshake marker.
    pub fn new(ready: Marker) -> Self {
        Self {
            phase: Phase::Handshake(ready),
            stray_lines: 0,
        }
    }

    /// Check whether the handshake has been seen.
    pub fn is_ready(&self) -> bool {
        !matches!(self.phase, Phase::Handshake(_))
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        matches!(self.phase, Phase::Armed(_))
    }

    /// Expect `marker` to close the next command.
    pub fn arm(&mut self, marker: Marker) {
        trace!(marker = %marker, "demux armed");
        self.phase = Phase::Armed(marker);
    }

    /// Stop routing lines, e.g. after the session closed.
    pub fn disarm(&mut self) {
        if self.is_ready() {
            self.phase = Phase::Idle;
        }
    }

    /// Number of lines that arrived with no active command.
    pub fn stray_lines(&self) -> u64 {
        self.stray_lines
    }

    /// Classify one line.
    pub fn feed(&mut self, line: String) -> Vec<Demuxed> {
        match &self.phase {
            Phase::Handshake(ready) => {
                if ready.matches_bare(&line) {
                    debug!("shell handshake complete");
                    self.phase = Phase::Idle;
                    vec![Demuxed::Ready]
                } else {
                    trace!(line = %line, "discarding startup output");
                    vec![Demuxed::Discarded(line)]
                }
            }
            Phase::Idle => {
                self.stray_lines += 1;
                debug!(line = %line, "discarding line with no active command");
                vec![Demuxed::Discarded(line)]
            }
            Phase::Armed(marker) => {
                let found = marker
                    .find_sentinel(&line)
                    .map(|m| (m.prefix.to_string(), m.exit_code));
                let Some((prefix, exit_code)) = found else {
                    return vec![Demuxed::Output(line)];
                };

                let mut events = Vec::with_capacity(2);
                if !prefix.is_empty() {
                    events.push(Demuxed::Output(prefix));
                }
                events.push(Demuxed::Completed(
                    exit_code.ok_or(ShellQueueError::MalformedSentinel(line)),
                ));
                self.phase = Phase::Idle;
                events
            }
        }
    }
}
