//! PTY (Pseudo-Terminal) layer.
//!
//! Shells are run inside a pseudo-terminal so that output and errors share
//! one ordered stream and escalation brokers such as `su` see a terminal.

mod io;
mod native;

pub use io::{PtyReader, PtyWriter, ReadEnd, READ_BUFFER_SIZE};
pub use native::{
    exit_code_of, resolve_program, NativePty, ShellProcess, DEFAULT_ESCALATION, DEFAULT_SHELL,
};

/// Size of a PTY in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtySize {
    /// Number of rows (height).
    pub rows: u16,
    /// Number of columns (width).
    pub cols: u16,
}

impl PtySize {
    /// Create a new PtySize with the given dimensions.
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for PtySize {
    fn default() -> Self {
        // Wide enough that the shell never wraps long output lines itself
        Self {
            rows: 24,
            cols: 4096,
        }
    }
}
