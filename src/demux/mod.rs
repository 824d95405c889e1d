//! Output demultiplexing.
//!
//! A shell session has a single output stream shared by every command it
//! runs. After each command the session asks the shell to print a unique
//! marker followed by `$?`; this module recognizes those sentinels, splits
//! the stream into per-command output and extracts exit codes.

mod demultiplexer;
mod marker;

pub use demultiplexer::{Demultiplexer, Demuxed};
pub use marker::{Marker, SentinelMatch};
