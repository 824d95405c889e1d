//! Shell sessions.
//!
//! A [`Session`] owns one interactive shell process and a FIFO queue of
//! commands. Commands are written to the shell one at a time; the reader
//! thread splits the shell's single output stream back into per-command
//! results using the markers from [`crate::demux`].

mod config;
mod id;
#[allow(clippy::module_inception)]
mod session;
mod startup;
mod state;
mod stats;

pub use config::{SessionConfig, DEFAULT_STARTUP_TIMEOUT};
pub use id::SessionId;
pub use session::Session;
pub use startup::shell_quote;
pub use state::SessionState;
pub use stats::SessionStats;
