//! # shell-queue
//!
//! Persistent shell sessions with a serialized command queue.
//!
//! A [`Session`] keeps one shell process alive, optionally started through
//! an escalation broker such as `su`, and runs submitted [`Command`]s one at
//! a time in submission order. Each command is followed by a unique marker
//! echoed together with `$?`, which lets the session split the shell's
//! single output stream back into per-command output and exit codes.
//!
//! ## Features
//!
//! - **Persistent state**: working directory and variables carry over between commands
//! - **FIFO queue**: commands never interleave; callbacks fire in submission order
//! - **Root shells**: escalated sessions through a configurable broker
//! - **Blocking and async waits**: per-command timeouts, `tokio` friendly
//!
//! ## Quick Start
//!
//! ```no_run
//! use shell_queue::{Command, Session};
//!
//! fn main() -> shell_queue::Result<()> {
//!     shell_queue::logging::try_init().ok();
//!
//!     let session = Session::start_shell()?;
//!
//!     session.execute("cd /tmp")?;
//!     let output = session.execute(Command::new("pwd"))?;
//!     assert_eq!(output.first_line(), Some("/tmp"));
//!
//!     let handle = session.submit(
//!         Command::new("ls /").on_line(|id, line| println!("{}: {}", id, line)),
//!     )?;
//!     println!("exit code {}", handle.wait()?.exit_code);
//!
//!     session.close();
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod command;
pub mod config;
pub mod demux;
pub mod error;
pub mod logging;
pub mod output;
pub mod pty;
pub mod session;
pub mod toolbox;

// Re-export commonly used types
pub use command::{Command, CommandHandle, CommandId, CommandOutput, CommandState};
pub use error::{Result, ShellQueueError};
pub use output::{LineSplitter, OutputSanitizer};
pub use pty::{NativePty, PtySize};
pub use session::{shell_quote, Session, SessionConfig, SessionId, SessionState, SessionStats};
pub use toolbox::Toolbox;
