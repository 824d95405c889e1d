//! Commands: the unit of work submitted to a session.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use shell_queue::command::Command;
//!
//! let cmd = Command::batch(["echo this is a command", "echo this is another command"])
//!     .timeout(Duration::from_secs(5))
//!     .on_line(|id, line| println!("{}: {}", id, line));
//! assert_eq!(cmd.statements().len(), 2);
//! ```

mod builder;
mod handle;
mod id;
mod result;
mod state;

pub use builder::{Command, DoneCallback, LineCallback};
pub use handle::CommandHandle;
pub use id::CommandId;
pub use result::CommandOutput;
pub use state::CommandState;

pub(crate) use handle::{lock, CommandSlot};
