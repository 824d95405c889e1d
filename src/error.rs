//! Error types for shell-queue.

use thiserror::Error;

/// Main error type for shell-queue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellQueueError {
    /// The shell or escalation binary could not be found.
    #[error("shell binary not found: {0}")]
    NoShellBinary(String),

    /// Privilege escalation was refused by the user or by policy.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The child process could not be started.
    #[error("failed to spawn shell: {0}")]
    SpawnFailed(String),

    /// The shell process died while the command was pending or running.
    #[error("shell process terminated: {0}")]
    ProcessTerminated(String),

    /// The session was closed before the command completed.
    #[error("shell closed")]
    ShellClosed,

    /// The wait deadline elapsed; the command is still outstanding.
    #[error("timed out waiting for command")]
    Timeout,

    /// A completion marker was seen but no exit code could be read from it.
    #[error("malformed sentinel line: {0:?}")]
    MalformedSentinel(String),

    /// PTY-related error.
    #[error("PTY error: {0}")]
    Pty(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Channel to a worker thread is gone.
    #[error("channel closed")]
    ChannelClosed,
}

impl ShellQueueError {
    /// Check whether this error came from startup rather than a command.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Self::NoShellBinary(_) | Self::PermissionDenied(_) | Self::SpawnFailed(_)
        )
    }
}

impl From<std::io::Error> for ShellQueueError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Convenience Result type for shell-queue operations.
pub type Result<T> = std::result::Result<T, ShellQueueError>;
