//! Native PTY implementation using portable-pty.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use portable_pty::{native_pty_system, CommandBuilder, PtySize as NativePtySize};
use tracing::debug;

use super::PtySize;
use crate::error::ShellQueueError;
use crate::Result;

/// Shell started when no program is configured.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Escalation broker used for elevated sessions when none is configured.
pub const DEFAULT_ESCALATION: &str = "su";

/// Locate `program` the way `execvp` would.
///
/// Names containing a `/` are checked directly; bare names are searched on
/// `PATH`.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    if program.contains('/') {
        let path = Path::new(program);
        return path.is_file().then(|| path.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Wrapper around the native PTY system.
pub struct NativePty {
    pty_system: Box<dyn portable_pty::PtySystem + Send>,
}

impl NativePty {
    /// Create a new NativePty instance.
    pub fn new() -> Self {
        Self {
            pty_system: native_pty_system(),
        }
    }

    /// Spawn `program` with `args` in a new PTY.
    ///
    /// Fails with [`ShellQueueError::NoShellBinary`] when the program cannot
    /// be found and [`ShellQueueError::SpawnFailed`] when exec fails.
    pub fn spawn(&self, program: &str, args: &[String], size: PtySize) -> Result<ShellProcess> {
        let path = resolve_program(program)
            .ok_or_else(|| ShellQueueError::NoShellBinary(program.to_string()))?;

        let native_size = NativePtySize {
            rows: size.rows,
            cols: size.cols,
            pixel_width: 0,
            pixel_height: 0,
        };

        let pair = self
            .pty_system
            .openpty(native_size)
            .map_err(|e| ShellQueueError::Pty(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&path);
        cmd.args(args);
        // Keep interactive shells from emitting colors and title updates
        cmd.env("TERM", "dumb");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ShellQueueError::SpawnFailed(format!("{}: {}", path.display(), e)))?;

        // The reader only sees EOF once every slave handle is closed
        drop(pair.slave);

        let pid = child.process_id().unwrap_or(0);
        debug!(program = %path.display(), pid, "spawned shell process");

        Ok(ShellProcess {
            master: pair.master,
            child,
            pid,
        })
    }
}

impl Default for NativePty {
    fn default() -> Self {
        Self::new()
    }
}

/// A process running in a PTY.
pub struct ShellProcess {
    master: Box<dyn portable_pty::MasterPty + Send>,
    child: Box<dyn portable_pty::Child + Send + Sync>,
    pid: u32,
}

impl ShellProcess {
    /// Process ID of the child (0 if unknown).
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Take the writer (can only be called once).
    pub fn take_writer(&mut self) -> Result<Box<dyn Write + Send>> {
        self.master
            .take_writer()
            .map_err(|e| ShellQueueError::Pty(e.to_string()))
    }

    /// Clone a reader for the PTY output.
    pub fn take_reader(&mut self) -> Result<Box<dyn Read + Send>> {
        self.master
            .try_clone_reader()
            .map_err(|e| ShellQueueError::Pty(e.to_string()))
    }

    /// Split into the master (which must stay alive) and the child.
    pub fn into_parts(
        self,
    ) -> (
        Box<dyn portable_pty::MasterPty + Send>,
        Box<dyn portable_pty::Child + Send + Sync>,
    ) {
        (self.master, self.child)
    }
}

/// Describe how a child exited, as an exit code when it exited normally.
pub fn exit_code_of(status: &portable_pty::ExitStatus) -> Option<i32> {
    if status.signal().is_some() {
        None
    } else {
        i32::try_from(status.exit_code()).ok()
    }
}
