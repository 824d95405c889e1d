//! Convenience queries built on a session.
//!
//! Everything here is composed from [`Session::execute`]; the toolbox adds
//! no access to the shell beyond what any other caller has.

use std::time::Duration;

use tracing::debug;

use crate::command::Command;
use crate::session::{shell_quote, Session};
use crate::Result;

/// Timeout applied to each toolbox query.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Higher-level queries answered by running commands in a session.
pub struct Toolbox<'a> {
    session: &'a Session,
    timeout: Duration,
}

impl<'a> Toolbox<'a> {
    /// Create a toolbox over `session`.
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the timeout applied to each query.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, statement: String) -> Result<crate::command::CommandOutput> {
        self.session
            .execute(Command::new(statement).timeout(self.timeout))
    }

    /// Check whether the session's shell runs as uid 0.
    pub fn is_root_access_given(&self) -> Result<bool> {
        let output = self.run("id".to_string())?;
        let root = output.success() && output.lines.iter().any(|l| l.contains("uid=0"));
        debug!(session = %self.session.id(), root, "checked root access");
        Ok(root)
    }

    /// Octal permission bits of `path` as printed by `stat`, e.g. `"644"`.
    ///
    /// Returns `None` when the path does not exist or cannot be read.
    pub fn file_mode(&self, path: &str) -> Result<Option<String>> {
        let output = self.run(format!("stat -c %a {}", shell_quote(path)))?;
        if !output.success() {
            return Ok(None);
        }
        Ok(output.first_line().map(str::to_string))
    }

    /// Check whether any process has exactly the name `name`.
    pub fn is_process_running(&self, name: &str) -> Result<bool> {
        let output = self.run(format!("pidof {} >/dev/null", shell_quote(name)))?;
        Ok(output.success())
    }

    /// Send SIGKILL to every process named `name`.
    ///
    /// Returns true if at least one process was signalled.
    pub fn kill_all(&self, name: &str) -> Result<bool> {
        self.kill_all_with_signal(name, "KILL")
    }

    /// Send `signal` (e.g. `"TERM"`) to every process named `name`.
    pub fn kill_all_with_signal(&self, name: &str, signal: &str) -> Result<bool> {
        let output = self.run(format!(
            "pkill -{} -x {}",
            shell_quote(signal),
            shell_quote(name)
        ))?;
        debug!(session = %self.session.id(), name, signalled = output.success(), "kill_all");
        Ok(output.success())
    }
}
