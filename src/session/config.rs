//! Session launch configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::pty::{PtySize, DEFAULT_ESCALATION, DEFAULT_SHELL};

/// Default time allowed for the startup handshake.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for opening a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Shell program for normal sessions.
    pub shell: String,
    /// Arguments passed to the shell.
    pub shell_args: Vec<String>,
    /// Start the shell through the escalation broker.
    pub elevated: bool,
    /// Escalation broker program followed by its arguments.
    pub escalation: Vec<String>,
    /// Directory to `cd` into once the shell is up.
    pub working_dir: Option<PathBuf>,
    /// Variables exported once the shell is up.
    pub env: BTreeMap<String, String>,
    /// Time allowed for the startup handshake.
    pub startup_timeout: Duration,
    /// Wait timeout applied by `Session::execute` when a command has none.
    pub default_timeout: Option<Duration>,
    /// Terminal size of the PTY.
    pub pty_size: PtySize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            shell_args: Vec::new(),
            elevated: false,
            escalation: vec![DEFAULT_ESCALATION.to_string()],
            working_dir: None,
            env: BTreeMap::new(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            default_timeout: None,
            pty_size: PtySize::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration for a normal `/bin/sh` session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for a session escalated with the default broker.
    pub fn root() -> Self {
        Self::default().elevated(true)
    }

    /// Set the shell program.
    pub fn shell(mut self, program: impl Into<String>) -> Self {
        self.shell = program.into();
        self
    }

    /// Add a shell argument.
    pub fn shell_arg(mut self, arg: impl Into<String>) -> Self {
        self.shell_args.push(arg.into());
        self
    }

    /// Choose between a normal and an escalated session.
    pub fn elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Set the escalation broker command line, e.g. `["sudo", "-S", "sh"]`.
    pub fn escalation<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.escalation = command.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the startup handshake timeout.
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Set the default command wait timeout.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Program and arguments to spawn for this configuration.
    pub fn launch_command(&self) -> (String, Vec<String>) {
        if self.elevated {
            match self.escalation.split_first() {
                Some((program, args)) => (program.clone(), args.to_vec()),
                None => (DEFAULT_ESCALATION.to_string(), Vec::new()),
            }
        } else {
            (self.shell.clone(), self.shell_args.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.shell, "/bin/sh");
        assert!(!config.elevated);
        assert_eq!(config.escalation, vec!["su"]);
        assert_eq!(config.startup_timeout, DEFAULT_STARTUP_TIMEOUT);
        assert!(config.default_timeout.is_none());
    }

    #[test]
    fn test_launch_normal() {
        let config = SessionConfig::new().shell("/bin/bash").shell_arg("--norc");
        assert_eq!(
            config.launch_command(),
            ("/bin/bash".to_string(), vec!["--norc".to_string()])
        );
    }

    #[test]
    fn test_launch_elevated() {
        assert_eq!(SessionConfig::root().launch_command(), ("su".to_string(), vec![]));

        let config = SessionConfig::root().escalation(["sudo", "-S", "sh"]);
        assert_eq!(
            config.launch_command(),
            ("sudo".to_string(), vec!["-S".to_string(), "sh".to_string()])
        );
    }

    #[test]
    fn test_launch_elevated_empty_broker() {
        let config = SessionConfig::root().escalation(Vec::<String>::new());
        assert_eq!(config.launch_command().0, "su");
    }

    #[test]
    fn test_builder_chain() {
        let config = SessionConfig::new()
            .working_dir("/tmp")
            .env("LD_LIBRARY_PATH", "/data/lib")
            .startup_timeout(Duration::from_secs(2))
            .default_timeout(Duration::from_secs(30));

        assert_eq!(config.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(config.env.get("LD_LIBRARY_PATH").map(String::as_str), Some("/data/lib"));
        assert_eq!(config.startup_timeout, Duration::from_secs(2));
        assert_eq!(config.default_timeout, Some(Duration::from_secs(30)));
    }
}
