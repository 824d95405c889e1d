//! Command building and representation.

use std::fmt;
use std::time::Duration;

use super::CommandId;
use crate::Result;

/// Per-line output callback.
pub type LineCallback = Box<dyn FnMut(CommandId, &str) + Send>;

/// Completion callback, invoked exactly once with the exit code or failure.
pub type DoneCallback = Box<dyn FnOnce(CommandId, &Result<i32>) + Send>;

/// A unit of work to run in a shell session.
///
/// A command holds one or more statements that are written to the shell
/// together and complete as a unit; the exit code reported is that of the
/// last statement.
///
/// Callbacks run on the session's reader thread. They must not wait on
/// another command of the same session, since that thread is the one that
/// would complete it.
pub struct Command {
    statements: Vec<String>,
    timeout: Option<Duration>,
    on_line: Option<LineCallback>,
    on_done: Option<DoneCallback>,
}

impl Command {
    /// Create a new command with a single statement.
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statements: vec![statement.into()],
            timeout: None,
            on_line: None,
            on_done: None,
        }
    }

    /// Create a command that runs several statements as one unit.
    pub fn batch<I, S>(statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statements: statements.into_iter().map(Into::into).collect(),
            timeout: None,
            on_line: None,
            on_done: None,
        }
    }

    /// Append another statement.
    pub fn then(mut self, statement: impl Into<String>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Set the default wait timeout used by `Session::execute`.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Register a callback for each output line.
    pub fn on_line<F>(mut self, f: F) -> Self
    where
        F: FnMut(CommandId, &str) + Send + 'static,
    {
        self.on_line = Some(Box::new(f));
        self
    }

    /// Register a callback for completion.
    pub fn on_done<F>(mut self, f: F) -> Self
    where
        F: FnOnce(CommandId, &Result<i32>) + Send + 'static,
    {
        self.on_done = Some(Box::new(f));
        self
    }

    /// The statements of this command.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// The statements joined into the text written to the shell.
    pub fn script(&self) -> String {
        self.statements.join("\n")
    }

    /// The wait timeout configured for this command, if any.
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn into_parts(self) -> CommandParts {
        CommandParts {
            script: self.script(),
            timeout: self.timeout,
            on_line: self.on_line,
            on_done: self.on_done,
        }
    }
}

/// A command taken apart for storage in the session queue.
pub(crate) struct CommandParts {
    pub script: String,
    pub timeout: Option<Duration>,
    pub on_line: Option<LineCallback>,
    pub on_done: Option<DoneCallback>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("statements", &self.statements)
            .field("timeout", &self.timeout)
            .field("on_line", &self.on_line.is_some())
            .field("on_done", &self.on_done.is_some())
            .finish()
    }
}

impl From<&str> for Command {
    fn from(statement: &str) -> Self {
        Self::new(statement)
    }
}

impl From<String> for Command {
    fn from(statement: String) -> Self {
        Self::new(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_new() {
        let cmd = Command::new("ls -la");
        assert_eq!(cmd.statements(), ["ls -la"]);
        assert_eq!(cmd.script(), "ls -la");
        assert!(cmd.timeout_duration().is_none());
    }

    #[test]
    fn test_command_batch() {
        let cmd = Command::batch(["echo this is a command", "echo this is another command"]);
        assert_eq!(cmd.statements().len(), 2);
        assert_eq!(
            cmd.script(),
            "echo this is a command\necho this is another command"
        );
    }

    #[test]
    fn test_command_then_and_timeout() {
        let cmd = Command::new("cd /tmp")
            .then("pwd")
            .timeout(Duration::from_secs(5));

        assert_eq!(cmd.script(), "cd /tmp\npwd");
        assert_eq!(cmd.timeout_duration(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_command_debug_hides_callbacks() {
        let cmd = Command::new("true").on_line(|_, _| {}).on_done(|_, _| {});
        let debug = format!("{:?}", cmd);
        assert!(debug.contains("on_line: true"));
        assert!(debug.contains("on_done: true"));
    }

    #[test]
    fn test_into_parts() {
        let parts = Command::batch(["a", "b"])
            .on_line(|_, _| {})
            .into_parts();
        assert_eq!(parts.script, "a\nb");
        assert!(parts.on_line.is_some());
        assert!(parts.on_done.is_none());
    }

    #[test]
    fn test_from_str() {
        let cmd: Command = "id".into();
        assert_eq!(cmd.script(), "id");
    }
}
