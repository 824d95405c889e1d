//! Command result type.

use std::time::Duration;

use super::CommandId;

/// Captured result of a finished command.
///
/// Only produced for commands whose completion marker was read; failures
/// are reported as errors instead, so an exit code here is always real.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Id of the command within its session.
    pub id: CommandId,
    /// Exit code of the last statement.
    pub exit_code: i32,
    /// Output lines in arrival order, sentinel excluded.
    pub lines: Vec<String>,
    /// Time from dispatch to completion.
    pub duration: Duration,
}

impl CommandOutput {
    /// Create a new command output.
    pub fn new(id: CommandId, exit_code: i32, lines: Vec<String>, duration: Duration) -> Self {
        Self {
            id,
            exit_code,
            lines,
            duration,
        }
    }

    /// Check if command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Output joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// First line that is not blank, trimmed.
    pub fn first_line(&self) -> Option<&str> {
        self.lines
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(code: i32, lines: &[&str]) -> CommandOutput {
        CommandOutput::new(
            CommandId::from_raw(1),
            code,
            lines.iter().map(|l| l.to_string()).collect(),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn test_success() {
        assert!(output(0, &[]).success());
        assert!(!output(1, &[]).success());
    }

    #[test]
    fn test_text() {
        let out = output(0, &["line1", "line2", "line3"]);
        assert_eq!(out.text(), "line1\nline2\nline3");
    }

    #[test]
    fn test_first_line() {
        let out = output(0, &["", "  ", "  755 ", "x"]);
        assert_eq!(out.first_line(), Some("755"));
        assert_eq!(output(0, &[]).first_line(), None);
    }
}
