//! Command state machine.

use crate::error::ShellQueueError;

/// Completion state of a submitted command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CommandState {
    /// Queued behind other commands.
    #[default]
    Pending,
    /// Written to the shell, waiting for its marker.
    Running,
    /// Marker seen; carries the exit code of the last statement.
    Finished(i32),
    /// The command's outcome could not be determined.
    Failed(ShellQueueError),
}

impl CommandState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Pending -> Running
    /// - Pending -> Failed
    /// - Running -> Finished
    /// - Running -> Failed
    pub fn can_transition_to(&self, target: &CommandState) -> bool {
        use CommandState::*;
        matches!(
            (self, target),
            (Pending, Running) | (Pending, Failed(_)) | (Running, Finished(_)) | (Running, Failed(_))
        )
    }

    /// Move to `target` if the transition is valid.
    ///
    /// Returns `false` and leaves the state unchanged otherwise.
    pub fn advance(&mut self, target: CommandState) -> bool {
        if self.can_transition_to(&target) {
            *self = target;
            true
        } else {
            false
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandState::Finished(_) | CommandState::Failed(_))
    }

    /// Exit code, only available once finished.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandState::Finished(code) => Some(*code),
            _ => None,
        }
    }
}
