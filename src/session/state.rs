//! Session state machine.

/// Represents the lifecycle state of a shell session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Process spawned, waiting for the startup handshake.
    #[default]
    Starting,
    /// Ready, no command running.
    Idle,
    /// A command is running in the shell.
    Busy,
    /// Closed by the caller or by process death; cannot be reused.
    Closed,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Starting -> Idle
    /// - Idle -> Busy
    /// - Busy -> Idle
    /// - any non-closed state -> Closed
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (Starting, Idle)
                | (Idle, Busy)
                | (Busy, Idle)
                | (Starting, Closed)
                | (Idle, Closed)
                | (Busy, Closed)
        )
    }

    /// Move to `target` if the transition is valid.
    ///
    /// Returns `false` and leaves the state unchanged otherwise.
    pub fn advance(&mut self, target: SessionState) -> bool {
        if self.can_transition_to(target) {
            *self = target;
            true
        } else {
            false
        }
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed)
    }

    /// Check if the session can accept commands.
    pub fn can_submit(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let mut state = SessionState::Starting;
        assert!(state.advance(SessionState::Idle));
        assert!(state.advance(SessionState::Busy));
        assert!(state.advance(SessionState::Idle));
        assert!(state.advance(SessionState::Busy));
        assert!(state.advance(SessionState::Closed));
        assert_eq!(state, SessionState::Closed);
    }

    #[test]
    fn test_invalid_starting_to_busy() {
        let mut state = SessionState::Starting;
        assert!(!state.advance(SessionState::Busy));
        assert_eq!(state, SessionState::Starting);
    }

    #[test]
    fn test_closed_is_final() {
        let mut state = SessionState::Closed;
        assert!(!state.advance(SessionState::Idle));
        assert!(!state.advance(SessionState::Busy));
        assert!(!state.advance(SessionState::Closed));
        assert!(state.is_terminal());
    }

    #[test]
    fn test_can_submit() {
        assert!(!SessionState::Starting.can_submit());
        assert!(SessionState::Idle.can_submit());
        assert!(SessionState::Busy.can_submit());
        assert!(!SessionState::Closed.can_submit());
    }

    #[test]
    fn test_default() {
        assert_eq!(SessionState::default(), SessionState::Starting);
    }
}
