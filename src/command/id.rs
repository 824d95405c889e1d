//! Command identifier type.

use std::fmt;

/// Identifier of a command within one session.
///
/// Ids are handed out by the owning session in submission order starting
/// at 1, so they are unique for the session's lifetime and double as the
/// queue position used when building completion markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl CommandId {
    /// Create a CommandId from a raw value.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id following this one.
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        assert_eq!(CommandId::from_raw(7).to_string(), "cmd-7");
    }

    #[test]
    fn test_next_is_increasing() {
        let first = CommandId::from_raw(1);
        let second = first.next();
        assert_eq!(second.as_u64(), 2);
        assert!(second > first);
    }
}
