//! Session counters.

/// Counters describing what a session has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    submitted: u64,
    finished: u64,
    failed: u64,
    stray_lines: u64,
    last_exit_code: Option<i32>,
}

impl SessionStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands accepted by `submit`.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Commands whose marker (or shell exit status) was read.
    pub fn finished(&self) -> u64 {
        self.finished
    }

    /// Commands that ended without a known exit code.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Output lines discarded because no command was running.
    pub fn stray_lines(&self) -> u64 {
        self.stray_lines
    }

    /// Exit code of the most recently finished command.
    pub fn last_exit_code(&self) -> Option<i32> {
        self.last_exit_code
    }

    /// Commands not yet finished or failed.
    pub fn outstanding(&self) -> u64 {
        self.submitted.saturating_sub(self.finished + self.failed)
    }

    pub(crate) fn record_submitted(&mut self) {
        self.submitted += 1;
    }

    pub(crate) fn record_outcome<E>(&mut self, outcome: &Result<i32, E>) {
        match outcome {
            Ok(code) => {
                self.finished += 1;
                self.last_exit_code = Some(*code);
            }
            Err(_) => self.failed += 1,
        }
    }

    pub(crate) fn set_stray_lines(&mut self, count: u64) {
        self.stray_lines = count;
    }
}
