//! Shared per-command record and the caller-facing handle.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use super::builder::{CommandParts, DoneCallback, LineCallback};
use super::{Command, CommandId, CommandOutput, CommandState};
use crate::error::ShellQueueError;
use crate::Result;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Progress {
    state: CommandState,
    lines: Vec<String>,
    started: Option<Instant>,
    finished: Option<Instant>,
}

impl Progress {
    fn duration(&self) -> Duration {
        match (self.started, self.finished) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }
}

/// A command as held by the session queue.
///
/// The line and done callbacks sit behind separate locks so that a line
/// callback which closes the session does not block the failure path that
/// fires the done callback.
pub(crate) struct CommandSlot {
    id: CommandId,
    script: String,
    timeout: Option<Duration>,
    progress: Mutex<Progress>,
    changed: Condvar,
    on_line: Mutex<Option<LineCallback>>,
    on_done: Mutex<Option<DoneCallback>>,
}

impl CommandSlot {
    pub(crate) fn new(id: CommandId, command: Command) -> Arc<Self> {
        let CommandParts {
            script,
            timeout,
            on_line,
            on_done,
        } = command.into_parts();

        Arc::new(Self {
            id,
            script,
            timeout,
            progress: Mutex::new(Progress::default()),
            changed: Condvar::new(),
            on_line: Mutex::new(on_line),
            on_done: Mutex::new(on_done),
        })
    }

    pub(crate) fn id(&self) -> CommandId {
        self.id
    }

    pub(crate) fn script(&self) -> &str {
        &self.script
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn state(&self) -> CommandState {
        lock(&self.progress).state.clone()
    }

    /// Pending -> Running. Returns false if the command already failed.
    pub(crate) fn mark_running(&self) -> bool {
        let mut progress = lock(&self.progress);
        if progress.state.advance(CommandState::Running) {
            progress.started = Some(Instant::now());
            true
        } else {
            false
        }
    }

    /// Record one output line and forward it to the line callback.
    pub(crate) fn push_line(&self, line: String) {
        {
            let mut progress = lock(&self.progress);
            if progress.state != CommandState::Running {
                trace!(command = %self.id, "dropping line for command that is not running");
                return;
            }
            progress.lines.push(line.clone());
        }

        if let Some(callback) = lock(&self.on_line).as_mut() {
            callback(self.id, &line);
        }
    }

    /// Move to a terminal state, fire the done callback and wake waiters.
    ///
    /// Only the first call has any effect; later ones return false.
    pub(crate) fn complete(&self, outcome: Result<i32>) -> bool {
        {
            let mut progress = lock(&self.progress);
            let target = match &outcome {
                Ok(code) => CommandState::Finished(*code),
                Err(e) => CommandState::Failed(e.clone()),
            };
            if !progress.state.advance(target) {
                return false;
            }
            progress.finished = Some(Instant::now());
        }

        let done = lock(&self.on_done).take();
        if let Some(done) = done {
            done(self.id, &outcome);
        }
        self.changed.notify_all();
        true
    }

    /// Block until the command leaves Pending/Running or `timeout` elapses.
    ///
    /// A timeout too large to represent as an `Instant` waits indefinitely.
    pub(crate) fn wait(&self, timeout: Option<Duration>) -> Result<CommandOutput> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut progress = lock(&self.progress);

        loop {
            match &progress.state {
                CommandState::Finished(code) => {
                    return Ok(CommandOutput::new(
                        self.id,
                        *code,
                        progress.lines.clone(),
                        progress.duration(),
                    ));
                }
                CommandState::Failed(e) => return Err(e.clone()),
                CommandState::Pending | CommandState::Running => {}
            }

            progress = match deadline {
                None => self
                    .changed
                    .wait(progress)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(ShellQueueError::Timeout);
                    }
                    self.changed
                        .wait_timeout(progress, deadline - now)
                        .map(|(guard, _)| guard)
                        .unwrap_or_else(|e| e.into_inner().0)
                }
            };
        }
    }
}

/// Handle to a submitted command.
///
/// Cloning the handle is cheap; every clone observes the same command.
#[derive(Clone)]
pub struct CommandHandle {
    slot: Arc<CommandSlot>,
}

impl CommandHandle {
    pub(crate) fn new(slot: Arc<CommandSlot>) -> Self {
        Self { slot }
    }

    /// Id of the command within its session.
    pub fn id(&self) -> CommandId {
        self.slot.id()
    }

    /// Current state of the command.
    pub fn state(&self) -> CommandState {
        self.slot.state()
    }

    /// Check whether the command reached a terminal state.
    pub fn is_done(&self) -> bool {
        self.slot.state().is_terminal()
    }

    /// Block until the command completes.
    pub fn wait(&self) -> Result<CommandOutput> {
        self.slot.wait(None)
    }

    /// Block until the command completes or `timeout` elapses.
    ///
    /// On [`ShellQueueError::Timeout`] the command is still queued or
    /// running and can be waited on again.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<CommandOutput> {
        self.slot.wait(Some(timeout))
    }

    /// Wait without blocking the async runtime.
    pub async fn wait_async(&self, timeout: Option<Duration>) -> Result<CommandOutput> {
        let slot = Arc::clone(&self.slot);
        tokio::task::spawn_blocking(move || slot.wait(timeout))
            .await
            .map_err(|e| ShellQueueError::Io(format!("wait task failed: {}", e)))?
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.slot.timeout()
    }
}

impl std::fmt::Debug for CommandHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandle")
            .field("id", &self.slot.id())
            .field("state", &self.slot.state())
            .finish()
    }
}
