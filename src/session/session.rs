//! The shell session and its command queue.

use std::collections::VecDeque;
use std::io::Read;
use std::sync::mpsc as std_mpsc;
use std::cell::Cell;
use std::sync::{Arc, Condvar, Mutex, PoisonError, Weak};
use std::thread;
use std::time::{Duration, Instant};

use portable_pty::{Child, ChildKiller, ExitStatus, MasterPty};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::startup::{dispatch_text, preamble};
use super::{SessionConfig, SessionId, SessionState, SessionStats};
use crate::command::{lock, Command, CommandHandle, CommandId, CommandOutput, CommandSlot};
use crate::demux::{Demultiplexer, Demuxed, Marker};
use crate::error::ShellQueueError;
use crate::output::LineSplitter;
use crate::pty::{exit_code_of, NativePty, PtyReader, PtyWriter, ReadEnd};
use crate::Result;

/// How long to wait for the child's exit status after its output closes.
const EXIT_STATUS_GRACE: Duration = Duration::from_millis(500);

/// Poll interval while waiting for the exit status.
const EXIT_STATUS_POLL: Duration = Duration::from_millis(10);

thread_local! {
    // Set while this thread runs command callbacks
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

/// A live handle to one persistent shell process.
///
/// Commands submitted to a session run one at a time, in submission order,
/// in the same shell, so state such as the working directory carries over
/// between them. Clones share the same shell; the shell is killed when
/// [`Session::close`] is called or the last clone is dropped.
///
/// # Example
///
/// ```no_run
/// use shell_queue::{Command, Session};
///
/// # fn main() -> shell_queue::Result<()> {
/// let session = Session::start_shell()?;
/// let handle = session.submit(Command::new("ls -la /etc/hosts"))?;
/// let output = handle.wait()?;
/// println!("{} -> {}", output.text(), output.exit_code);
/// session.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: SessionId,
    elevated: bool,
    pid: u32,
    default_timeout: Option<Duration>,
    shared: Mutex<Shared>,
    // Signalled when a batch of callbacks has finished running
    delivered: Condvar,
    child: Mutex<Box<dyn Child + Send + Sync>>,
    // Dropping the master hangs up the terminal
    _master: Mutex<Box<dyn MasterPty + Send>>,
}

/// Everything the reader thread and callers coordinate on.
struct Shared {
    state: SessionState,
    demux: Demultiplexer,
    queue: VecDeque<Arc<CommandSlot>>,
    active: Option<Arc<CommandSlot>>,
    next_id: CommandId,
    input: Option<mpsc::UnboundedSender<Vec<u8>>>,
    ready: Option<std_mpsc::Sender<()>>,
    stats: SessionStats,
    // Callback batches taken out from under the lock but not yet run
    in_flight: usize,
}

/// Work to do once the session lock is released.
enum Delivery {
    Line(Arc<CommandSlot>, String),
    Done(Arc<CommandSlot>, Result<i32>),
}

impl Delivery {
    fn run(self) {
        match self {
            Delivery::Line(slot, line) => slot.push_line(line),
            Delivery::Done(slot, outcome) => {
                slot.complete(outcome);
            }
        }
    }
}

impl Session {
    /// Spawn a shell and wait for it to become ready.
    ///
    /// With `config.elevated` the shell is started through the escalation
    /// broker; if the broker exits or never hands over a working shell the
    /// result is [`ShellQueueError::PermissionDenied`].
    pub fn open(config: SessionConfig) -> Result<Session> {
        let id = SessionId::new();
        let (program, args) = config.launch_command();
        debug!(session = %id, program = %program, elevated = config.elevated, "opening session");

        let mut process = NativePty::new().spawn(&program, &args, config.pty_size)?;
        let reader = process.take_reader()?;
        let writer = process.take_writer()?;
        let pid = process.pid();
        let (master, child) = process.into_parts();

        let ready = Marker::ready(id);
        let (input_tx, input_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (ready_tx, ready_rx) = std_mpsc::channel();

        let inner = Arc::new(SessionInner {
            id,
            elevated: config.elevated,
            pid,
            default_timeout: config.default_timeout,
            shared: Mutex::new(Shared {
                state: SessionState::Starting,
                demux: Demultiplexer::new(ready.clone()),
                queue: VecDeque::new(),
                active: None,
                next_id: CommandId::from_raw(1),
                input: Some(input_tx.clone()),
                ready: Some(ready_tx),
                stats: SessionStats::new(),
                in_flight: 0,
            }),
            delivered: Condvar::new(),
            child: Mutex::new(child),
            _master: Mutex::new(master),
        });
        let session = Session { inner };

        let spawned = thread::Builder::new()
            .name(format!("{}-writer", id))
            .spawn(move || PtyWriter::new(writer, input_rx).run())
            .and_then(|_| {
                let weak = Arc::downgrade(&session.inner);
                thread::Builder::new()
                    .name(format!("{}-reader", id))
                    .spawn(move || read_loop(weak, reader))
            });
        if let Err(e) = spawned {
            session.inner.shutdown(ShellQueueError::ShellClosed);
            return Err(ShellQueueError::SpawnFailed(format!(
                "failed to start I/O threads: {}",
                e
            )));
        }

        input_tx
            .send(preamble(&config, &ready).into_bytes())
            .map_err(|_| ShellQueueError::ChannelClosed)?;
        drop(input_tx);

        match ready_rx.recv_timeout(config.startup_timeout) {
            Ok(()) => {
                info!(session = %id, pid, elevated = config.elevated, "session ready");
                Ok(session)
            }
            Err(reason) => {
                session.inner.shutdown(ShellQueueError::ShellClosed);
                let detail = match reason {
                    std_mpsc::RecvTimeoutError::Timeout => format!(
                        "`{}` did not start a shell within {:?}",
                        program, config.startup_timeout
                    ),
                    std_mpsc::RecvTimeoutError::Disconnected => {
                        format!("`{}` exited before the shell started", program)
                    }
                };
                warn!(session = %id, "{}", detail);
                if config.elevated {
                    Err(ShellQueueError::PermissionDenied(detail))
                } else {
                    Err(ShellQueueError::SpawnFailed(detail))
                }
            }
        }
    }

    /// Open a normal `/bin/sh` session.
    pub fn start_shell() -> Result<Session> {
        Self::open(SessionConfig::new())
    }

    /// Open a session escalated through `su`.
    pub fn start_root_shell() -> Result<Session> {
        Self::open(SessionConfig::root())
    }

    /// Queue a command and return immediately.
    ///
    /// Fails with [`ShellQueueError::ShellClosed`] once the session is
    /// closed or its process has died.
    pub fn submit(&self, command: impl Into<Command>) -> Result<CommandHandle> {
        let (slot, dispatched) = {
            let mut shared = lock(&self.inner.shared);
            if !shared.state.can_submit() {
                return Err(ShellQueueError::ShellClosed);
            }

            let id = shared.next_id;
            shared.next_id = id.next();
            let slot = CommandSlot::new(id, command.into());
            shared.queue.push_back(Arc::clone(&slot));
            shared.stats.record_submitted();
            trace!(session = %self.inner.id, command = %id, queued = shared.queue.len(), "command submitted");

            let dispatched = self.inner.dispatch_next(&mut shared);
            (slot, dispatched)
        };

        if let Err(e) = dispatched {
            self.inner.shutdown(e);
        }
        Ok(CommandHandle::new(slot))
    }

    /// Block until `handle` completes, or until `timeout` elapses.
    ///
    /// Must not be called from an output callback of the same session.
    pub fn wait_for(
        &self,
        handle: &CommandHandle,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        match timeout {
            Some(timeout) => handle.wait_timeout(timeout),
            None => handle.wait(),
        }
    }

    /// Submit a command and wait for it.
    ///
    /// Uses the command's own timeout, falling back to the session default.
    pub fn execute(&self, command: impl Into<Command>) -> Result<CommandOutput> {
        let handle = self.submit(command)?;
        let timeout = handle.timeout().or(self.inner.default_timeout);
        self.wait_for(&handle, timeout)
    }

    /// Submit a command and wait for it without blocking the runtime.
    pub async fn execute_async(&self, command: impl Into<Command>) -> Result<CommandOutput> {
        let handle = self.submit(command)?;
        let timeout = handle.timeout().or(self.inner.default_timeout);
        handle.wait_async(timeout).await
    }

    /// Kill the shell and fail every outstanding command with
    /// [`ShellQueueError::ShellClosed`]. Closing twice is a no-op.
    pub fn close(&self) {
        if self.inner.shutdown(ShellQueueError::ShellClosed) {
            info!(session = %self.inner.id, "session closed");
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Whether the shell was started through the escalation broker.
    pub fn is_elevated(&self) -> bool {
        self.inner.elevated
    }

    /// Process ID of the spawned shell or broker.
    pub fn pid(&self) -> u32 {
        self.inner.pid
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        lock(&self.inner.shared).state
    }

    /// Whether the session no longer accepts commands.
    pub fn is_closed(&self) -> bool {
        self.state().is_terminal()
    }

    /// Number of commands queued behind the running one.
    pub fn queued(&self) -> usize {
        lock(&self.inner.shared).queue.len()
    }

    /// Snapshot of the session counters.
    pub fn stats(&self) -> SessionStats {
        let shared = lock(&self.inner.shared);
        let mut stats = shared.stats.clone();
        stats.set_stray_lines(shared.demux.stray_lines());
        stats
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("pid", &self.inner.pid)
            .field("elevated", &self.inner.elevated)
            .field("state", &self.state())
            .finish()
    }
}

impl SessionInner {
    /// Write the next queued command if nothing is running.
    ///
    /// Fails if the writer thread is gone; the caller closes the session.
    fn dispatch_next(&self, shared: &mut Shared) -> Result<()> {
        if shared.active.is_some() || !shared.demux.is_ready() {
            return Ok(());
        }

        while let Some(slot) = shared.queue.pop_front() {
            if !slot.mark_running() {
                continue;
            }

            let marker = Marker::for_command(self.id, slot.id());
            let text = dispatch_text(slot.script(), &marker);
            shared.demux.arm(marker);
            shared.state.advance(SessionState::Busy);
            debug!(session = %self.id, command = %slot.id(), "dispatching command");
            shared.active = Some(slot);

            let sent = shared
                .input
                .as_ref()
                .map(|input| input.send(text.into_bytes()).is_ok())
                .unwrap_or(false);
            if !sent {
                return Err(ShellQueueError::ProcessTerminated(
                    "shell input closed".to_string(),
                ));
            }
            return Ok(());
        }

        shared.state.advance(SessionState::Idle);
        Ok(())
    }

    /// Route one output line.
    fn handle_line(&self, line: String) {
        let mut deliveries = Vec::new();
        let mut dispatched = Ok(());

        {
            let mut shared = lock(&self.shared);
            for event in shared.demux.feed(line) {
                match event {
                    Demuxed::Ready => {
                        shared.state.advance(SessionState::Idle);
                        if let Some(ready) = shared.ready.take() {
                            ready.send(()).ok();
                        }
                    }
                    Demuxed::Output(text) => {
                        if let Some(active) = &shared.active {
                            deliveries.push(Delivery::Line(Arc::clone(active), text));
                        }
                    }
                    Demuxed::Completed(outcome) => {
                        if let Some(active) = shared.active.take() {
                            if let Err(e) = &outcome {
                                warn!(session = %self.id, command = %active.id(), "{}", e);
                            }
                            trace!(session = %self.id, command = %active.id(), ?outcome, "command completed");
                            shared.stats.record_outcome(&outcome);
                            deliveries.push(Delivery::Done(active, outcome));
                        }
                        dispatched = self.dispatch_next(&mut shared);
                    }
                    Demuxed::Discarded(_) => {}
                }
            }
            if !deliveries.is_empty() {
                shared.in_flight += 1;
            }
        }

        if !deliveries.is_empty() {
            let _batch = InFlight::enter(self);
            for delivery in deliveries {
                delivery.run();
            }
        }

        if let Err(e) = dispatched {
            self.shutdown(e);
        }
    }

    /// Handle the shell's output closing.
    fn handle_end_of_stream(&self, end: ReadEnd) {
        if lock(&self.shared).state.is_terminal() {
            self.reap();
            return;
        }

        let status = self.collect_exit_status();
        let exit_code = status.as_ref().and_then(exit_code_of);
        let reason = match (&status, &end) {
            (Some(status), _) => format!("shell exited ({:?})", status),
            (None, ReadEnd::Failed(e)) => format!("read error: {}", e),
            (None, _) => "shell output closed".to_string(),
        };

        let (active, queued) = {
            let mut shared = lock(&self.shared);
            if !shared.state.advance(SessionState::Closed) {
                return;
            }
            shared.demux.disarm();
            shared.input = None;
            shared.ready = None;
            (shared.active.take(), shared.queue.drain(..).collect::<Vec<_>>())
        };

        if active.is_some() || !queued.is_empty() {
            warn!(session = %self.id, pending = queued.len(), "{}", reason);
        } else {
            info!(session = %self.id, "{}", reason);
        }

        // A running command that exited the shell (`exit 7`) owns the status
        let mut outcomes = Vec::new();
        if let Some(active) = active {
            let outcome = exit_code
                .ok_or_else(|| ShellQueueError::ProcessTerminated(reason.clone()));
            outcomes.push((active, outcome));
        }
        for slot in queued {
            outcomes.push((slot, Err(ShellQueueError::ProcessTerminated(reason.clone()))));
        }

        {
            let mut shared = lock(&self.shared);
            for (_, outcome) in &outcomes {
                shared.stats.record_outcome(outcome);
            }
        }
        for (slot, outcome) in outcomes {
            slot.complete(outcome);
        }
    }

    fn collect_exit_status(&self) -> Option<ExitStatus> {
        let deadline = Instant::now() + EXIT_STATUS_GRACE;
        loop {
            match lock(&self.child).try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) => {}
                Err(e) => {
                    debug!(session = %self.id, "failed to query exit status: {}", e);
                    return None;
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(EXIT_STATUS_POLL);
        }
    }

    fn reap(&self) {
        if let Ok(Some(status)) = lock(&self.child).try_wait() {
            trace!(session = %self.id, ?status, "reaped shell process");
        }
    }

    /// Close the session, failing outstanding commands with `error`.
    ///
    /// Callbacks already handed out by the reader run to completion first,
    /// so a command that finished before the close reports its result before
    /// the commands failed here. A callback that closes its own session
    /// skips that wait.
    ///
    /// Returns false if it was already closed.
    fn shutdown(&self, error: ShellQueueError) -> bool {
        let (active, queued) = {
            let mut shared = lock(&self.shared);
            if !DELIVERING.with(Cell::get) {
                while shared.in_flight > 0 {
                    shared = self
                        .delivered
                        .wait(shared)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
            if !shared.state.advance(SessionState::Closed) {
                return false;
            }
            shared.demux.disarm();
            shared.input = None;
            shared.ready = None;

            let active = shared.active.take();
            let queued: Vec<_> = shared.queue.drain(..).collect();
            let failures = active.iter().count() + queued.len();
            for _ in 0..failures {
                shared.stats.record_outcome::<()>(&Err(()));
            }
            (active, queued)
        };

        if let Err(e) = lock(&self.child).kill() {
            debug!(session = %self.id, "kill failed (already exited?): {}", e);
        }

        for slot in active.into_iter().chain(queued) {
            slot.complete(Err(error.clone()));
        }
        true
    }
}

/// Marks the current thread as running a callback batch until dropped.
struct InFlight<'a>(&'a SessionInner);

impl<'a> InFlight<'a> {
    fn enter(inner: &'a SessionInner) -> Self {
        DELIVERING.with(|flag| flag.set(true));
        InFlight(inner)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        DELIVERING.with(|flag| flag.set(false));
        lock(&self.0.shared).in_flight -= 1;
        self.0.delivered.notify_all();
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if self.shutdown(ShellQueueError::ShellClosed) {
            debug!(session = %self.id, "session dropped");
        }
    }
}

/// Reader thread body: drain the PTY and feed lines to the session.
///
/// Holds only a weak reference so that dropping the last `Session` handle
/// still closes the shell.
fn read_loop(session: Weak<SessionInner>, reader: Box<dyn Read + Send>) {
    let mut splitter = LineSplitter::new();

    let end = PtyReader::new(reader).run(|chunk| {
        let Some(inner) = session.upgrade() else {
            return false;
        };
        for line in splitter.push(chunk) {
            trace!(session = %inner.id, line = %line, "shell output");
            inner.handle_line(line);
        }
        true
    });

    if let Some(inner) = session.upgrade() {
        if let Some(line) = splitter.finish() {
            inner.handle_line(line);
        }
        inner.handle_end_of_stream(end);
    }
}
