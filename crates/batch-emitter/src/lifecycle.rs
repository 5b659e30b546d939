//! Emitter lifecycle: RUNNING → DRAINING → STOPPED.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Lifecycle state of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    /// Accepting events and delivering them.
    Running,
    /// Closed to new events; delivering what remains until the deadline.
    Draining,
    /// Worker has exited.
    Stopped,
}

impl fmt::Display for EmitterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// How a backoff wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackoffWait {
    Elapsed,
    /// The retry would land past the shutdown deadline.
    PastDeadline,
}

struct LifecycleState {
    state: EmitterState,
    /// Shutdown deadline. `None` while running, or when draining without one.
    deadline: Option<Instant>,
    /// Event ids dropped at the shutdown deadline.
    dropped: Vec<Uuid>,
}

/// State shared by the emitter handle and its worker thread.
pub(crate) struct Lifecycle {
    inner: Mutex<LifecycleState>,
    changed: Condvar,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(LifecycleState {
                state: EmitterState::Running,
                deadline: None,
                dropped: Vec::new(),
            }),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn state(&self) -> EmitterState {
        self.inner.lock().state
    }

    /// Move RUNNING → DRAINING with the given deadline, or none to drain
    /// everything. Returns false if shutdown had already begun.
    pub(crate) fn begin_drain(&self, deadline: Option<Instant>) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != EmitterState::Running {
            return false;
        }
        inner.state = EmitterState::Draining;
        inner.deadline = deadline;
        self.changed.notify_all();
        true
    }

    pub(crate) fn deadline_passed(&self) -> bool {
        self.inner
            .lock()
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Sleep for `delay`, waking early to give up if a shutdown deadline
    /// falls before the wait would end.
    pub(crate) fn wait_backoff(&self, delay: Duration) -> BackoffWait {
        let until = Instant::now().checked_add(delay);
        let mut inner = self.inner.lock();
        loop {
            if let Some(deadline) = inner.deadline {
                if until.map_or(true, |until| until > deadline) {
                    return BackoffWait::PastDeadline;
                }
            }
            match until {
                Some(until) if Instant::now() >= until => return BackoffWait::Elapsed,
                Some(until) => {
                    self.changed.wait_until(&mut inner, until);
                }
                None => self.changed.wait(&mut inner),
            }
        }
    }

    pub(crate) fn record_dropped(&self, event_ids: impl IntoIterator<Item = Uuid>) {
        self.inner.lock().dropped.extend(event_ids);
    }

    /// Mark the worker as exited.
    pub(crate) fn finish(&self) {
        let mut inner = self.inner.lock();
        inner.state = EmitterState::Stopped;
        self.changed.notify_all();
    }

    /// Block until STOPPED and return the ids dropped at the deadline.
    pub(crate) fn wait_stopped(&self) -> Vec<Uuid> {
        let mut inner = self.inner.lock();
        while inner.state != EmitterState::Stopped {
            self.changed.wait(&mut inner);
        }
        inner.dropped.clone()
    }
}
