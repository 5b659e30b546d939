//! Thread-safe FIFO buffer between producers and the delivery worker.

use crate::config::FullQueuePolicy;
use crate::transport::QueuedItem;
use crate::{EmitterError, EmitterResult};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

struct QueueState {
    pending: VecDeque<QueuedItem>,
    /// Items handed to the worker and not yet resolved.
    in_flight: usize,
    closed: bool,
    /// Release partial batches without waiting, until the queue empties.
    flush_requested: bool,
    /// Callers blocked in `wait_idle`; partial batches go out while any wait.
    flush_waiters: usize,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }

    fn flushing(&self) -> bool {
        self.flush_requested || self.flush_waiters > 0
    }
}

/// Event queue, bounded or unbounded.
///
/// The capacity limits pending items only. Items taken by the worker do not
/// count against it, and a batch put back after a transient failure is always
/// accepted even if that exceeds the capacity.
pub struct EventQueue {
    state: Mutex<QueueState>,
    /// Items available, queue closed, or flush requested.
    available: Condvar,
    /// Room made under the block policy.
    space: Condvar,
    /// Queue drained and nothing in flight.
    idle: Condvar,
    capacity: Option<usize>,
    policy: FullQueuePolicy,
}

impl EventQueue {
    pub fn new(capacity: Option<usize>, policy: FullQueuePolicy) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                in_flight: 0,
                closed: false,
                flush_requested: false,
                flush_waiters: 0,
            }),
            available: Condvar::new(),
            space: Condvar::new(),
            idle: Condvar::new(),
            capacity,
            policy,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None, FullQueuePolicy::Block)
    }

    /// Add an item at the tail.
    ///
    /// Under the drop-oldest policy the evicted head item is returned so the
    /// caller can report it.
    pub fn enqueue(&self, item: QueuedItem) -> EmitterResult<Option<QueuedItem>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(EmitterError::QueueClosed);
        }

        let mut evicted = None;
        if let Some(capacity) = self.capacity {
            if state.pending.len() >= capacity {
                match self.policy {
                    FullQueuePolicy::Reject => {
                        return Err(EmitterError::QueueFull { capacity });
                    }
                    FullQueuePolicy::DropOldest => {
                        evicted = state.pending.pop_front();
                    }
                    FullQueuePolicy::Block => {
                        while state.pending.len() >= capacity && !state.closed {
                            self.space.wait(&mut state);
                        }
                        if state.closed {
                            return Err(EmitterError::QueueClosed);
                        }
                    }
                }
            }
        }

        state.pending.push_back(item);
        self.available.notify_one();
        Ok(evicted)
    }

    /// Remove up to `max_size` items from the head.
    ///
    /// Blocks until at least one item is available. While the queue is open
    /// and no flush is in progress, a partial batch is held until `max_wait`
    /// after the head item was enqueued. Returns empty only when the queue is
    /// closed and empty.
    pub fn take_batch(&self, max_size: usize, max_wait: Duration) -> Vec<QueuedItem> {
        let max_size = max_size.max(1);
        let mut state = self.state.lock();

        while state.pending.is_empty() {
            if state.closed {
                return Vec::new();
            }
            self.available.wait(&mut state);
        }

        let deadline = state
            .pending
            .front()
            .and_then(|head| head.enqueued_at().checked_add(max_wait));
        while state.pending.len() < max_size && !state.closed && !state.flushing() {
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.available.wait(&mut state),
            }
        }

        let count = state.pending.len().min(max_size);
        let batch: Vec<QueuedItem> = state.pending.drain(..count).collect();
        state.in_flight += batch.len();
        if state.pending.is_empty() {
            state.flush_requested = false;
        }
        self.space.notify_all();
        batch
    }

    /// Put a batch back at the head, preserving its order.
    pub fn reinsert_front(&self, items: Vec<QueuedItem>) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(items.len());
        for item in items.into_iter().rev() {
            state.pending.push_front(item);
        }
        self.available.notify_all();
    }

    /// Mark `count` in-flight items as resolved (delivered or dropped).
    pub fn complete(&self, count: usize) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(count);
        if state.is_idle() {
            self.idle.notify_all();
        }
    }

    /// Forget every in-flight item, returning how many there were. Used when
    /// the worker that held them is gone.
    pub(crate) fn clear_in_flight(&self) -> usize {
        let mut state = self.state.lock();
        let lost = std::mem::take(&mut state.in_flight);
        if state.is_idle() {
            self.idle.notify_all();
        }
        lost
    }

    /// Stop accepting new items. Existing contents are kept.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.available.notify_all();
        self.space.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Remove every pending item.
    pub fn drain_all(&self) -> Vec<QueuedItem> {
        let mut state = self.state.lock();
        let drained: Vec<QueuedItem> = state.pending.drain(..).collect();
        state.flush_requested = false;
        self.space.notify_all();
        if state.is_idle() {
            self.idle.notify_all();
        }
        drained
    }

    /// Make a waiting `take_batch` release its partial batch immediately.
    pub fn request_flush(&self) {
        let mut state = self.state.lock();
        if !state.pending.is_empty() {
            state.flush_requested = true;
            self.available.notify_all();
        }
    }

    /// Block until nothing is pending or in flight, or the timeout elapses.
    /// Returns whether the queue went idle.
    ///
    /// Partial batches, including items enqueued during the wait, are
    /// released without waiting for the batch timeout. A timeout too large to
    /// represent as a deadline waits indefinitely.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        state.flush_waiters += 1;
        self.available.notify_all();

        while !state.is_idle() {
            match deadline {
                Some(deadline) => {
                    if self.idle.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.idle.wait(&mut state),
            }
        }

        state.flush_waiters -= 1;
        state.is_idle()
    }

    /// Pending items, excluding those in flight.
    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().pending.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
