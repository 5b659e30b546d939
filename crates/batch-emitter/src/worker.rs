//! Delivery worker: one batch in flight, retry/backoff state machine.

use crate::batcher::Batcher;
use crate::lifecycle::{BackoffWait, Lifecycle};
use crate::observer::{DeliveryObserver, DropReason, FailureNotice};
use crate::queue::EventQueue;
use crate::retry::Backoff;
use crate::transport::{Batch, DeliveryOutcome, QueuedItem, Transport};
use crate::EmitterResult;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const WORKER_THREAD_NAME: &str = "tracker-emitter";

enum Step {
    Continue,
    Abandon,
}

pub(crate) struct Worker {
    pub(crate) batcher: Batcher,
    pub(crate) queue: Arc<EventQueue>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) observer: Arc<dyn DeliveryObserver>,
    pub(crate) lifecycle: Arc<Lifecycle>,
    pub(crate) max_retry_attempts: u32,
    pub(crate) backoff: Backoff,
}

/// Marks the lifecycle STOPPED when the worker exits, including by panic.
///
/// A clean exit leaves the queue empty. Anything still queued here means the
/// worker died early, so it is reported and counted as dropped.
struct StopOnExit {
    lifecycle: Arc<Lifecycle>,
    queue: Arc<EventQueue>,
    observer: Arc<dyn DeliveryObserver>,
}

impl Drop for StopOnExit {
    fn drop(&mut self) {
        let lost_in_flight = self.queue.clear_in_flight();
        let leftover = self.queue.drain_all();
        if thread::panicking() || lost_in_flight > 0 || !leftover.is_empty() {
            error!(
                pending = leftover.len(),
                in_flight = lost_in_flight,
                "Delivery worker exited unexpectedly"
            );
        }

        for item in &leftover {
            notify(self.observer.as_ref(), |observer| {
                observer.on_failure(&FailureNotice::Dropped {
                    reason: DropReason::WorkerExited,
                    count: 1,
                    first_event_id: item.event_id(),
                    last_event_id: item.event_id(),
                    detail: "delivery worker exited".to_string(),
                })
            });
        }
        self.lifecycle
            .record_dropped(leftover.iter().map(QueuedItem::event_id));
        self.lifecycle.finish();
    }
}

impl Worker {
    pub(crate) fn spawn(self) -> EmitterResult<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || self.run())?;
        Ok(handle)
    }

    fn run(self) {
        let _stop = StopOnExit {
            lifecycle: Arc::clone(&self.lifecycle),
            queue: Arc::clone(&self.queue),
            observer: Arc::clone(&self.observer),
        };
        debug!(batch_size = self.batcher.max_size(), "Delivery worker started");

        loop {
            if self.lifecycle.deadline_passed() {
                self.abandon(Vec::new());
                break;
            }

            let Some(batch) = self.batcher.next_batch() else {
                break;
            };

            if self.lifecycle.deadline_passed() {
                self.abandon(batch.into_items());
                break;
            }

            if let Step::Abandon = self.deliver(batch) {
                self.abandon(Vec::new());
                break;
            }
        }

        info!("Delivery worker stopped");
    }

    fn deliver(&self, mut batch: Batch) -> Step {
        let attempt = batch
            .items_mut()
            .iter_mut()
            .map(QueuedItem::record_attempt)
            .max()
            .unwrap_or(1);
        let count = batch.len();
        let (first_event_id, last_event_id) = bounds(batch.items());

        debug!(
            batch_size = count,
            attempt,
            first_event_id = %first_event_id,
            "Sending batch"
        );

        match self.send(&batch) {
            DeliveryOutcome::Success => {
                debug!(batch_size = count, first_event_id = %first_event_id, "Batch delivered");
                self.notify(|observer| observer.on_success(count));
                self.queue.complete(count);
                Step::Continue
            }
            DeliveryOutcome::PermanentFailure(reason) => {
                error!(
                    batch_size = count,
                    first_event_id = %first_event_id,
                    last_event_id = %last_event_id,
                    reason = %reason,
                    "Batch rejected, dropping events"
                );
                self.notify(|observer| {
                    observer.on_failure(&FailureNotice::Dropped {
                        reason: DropReason::Rejected,
                        count,
                        first_event_id,
                        last_event_id,
                        detail: reason,
                    })
                });
                self.queue.complete(count);
                Step::Continue
            }
            DeliveryOutcome::TransientFailure(reason) => self.retry_or_drop(batch, reason),
        }
    }

    fn retry_or_drop(&self, batch: Batch, reason: String) -> Step {
        let (retry, exhausted): (Vec<QueuedItem>, Vec<QueuedItem>) = batch
            .into_items()
            .into_iter()
            .partition(|item| item.attempts() <= self.max_retry_attempts);

        if !exhausted.is_empty() {
            let (first_event_id, last_event_id) = bounds(&exhausted);
            error!(
                batch_size = exhausted.len(),
                first_event_id = %first_event_id,
                max_retry_attempts = self.max_retry_attempts,
                reason = %reason,
                "Retries exhausted, dropping events"
            );
            self.notify(|observer| {
                observer.on_failure(&FailureNotice::Dropped {
                    reason: DropReason::RetriesExhausted,
                    count: exhausted.len(),
                    first_event_id,
                    last_event_id,
                    detail: reason.clone(),
                })
            });
            self.queue.complete(exhausted.len());
        }

        if retry.is_empty() {
            return Step::Continue;
        }

        let attempt = retry.iter().map(QueuedItem::attempts).max().unwrap_or(1);
        let backoff = self.backoff.delay(attempt);
        let (first_event_id, last_event_id) = bounds(&retry);
        warn!(
            batch_size = retry.len(),
            attempt,
            first_event_id = %first_event_id,
            backoff_ms = backoff.as_millis() as u64,
            reason = %reason,
            "Transient delivery failure, retry scheduled"
        );
        self.notify(|observer| {
            observer.on_failure(&FailureNotice::RetryScheduled {
                attempt,
                count: retry.len(),
                first_event_id,
                last_event_id,
                reason,
                backoff,
            })
        });
        self.queue.reinsert_front(retry);

        match self.lifecycle.wait_backoff(backoff) {
            BackoffWait::Elapsed => Step::Continue,
            BackoffWait::PastDeadline => Step::Abandon,
        }
    }

    /// Drop everything still undelivered at the shutdown deadline.
    fn abandon(&self, in_hand: Vec<QueuedItem>) {
        self.queue.complete(in_hand.len());
        let mut items = in_hand;
        items.extend(self.queue.drain_all());
        if items.is_empty() {
            return;
        }

        warn!(
            dropped = items.len(),
            "Shutdown deadline reached, dropping undelivered events"
        );
        for item in &items {
            self.notify(|observer| {
                observer.on_failure(&FailureNotice::Dropped {
                    reason: DropReason::ShutdownDeadline,
                    count: 1,
                    first_event_id: item.event_id(),
                    last_event_id: item.event_id(),
                    detail: format!("undelivered after {} attempt(s)", item.attempts()),
                })
            });
        }
        self.lifecycle
            .record_dropped(items.iter().map(QueuedItem::event_id));
    }
}

impl Worker {
    /// Send through the transport. A panicking transport counts as a
    /// permanent failure of the batch.
    fn send(&self, batch: &Batch) -> DeliveryOutcome {
        panic::catch_unwind(AssertUnwindSafe(|| self.transport.send(batch))).unwrap_or_else(
            |payload| {
                DeliveryOutcome::PermanentFailure(format!(
                    "transport panicked: {}",
                    panic_message(payload.as_ref())
                ))
            },
        )
    }

    fn notify(&self, callback: impl FnOnce(&dyn DeliveryObserver)) {
        notify(self.observer.as_ref(), callback);
    }
}

/// Run an observer callback, logging instead of unwinding if it panics.
fn notify(observer: &dyn DeliveryObserver, callback: impl FnOnce(&dyn DeliveryObserver)) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(observer))) {
        error!(panic = %panic_message(payload.as_ref()), "Delivery observer panicked");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn bounds(items: &[QueuedItem]) -> (Uuid, Uuid) {
    let first = items.first().map(QueuedItem::event_id).unwrap_or_default();
    let last = items.last().map(QueuedItem::event_id).unwrap_or_default();
    (first, last)
}
