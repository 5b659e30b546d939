//! Delivery callbacks.

use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Why payloads were dropped without delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Collector rejected the batch (permanent failure).
    Rejected,
    /// Transient failures exceeded the retry limit.
    RetriesExhausted,
    /// Evicted from a full queue under the drop-oldest policy.
    QueueOverflow,
    /// Still undelivered when the shutdown deadline elapsed.
    ShutdownDeadline,
    /// Still queued when the delivery worker exited unexpectedly.
    WorkerExited,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Rejected => "rejected",
            Self::RetriesExhausted => "retries_exhausted",
            Self::QueueOverflow => "queue_overflow",
            Self::ShutdownDeadline => "shutdown_deadline",
            Self::WorkerExited => "worker_exited",
        };
        f.write_str(label)
    }
}

/// A failed send or a drop, reported once per occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureNotice {
    /// The batch failed transiently and will be sent again after `backoff`.
    RetryScheduled {
        attempt: u32,
        count: usize,
        first_event_id: Uuid,
        last_event_id: Uuid,
        reason: String,
        backoff: Duration,
    },
    /// The payloads will never be sent.
    Dropped {
        reason: DropReason,
        count: usize,
        first_event_id: Uuid,
        last_event_id: Uuid,
        detail: String,
    },
}

impl FailureNotice {
    pub fn count(&self) -> usize {
        match self {
            Self::RetryScheduled { count, .. } | Self::Dropped { count, .. } => *count,
        }
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, Self::Dropped { .. })
    }
}

/// Receives delivery results from the worker thread.
///
/// Callbacks run on the worker thread and should return quickly. A panic in
/// a callback is caught and logged. Calling [`Emitter::shutdown`] from a
/// callback begins the drain without waiting for the worker to stop.
///
/// [`Emitter::shutdown`]: crate::Emitter::shutdown
pub trait DeliveryObserver: Send + Sync {
    fn on_success(&self, _count: usize) {}

    fn on_failure(&self, _notice: &FailureNotice) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DeliveryObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_count_and_kind() {
        let id = Uuid::new_v4();
        let notice = FailureNotice::Dropped {
            reason: DropReason::Rejected,
            count: 3,
            first_event_id: id,
            last_event_id: id,
            detail: "HTTP 400".to_string(),
        };
        assert_eq!(notice.count(), 3);
        assert!(notice.is_drop());
    }

    #[test]
    fn drop_reason_labels() {
        assert_eq!(DropReason::ShutdownDeadline.to_string(), "shutdown_deadline");
        assert_eq!(DropReason::QueueOverflow.to_string(), "queue_overflow");
        assert_eq!(DropReason::WorkerExited.to_string(), "worker_exited");
    }
}
