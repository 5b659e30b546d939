//! Batching policy over the event queue.

use crate::queue::EventQueue;
use crate::transport::Batch;
use std::sync::Arc;
use std::time::Duration;

/// Groups queued payloads into ordered batches.
///
/// A batch is released as soon as it reaches `max_size`, or when the buffer
/// timeout since its oldest item elapses, whichever comes first.
pub struct Batcher {
    queue: Arc<EventQueue>,
    max_size: usize,
    buffer_timeout: Duration,
}

impl Batcher {
    pub fn new(queue: Arc<EventQueue>, max_size: usize, buffer_timeout: Duration) -> Self {
        Self {
            queue,
            max_size: max_size.max(1),
            buffer_timeout,
        }
    }

    /// Next batch in queue order, or `None` once the queue is closed and drained.
    pub fn next_batch(&self) -> Option<Batch> {
        let items = self.queue.take_batch(self.max_size, self.buffer_timeout);
        if items.is_empty() {
            None
        } else {
            Some(Batch::from_items(items))
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
