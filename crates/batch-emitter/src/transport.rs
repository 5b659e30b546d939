//! Transport capability and the batch types it consumes.

use std::time::Instant;
use tracker_payload::Payload;
use uuid::Uuid;

/// A payload waiting for delivery.
#[derive(Debug, Clone)]
pub struct QueuedItem {
    payload: Payload,
    enqueued_at: Instant,
    attempts: u32,
}

impl QueuedItem {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            enqueued_at: Instant::now(),
            attempts: 0,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn event_id(&self) -> Uuid {
        self.payload.event_id()
    }

    /// When the item entered the queue.
    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    /// Number of sends attempted so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn record_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }
}

/// An ordered, non-empty group of items sent in one request.
#[derive(Debug, Clone)]
pub struct Batch {
    items: Vec<QueuedItem>,
}

impl Batch {
    pub(crate) fn from_items(items: Vec<QueuedItem>) -> Self {
        Self { items }
    }

    /// Batch of fresh items, for driving a transport directly.
    pub fn from_payloads(payloads: Vec<Payload>) -> Self {
        Self {
            items: payloads.into_iter().map(QueuedItem::new).collect(),
        }
    }

    pub fn items(&self) -> &[QueuedItem] {
        &self.items
    }

    pub fn payloads(&self) -> impl Iterator<Item = &Payload> {
        self.items.iter().map(QueuedItem::payload)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn event_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(QueuedItem::event_id).collect()
    }

    pub(crate) fn into_items(self) -> Vec<QueuedItem> {
        self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [QueuedItem] {
        &mut self.items
    }
}

/// Result of one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Collector accepted the batch.
    Success,
    /// Worth retrying: no response, timeout, or a server error.
    TransientFailure(String),
    /// Never retried: the collector rejected the request.
    PermanentFailure(String),
}

/// Delivers a batch to the collector.
///
/// Implementations must not panic on network failure; every failure maps to
/// a [`DeliveryOutcome`].
pub trait Transport: Send + Sync {
    fn send(&self, batch: &Batch) -> DeliveryOutcome;
}
