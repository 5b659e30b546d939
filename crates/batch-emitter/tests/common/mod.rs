#![allow(dead_code)]

use batch_emitter::{
    Batch, DeliveryObserver, DeliveryOutcome, DropReason, EmitterConfig, FailureNotice, Transport,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracker_payload::{Payload, PayloadBuilder};
use uuid::Uuid;

/// One call seen by the recording transport.
#[derive(Debug, Clone)]
pub struct SentBatch {
    pub event_ids: Vec<Uuid>,
    pub at: Instant,
}

/// Transport that records every batch and replays scripted outcomes.
///
/// Once the script runs out, `fallback` is returned.
pub struct RecordingTransport {
    script: Mutex<VecDeque<DeliveryOutcome>>,
    fallback: DeliveryOutcome,
    sent: Mutex<Vec<SentBatch>>,
    delay: Duration,
}

impl RecordingTransport {
    pub fn succeeding() -> Self {
        Self::scripted(Vec::new(), DeliveryOutcome::Success)
    }

    pub fn always(outcome: DeliveryOutcome) -> Self {
        Self::scripted(Vec::new(), outcome)
    }

    pub fn scripted(script: Vec<DeliveryOutcome>, fallback: DeliveryOutcome) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            sent: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Simulate request latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn sent(&self) -> Vec<SentBatch> {
        self.sent.lock().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.sent.lock().iter().map(|b| b.event_ids.len()).collect()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Every event id sent, in send order (retries repeat ids).
    pub fn sent_ids(&self) -> Vec<Uuid> {
        self.sent
            .lock()
            .iter()
            .flat_map(|b| b.event_ids.iter().copied())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, batch: &Batch) -> DeliveryOutcome {
        self.sent.lock().push(SentBatch {
            event_ids: batch.event_ids(),
            at: Instant::now(),
        });
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Transport whose first `panics` sends panic; later sends go to `inner`.
pub struct PanickingTransport {
    panics_left: Mutex<usize>,
    pub inner: RecordingTransport,
}

impl PanickingTransport {
    pub fn new(panics: usize) -> Self {
        Self {
            panics_left: Mutex::new(panics),
            inner: RecordingTransport::succeeding(),
        }
    }
}

impl Transport for PanickingTransport {
    fn send(&self, batch: &Batch) -> DeliveryOutcome {
        {
            let mut left = self.panics_left.lock();
            if *left > 0 {
                *left -= 1;
                panic!("collector client blew up");
            }
        }
        self.inner.send(batch)
    }
}

/// Observer whose success callback always panics.
#[derive(Default)]
pub struct PanickingObserver {
    pub calls: Mutex<usize>,
}

impl DeliveryObserver for PanickingObserver {
    fn on_success(&self, _count: usize) {
        *self.calls.lock() += 1;
        panic!("observer failed");
    }
}

/// Observer that keeps every callback for inspection.
#[derive(Default)]
pub struct RecordingObserver {
    successes: Mutex<Vec<usize>>,
    failures: Mutex<Vec<FailureNotice>>,
}

impl RecordingObserver {
    pub fn delivered(&self) -> usize {
        self.successes.lock().iter().sum()
    }

    pub fn failures(&self) -> Vec<FailureNotice> {
        self.failures.lock().clone()
    }

    pub fn retry_notices(&self) -> Vec<FailureNotice> {
        self.failures()
            .into_iter()
            .filter(|n| matches!(n, FailureNotice::RetryScheduled { .. }))
            .collect()
    }

    pub fn drop_notices(&self, reason: DropReason) -> Vec<FailureNotice> {
        self.failures()
            .into_iter()
            .filter(|n| matches!(n, FailureNotice::Dropped { reason: r, .. } if *r == reason))
            .collect()
    }

    pub fn dropped_ids(&self, reason: DropReason) -> Vec<Uuid> {
        self.drop_notices(reason)
            .into_iter()
            .filter_map(|n| match n {
                FailureNotice::Dropped { first_event_id, .. } => Some(first_event_id),
                _ => None,
            })
            .collect()
    }
}

impl DeliveryObserver for RecordingObserver {
    fn on_success(&self, count: usize) {
        self.successes.lock().push(count);
    }

    fn on_failure(&self, notice: &FailureNotice) {
        self.failures.lock().push(notice.clone());
    }
}

/// Config pointed at a placeholder collector, with fast timings.
pub fn test_config(batch_size: usize) -> EmitterConfig {
    let mut config = EmitterConfig::new("collector.test");
    config.batch_size = batch_size;
    config.buffer_timeout_ms = 100;
    config.backoff_base_ms = 20;
    config.backoff_cap_ms = 200;
    config.backoff_jitter = 0.0;
    config
}

pub fn payload(label: &str) -> Payload {
    let mut builder = PayloadBuilder::new();
    builder.add("e", "se").expect("add e");
    builder.add("se_ca", "test").expect("add category");
    builder.add("se_ac", label).expect("add action");
    builder.build()
}

pub fn transient() -> DeliveryOutcome {
    DeliveryOutcome::TransientFailure("HTTP 503".to_string())
}
