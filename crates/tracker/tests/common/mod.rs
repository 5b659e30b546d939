#![allow(dead_code)]

use batch_emitter::{Batch, DeliveryOutcome, Emitter, EmitterConfig, Transport};
use parking_lot::Mutex;
use std::sync::Arc;
use tracker::{Tracker, TrackerConfig};
use tracker_payload::Payload;

/// Transport that keeps a copy of every payload it is asked to send.
#[derive(Default)]
pub struct CapturingTransport {
    payloads: Mutex<Vec<Payload>>,
}

impl CapturingTransport {
    pub fn payloads(&self) -> Vec<Payload> {
        self.payloads.lock().clone()
    }
}

impl Transport for CapturingTransport {
    fn send(&self, batch: &Batch) -> DeliveryOutcome {
        self.payloads.lock().extend(batch.payloads().cloned());
        DeliveryOutcome::Success
    }
}

pub fn emitter_config() -> EmitterConfig {
    let mut config = EmitterConfig::new("collector.test");
    config.batch_size = 10;
    config.buffer_timeout_ms = 50;
    config
}

/// Tracker whose emitter records payloads instead of sending them.
pub fn capturing_tracker(config: TrackerConfig) -> (Tracker, Arc<CapturingTransport>) {
    let transport = Arc::new(CapturingTransport::default());
    let emitter = Emitter::builder(emitter_config())
        .transport(transport.clone())
        .build()
        .expect("emitter should start");
    let tracker = Tracker::new(config, emitter).expect("tracker should build");
    (tracker, transport)
}

pub fn text<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(|value| value.as_str())
}
