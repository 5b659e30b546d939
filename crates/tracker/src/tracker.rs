//! Tracker facade: turns events into payloads and hands them to an emitter.

use crate::config::TrackerConfig;
use crate::TrackerResult;
use batch_emitter::{Emitter, EmitterConfig, EmitterResult};
use std::time::Duration;
use tracing::debug;
use tracker_events::{Event, Subject};
use tracker_payload::constants::keys;
use uuid::Uuid;

/// Tracker version sent as `tv`.
pub const TRACKER_VERSION: &str = concat!("rust-", env!("CARGO_PKG_VERSION"));

/// Records events for one namespace and sends them through its emitter.
pub struct Tracker {
    config: TrackerConfig,
    subject: Option<Subject>,
    emitter: Emitter,
}

impl Tracker {
    pub fn new(config: TrackerConfig, emitter: Emitter) -> TrackerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            subject: None,
            emitter,
        })
    }

    /// Build a tracker with an HTTP emitter.
    pub fn create(config: TrackerConfig, emitter_config: EmitterConfig) -> TrackerResult<Self> {
        let emitter = Emitter::new(emitter_config)?;
        Self::new(config, emitter)
    }

    /// Default subject for every event; event-level subjects override it field by field.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Encode the event and queue it for delivery.
    ///
    /// Returns the ids of the queued payloads: one for most events, one per
    /// transaction plus one per item for ecommerce transactions.
    pub fn track(&self, event: &Event) -> TrackerResult<Vec<Uuid>> {
        let builders = event.to_payload_builders(self.config.base64_encode)?;
        let subject = match (event.subject(), &self.subject) {
            (Some(own), Some(fallback)) => Some(own.merged_over(fallback)),
            (Some(own), None) => Some(own.clone()),
            (None, fallback) => fallback.clone(),
        };

        let mut event_ids = Vec::with_capacity(builders.len());
        for mut builder in builders {
            builder.add(keys::TRACKER_VERSION, TRACKER_VERSION)?;
            builder.add(keys::NAMESPACE, self.config.namespace.as_str())?;
            builder.add_opt(keys::APP_ID, Some(self.config.app_id.as_str()))?;
            builder.add(keys::PLATFORM, self.config.platform.as_str())?;
            if let Some(subject) = &subject {
                builder.extend(subject.pairs())?;
            }

            let payload = builder.build();
            let event_id = payload.event_id();
            self.emitter.enqueue(payload)?;
            event_ids.push(event_id);
        }

        debug!(
            namespace = %self.config.namespace,
            event_type = event.event_type(),
            payloads = event_ids.len(),
            "Event tracked"
        );
        Ok(event_ids)
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    pub fn tracker_version(&self) -> &'static str {
        TRACKER_VERSION
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// See [`Emitter::flush`].
    pub fn flush(&self, timeout: Duration) -> bool {
        self.emitter.flush(timeout)
    }

    /// See [`Emitter::shutdown`].
    pub fn shutdown(&self, timeout: Duration) -> EmitterResult<()> {
        self.emitter.shutdown(timeout)
    }
}
