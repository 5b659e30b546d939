//! Tracker
//!
//! Application-facing API: a [`Tracker`] stamps namespace, app id, platform
//! and subject onto validated events and queues them on its emitter. A
//! [`TrackerRegistry`] holds named trackers for applications that run more
//! than one.

mod config;
mod error;
mod registry;
mod tracker;

pub use config::{Platform, TrackerConfig, TrackerSettings};
pub use error::{TrackerError, TrackerResult};
pub use registry::TrackerRegistry;
pub use tracker::{Tracker, TRACKER_VERSION};

pub use batch_emitter;
pub use tracker_events;
pub use tracker_payload;
