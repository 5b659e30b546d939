//! Tracker error types.

use batch_emitter::EmitterError;
use thiserror::Error;
use tracker_events::EventError;
use tracker_payload::PayloadError;

/// Error type for tracker and registry operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Event validation or encoding error
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    /// Payload construction error
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Emitter error
    #[error("Emitter error: {0}")]
    Emitter(#[from] EmitterError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A tracker with this namespace is already registered
    #[error("Tracker namespace already registered: {0}")]
    DuplicateNamespace(String),

    /// No tracker registered under this namespace
    #[error("Unknown tracker namespace: {0}")]
    UnknownNamespace(String),

    /// Some trackers stopped with undelivered events
    #[error("Shutdown incomplete for {namespaces:?}: {dropped} event(s) dropped")]
    ShutdownIncomplete {
        namespaces: Vec<String>,
        dropped: usize,
    },
}

/// Result type alias using TrackerError.
pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_namespace_display() {
        let err = TrackerError::DuplicateNamespace("web".to_string());
        assert_eq!(err.to_string(), "Tracker namespace already registered: web");
    }

    #[test]
    fn emitter_error_converts() {
        let err: TrackerError = EmitterError::QueueClosed.into();
        assert!(matches!(err, TrackerError::Emitter(EmitterError::QueueClosed)));
    }

    #[test]
    fn event_error_converts() {
        let err: TrackerError = EventError::EmptyField("page_url").into();
        assert_eq!(err.to_string(), "Event error: page_url cannot be empty");
    }
}
