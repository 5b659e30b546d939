//! Emitter error types.

use thiserror::Error;
use uuid::Uuid;

/// Error type for emitter operations.
///
/// Delivery failures never appear here: they are reported asynchronously
/// through [`crate::DeliveryObserver`].
#[derive(Error, Debug)]
pub enum EmitterError {
    /// Bounded queue is full under the reject policy
    #[error("Event queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// Enqueue attempted after shutdown began
    #[error("Event queue is closed")]
    QueueClosed,

    /// Shutdown deadline elapsed with undelivered events
    #[error("Shutdown incomplete: {dropped} event(s) dropped at deadline")]
    ShutdownIncomplete { dropped: usize, event_ids: Vec<Uuid> },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using EmitterError.
pub type EmitterResult<T> = Result<T, EmitterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_full_display() {
        let err = EmitterError::QueueFull { capacity: 8 };
        assert_eq!(err.to_string(), "Event queue is full (capacity 8)");
    }

    #[test]
    fn shutdown_incomplete_display() {
        let err = EmitterError::ShutdownIncomplete {
            dropped: 2,
            event_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
        };
        assert_eq!(
            err.to_string(),
            "Shutdown incomplete: 2 event(s) dropped at deadline"
        );
    }

    #[test]
    fn url_error_converts() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err: EmitterError = parse_err.into();
        assert!(err.to_string().starts_with("Invalid URL:"));
    }
}
