//! Event error types.

use thiserror::Error;
use tracker_payload::PayloadError;

/// Event construction or encoding error.
#[derive(Error, Debug)]
pub enum EventError {
    /// A required text field was empty
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A field carried a value the collector cannot accept
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// Payload encoding error
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),
}

/// Result type alias using EventError.
pub type EventResult<T> = Result<T, EventError>;
