//! Payload error types.

use thiserror::Error;

/// Payload construction error.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Empty key
    #[error("Payload keys cannot be empty")]
    EmptyKey,

    /// Key added twice
    #[error("Duplicate payload key: {0}")]
    DuplicateKey(String),

    /// Key stamped by the builder itself
    #[error("Payload key is reserved: {0}")]
    ReservedKey(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using PayloadError.
pub type PayloadResult<T> = Result<T, PayloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_display() {
        let err = PayloadError::DuplicateKey("url".to_string());
        assert_eq!(err.to_string(), "Duplicate payload key: url");
    }

    #[test]
    fn json_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{{").unwrap_err();
        let err: PayloadError = serde_err.into();
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
