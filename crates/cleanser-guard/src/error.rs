//! Error types for Cleanser Guard

use thiserror::Error;

/// Result type alias for Guard operations
pub type Result<T> = std::result::Result<T, GuardError>;

/// Guard error types
#[derive(Debug, Error)]
pub enum GuardError {
    /// The detector could not analyze the text
    #[error("PII detector failure: {0}")]
    DetectorFailure(String),

    /// The anonymizer could not substitute the spans
    #[error("Anonymizer failure: {0}")]
    AnonymizerFailure(String),

    /// A span does not fit the text it was reported for
    #[error("Invalid span {start}..{end} for text of {len} bytes")]
    InvalidSpan { start: usize, end: usize, len: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error talking to a remote backend
    #[cfg(feature = "presidio")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl GuardError {
    /// Whether the error was raised while detecting spans
    pub fn is_detector_failure(&self) -> bool {
        matches!(self, GuardError::DetectorFailure(_))
    }

    /// Whether the error was raised while substituting spans
    pub fn is_anonymizer_failure(&self) -> bool {
        matches!(
            self,
            GuardError::AnonymizerFailure(_) | GuardError::InvalidSpan { .. }
        )
    }
}
