//! Error types for the cleansing pipeline

use cleanser_extract::ExtractError;
use cleanser_guard::GuardError;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while cleansing a document
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Reading or parsing the source document failed
    #[error("Extraction failed: {0}")]
    Extraction(#[source] ExtractError),

    /// The detector or anonymizer failed
    #[error("Redaction failed: {0}")]
    Redaction(#[from] GuardError),

    /// Building the cleansed artifact failed
    #[error("Reconstruction failed: {0}")]
    Reconstruction(#[source] ExtractError),

    /// The summarization backend failed or returned nothing usable
    #[error("Summarization failed: {0}")]
    Summarization(String),

    /// HTTP error talking to the summarization backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the failure came from the redaction stage
    pub fn is_redaction_failure(&self) -> bool {
        matches!(self, PipelineError::Redaction(_))
    }
}
