//! Core types for Cleanser Guard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Result of sanitizing a piece of text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SanitizeResult {
    /// No PII found, text unchanged
    Clean(String),

    /// PII was replaced with placeholders
    Redacted {
        /// The anonymized text
        text: String,
        /// Spans that were replaced, in the coordinates of the original text
        spans: Vec<Span>,
    },
}

impl SanitizeResult {
    /// Get the resulting text
    pub fn text(&self) -> &str {
        match self {
            SanitizeResult::Clean(text) => text,
            SanitizeResult::Redacted { text, .. } => text,
        }
    }

    /// Consume the result and return the text
    pub fn into_text(self) -> String {
        match self {
            SanitizeResult::Clean(text) => text,
            SanitizeResult::Redacted { text, .. } => text,
        }
    }

    /// Check if the text was modified
    pub fn is_modified(&self) -> bool {
        matches!(self, SanitizeResult::Redacted { .. })
    }

    /// Spans that were replaced
    pub fn spans(&self) -> &[Span] {
        match self {
            SanitizeResult::Clean(_) => &[],
            SanitizeResult::Redacted { spans, .. } => spans,
        }
    }
}

/// A detected PII occurrence.
///
/// Offsets are byte offsets into the analyzed UTF-8 text and always fall on
/// character boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// Entity type label
    pub entity_type: EntityType,
    /// Detector confidence (0.0-1.0)
    pub score: f32,
}

impl Span {
    pub fn new(start: usize, end: usize, entity_type: EntityType, score: f32) -> Self {
        Self {
            start,
            end,
            entity_type,
            score,
        }
    }

    /// Length of the span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether two spans share at least one byte
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Output of an anonymizer call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizedText {
    /// The text with every span substituted
    pub text: String,
    /// The spans that were actually applied after overlap resolution
    pub applied: Vec<Span>,
}

/// PII entity types.
///
/// Labels follow the Presidio naming so remote results map onto the same
/// variants; anything unknown is kept verbatim in [`EntityType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    /// Personal name
    Person,
    /// Email address
    EmailAddress,
    /// Phone number
    PhoneNumber,
    /// US Social Security Number
    UsSsn,
    /// Credit card number
    CreditCard,
    /// IPv4 or IPv6 address
    IpAddress,
    /// API key or secret token
    ApiKey,
    /// Any other label reported by a detector
    Other(String),
}

impl EntityType {
    /// The placeholder label, e.g. `EMAIL_ADDRESS`
    pub fn label(&self) -> &str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::EmailAddress => "EMAIL_ADDRESS",
            EntityType::PhoneNumber => "PHONE_NUMBER",
            EntityType::UsSsn => "US_SSN",
            EntityType::CreditCard => "CREDIT_CARD",
            EntityType::IpAddress => "IP_ADDRESS",
            EntityType::ApiKey => "API_KEY",
            EntityType::Other(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "PERSON" => EntityType::Person,
            "EMAIL_ADDRESS" => EntityType::EmailAddress,
            "PHONE_NUMBER" => EntityType::PhoneNumber,
            "US_SSN" => EntityType::UsSsn,
            "CREDIT_CARD" => EntityType::CreditCard,
            "IP_ADDRESS" => EntityType::IpAddress,
            "API_KEY" => EntityType::ApiKey,
            other => EntityType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for EntityType {
    fn from(label: String) -> Self {
        EntityType::from_label(&label)
    }
}

impl From<EntityType> for String {
    fn from(entity: EntityType) -> Self {
        entity.label().to_string()
    }
}

/// Request context for guard operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardContext {
    /// Unique request ID
    pub request_id: Uuid,
    /// Document the text belongs to (optional)
    pub source: Option<String>,
    /// Logical unit inside the document, e.g. `Sheet1!row 3` (optional)
    pub unit: Option<String>,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Default for GuardContext {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            source: None,
            unit: None,
            timestamp: Utc::now(),
        }
    }
}

impl GuardContext {
    /// Create a new context with a fresh request ID
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source document
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the logical unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Request context
    pub context: GuardContext,
    /// Original content hash
    pub content_hash: String,
    /// Result of sanitization
    pub result: AuditResult,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Result for audit logging (simplified)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuditResult {
    /// Nothing to redact
    Passed,
    /// Spans were redacted
    Redacted { count: usize, entity_types: Vec<String> },
    /// The detector or anonymizer failed
    Failed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_labels_round_trip_through_serde() {
        let span = Span::new(0, 4, EntityType::EmailAddress, 1.0);
        let json = serde_json::to_string(&span).unwrap();
        assert!(json.contains("\"EMAIL_ADDRESS\""));

        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entity_type, EntityType::EmailAddress);
    }

    #[test]
    fn test_unknown_label_is_kept() {
        let entity = EntityType::from_label("LOCATION");
        assert_eq!(entity, EntityType::Other("LOCATION".to_string()));
        assert_eq!(entity.to_string(), "LOCATION");
    }

    #[test]
    fn test_span_overlap() {
        let a = Span::new(0, 5, EntityType::Person, 0.5);
        let b = Span::new(4, 8, EntityType::Person, 0.5);
        let c = Span::new(5, 8, EntityType::Person, 0.5);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
