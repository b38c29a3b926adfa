//! Configuration for Cleanser Guard

use serde::{Deserialize, Serialize};

/// Main configuration for Guard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Which detector/anonymizer pair to use
    pub backend: Backend,
    /// PII detection configuration
    pub pii: PiiConfig,
    /// Audit configuration
    pub audit: AuditConfig,
}

impl GuardConfig {
    /// Built-in detection with audit logging enabled
    pub fn full() -> Self {
        Self {
            backend: Backend::Builtin,
            pii: PiiConfig::default(),
            audit: AuditConfig {
                enabled: true,
                ..Default::default()
            },
        }
    }

    /// Built-in detection without audit logging
    pub fn minimal() -> Self {
        Self {
            backend: Backend::Builtin,
            pii: PiiConfig::default(),
            audit: AuditConfig {
                enabled: false,
                ..Default::default()
            },
        }
    }

    /// Set the detection language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.pii.language = language.into();
        self
    }
}

/// Detector/anonymizer backend
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backend {
    /// Local regex detector and placeholder anonymizer
    #[default]
    Builtin,
    /// Presidio analyzer and anonymizer REST services
    Presidio(PresidioConfig),
}

/// Presidio REST endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresidioConfig {
    /// Analyzer base URL (`POST {url}/analyze`)
    pub analyzer_url: String,
    /// Anonymizer base URL (`POST {url}/anonymize`)
    pub anonymizer_url: String,
    /// Timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for PresidioConfig {
    fn default() -> Self {
        Self {
            analyzer_url: "http://localhost:5002".to_string(),
            anonymizer_url: "http://localhost:5001".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// PII detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PiiConfig {
    /// Enable PII detection
    pub enabled: bool,
    /// Language passed to the detector
    pub language: String,
    /// Detect personal names
    pub detect_person: bool,
    /// Detect SSNs
    pub detect_ssn: bool,
    /// Detect credit cards
    pub detect_credit_card: bool,
    /// Detect emails
    pub detect_email: bool,
    /// Detect phone numbers
    pub detect_phone: bool,
    /// Detect IP addresses
    pub detect_ip: bool,
    /// Detect API keys/secrets
    pub detect_api_keys: bool,
    /// Drop spans scoring below this threshold
    pub min_score: f32,
    /// Placeholder format (use {TYPE} for the entity label)
    pub redaction_format: String,
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en".to_string(),
            detect_person: true,
            detect_ssn: true,
            detect_credit_card: true,
            detect_email: true,
            detect_phone: true,
            detect_ip: true,
            detect_api_keys: true,
            min_score: 0.0,
            redaction_format: "<{TYPE}>".to_string(),
        }
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Enable audit logging
    pub enabled: bool,
    /// Include a truncated copy of the content in audit events
    pub log_content: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_content: false,
        }
    }
}
