//! Main Guard implementation

use crate::anonymize::{resolve_overlaps, PlaceholderAnonymizer};
use crate::audit::AuditLogger;
use crate::config::{Backend, GuardConfig};
use crate::error::{GuardError, Result};
use crate::pii::PatternDetector;
use crate::types::{GuardContext, SanitizeResult};
use crate::{Anonymizer, Detector};

use std::time::Instant;
use tracing::debug;

/// Detector + anonymizer pair with audit logging.
///
/// Every call is independent; the guard keeps no state between calls.
pub struct Guard {
    config: GuardConfig,
    detector: Box<dyn Detector>,
    anonymizer: Box<dyn Anonymizer>,
    audit_logger: AuditLogger,
}

impl Guard {
    /// Create a new Guard with the backend named in the configuration
    pub fn new(config: GuardConfig) -> Result<Self> {
        let (detector, anonymizer) = match &config.backend {
            Backend::Builtin => (
                Box::new(PatternDetector::new(config.pii.clone())) as Box<dyn Detector>,
                Box::new(PlaceholderAnonymizer::new(config.pii.redaction_format.clone()))
                    as Box<dyn Anonymizer>,
            ),
            #[cfg(feature = "presidio")]
            Backend::Presidio(presidio) => {
                let client = crate::presidio::PresidioClient::new(presidio.clone())?;
                (
                    Box::new(client.clone()) as Box<dyn Detector>,
                    Box::new(client) as Box<dyn Anonymizer>,
                )
            }
            #[cfg(not(feature = "presidio"))]
            Backend::Presidio(_) => {
                return Err(GuardError::ConfigError(
                    "Presidio backend requires the 'presidio' feature".to_string(),
                ))
            }
        };

        Ok(Self::with_components(config, detector, anonymizer))
    }

    /// Create a Guard from explicit components
    pub fn with_components(
        config: GuardConfig,
        detector: Box<dyn Detector>,
        anonymizer: Box<dyn Anonymizer>,
    ) -> Self {
        Self {
            audit_logger: AuditLogger::new(config.audit.clone()),
            detector,
            anonymizer,
            config,
        }
    }

    /// Language passed to the detector
    pub fn language(&self) -> &str {
        &self.config.pii.language
    }

    /// Detect and replace PII in `text`
    pub async fn sanitize(&self, text: &str) -> Result<SanitizeResult> {
        self.sanitize_with_context(text, &GuardContext::default()).await
    }

    /// Detect and replace PII in `text`, tagging audit events with `context`
    pub async fn sanitize_with_context(
        &self,
        text: &str,
        context: &GuardContext,
    ) -> Result<SanitizeResult> {
        let start = Instant::now();

        let outcome = self.run(text).await;
        match &outcome {
            Ok(result) => {
                self.audit_logger
                    .log(context, text, result, start.elapsed().as_millis() as u64);
            }
            Err(err) => {
                self.audit_logger.log_failure(context, text, &err.to_string());
            }
        }
        outcome
    }

    async fn run(&self, text: &str) -> Result<SanitizeResult> {
        if !self.config.pii.enabled || text.trim().is_empty() {
            return Ok(SanitizeResult::Clean(text.to_string()));
        }

        let spans = self
            .detector
            .analyze(text, &self.config.pii.language)
            .await
            .map_err(|e| match e {
                GuardError::DetectorFailure(_) => e,
                other => GuardError::DetectorFailure(other.to_string()),
            })?;
        debug!(spans = spans.len(), "Detector finished");

        // Anonymizers receive a non-overlapping set, whatever the backend
        let spans = resolve_overlaps(spans);
        if spans.is_empty() {
            return Ok(SanitizeResult::Clean(text.to_string()));
        }

        let anonymized = self
            .anonymizer
            .anonymize(text, &spans)
            .await
            .map_err(|e| match e {
                GuardError::AnonymizerFailure(_) => e,
                other => GuardError::AnonymizerFailure(other.to_string()),
            })?;

        if anonymized.text == text {
            return Ok(SanitizeResult::Clean(anonymized.text));
        }

        Ok(SanitizeResult::Redacted {
            text: anonymized.text,
            spans: anonymized.applied,
        })
    }

    /// Create a builder for Guard
    pub fn builder() -> GuardBuilder {
        GuardBuilder::new()
    }
}

/// Builder for Guard configuration
pub struct GuardBuilder {
    config: GuardConfig,
    detector: Option<Box<dyn Detector>>,
    anonymizer: Option<Box<dyn Anonymizer>>,
}

impl GuardBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: GuardConfig::default(),
            detector: None,
            anonymizer: None,
        }
    }

    /// Start from an existing configuration
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure PII detection
    pub fn with_pii(mut self, config: crate::config::PiiConfig) -> Self {
        self.config.pii = config;
        self
    }

    /// Configure audit logging
    pub fn with_audit(mut self, config: crate::config::AuditConfig) -> Self {
        self.config.audit = config;
        self
    }

    /// Use a custom detector
    pub fn with_detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detector = Some(Box::new(detector));
        self
    }

    /// Use a custom anonymizer
    pub fn with_anonymizer(mut self, anonymizer: impl Anonymizer + 'static) -> Self {
        self.anonymizer = Some(Box::new(anonymizer));
        self
    }

    /// Build the Guard
    pub fn build(self) -> Result<Guard> {
        let GuardBuilder {
            config,
            detector,
            anonymizer,
        } = self;

        match (detector, anonymizer) {
            (Some(detector), Some(anonymizer)) => Ok(Guard::with_components(config, detector, anonymizer)),
            (detector, anonymizer) => {
                let base = Guard::new(config)?;
                Ok(Guard::with_components(
                    base.config,
                    detector.unwrap_or(base.detector),
                    anonymizer.unwrap_or(base.anonymizer),
                ))
            }
        }
    }
}

impl Default for GuardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnonymizedText, EntityType, Span};
    use async_trait::async_trait;

    struct FailingDetector;

    #[async_trait]
    impl Detector for FailingDetector {
        async fn analyze(&self, _text: &str, _language: &str) -> Result<Vec<Span>> {
            Err(GuardError::ConfigError("analyzer offline".to_string()))
        }
    }

    struct FixedDetector(Vec<Span>);

    #[async_trait]
    impl Detector for FixedDetector {
        async fn analyze(&self, _text: &str, _language: &str) -> Result<Vec<Span>> {
            Ok(self.0.clone())
        }
    }

    struct EchoAnonymizer;

    #[async_trait]
    impl Anonymizer for EchoAnonymizer {
        async fn anonymize(&self, text: &str, _spans: &[Span]) -> Result<AnonymizedText> {
            Ok(AnonymizedText {
                text: text.to_string(),
                applied: vec![],
            })
        }
    }

    struct RecordingAnonymizer(std::sync::Arc<std::sync::Mutex<Vec<Span>>>);

    #[async_trait]
    impl Anonymizer for RecordingAnonymizer {
        async fn anonymize(&self, text: &str, spans: &[Span]) -> Result<AnonymizedText> {
            self.0.lock().unwrap().extend_from_slice(spans);
            PlaceholderAnonymizer::default().apply(text, spans)
        }
    }

    struct UnreachableAnonymizer;

    #[async_trait]
    impl Anonymizer for UnreachableAnonymizer {
        async fn anonymize(&self, _text: &str, _spans: &[Span]) -> Result<AnonymizedText> {
            Err(GuardError::ConfigError("anonymizer offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_clean_input() {
        let guard = Guard::new(GuardConfig::minimal()).unwrap();
        let result = guard.sanitize("Hello, how are you?").await.unwrap();

        assert!(matches!(result, SanitizeResult::Clean(_)));
        assert_eq!(result.text(), "Hello, how are you?");
    }

    #[tokio::test]
    async fn test_pii_redaction() {
        let guard = Guard::new(GuardConfig::minimal()).unwrap();
        let result = guard
            .sanitize("Contact John Smith at 555-123-4567.")
            .await
            .unwrap();

        assert!(result.is_modified());
        assert_eq!(result.text(), "Contact <PERSON> at <PHONE_NUMBER>.");
        assert_eq!(result.spans().len(), 2);
    }

    #[tokio::test]
    async fn test_redacting_twice_is_a_no_op() {
        let guard = Guard::new(GuardConfig::minimal()).unwrap();
        let once = guard.sanitize("Write to ana@example.com").await.unwrap();
        let twice = guard.sanitize(once.text()).await.unwrap();

        assert!(!twice.is_modified());
        assert_eq!(twice.text(), once.text());
    }

    #[tokio::test]
    async fn test_detector_failure_is_typed() {
        let guard = Guard::builder()
            .with_config(GuardConfig::minimal())
            .with_detector(FailingDetector)
            .build()
            .unwrap();

        let err = guard.sanitize("anything").await.unwrap_err();
        assert!(err.is_detector_failure());
    }

    #[tokio::test]
    async fn test_anonymizer_failure_is_typed() {
        let guard = Guard::builder()
            .with_config(GuardConfig::minimal())
            .with_detector(FixedDetector(vec![Span::new(0, 99, EntityType::Person, 1.0)]))
            .build()
            .unwrap();

        let err = guard.sanitize("short").await.unwrap_err();
        assert!(matches!(err, GuardError::AnonymizerFailure(_)));
    }

    #[tokio::test]
    async fn test_overlaps_resolved_before_anonymizer() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let guard = Guard::builder()
            .with_config(GuardConfig::minimal())
            .with_detector(FixedDetector(vec![
                Span::new(0, 4, EntityType::Person, 0.6),
                Span::new(2, 12, EntityType::PhoneNumber, 0.8),
                Span::new(5, 9, EntityType::UsSsn, 0.9),
            ]))
            .with_anonymizer(RecordingAnonymizer(seen.clone()))
            .build()
            .unwrap();

        let result = guard.sanitize("012345678901 tail").await.unwrap();
        assert_eq!(result.text(), "01<PHONE_NUMBER> tail");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].entity_type, EntityType::PhoneNumber);
    }

    #[tokio::test]
    async fn test_failures_are_tagged_with_their_stage() {
        let detector_down = Guard::builder()
            .with_config(GuardConfig::minimal())
            .with_detector(FailingDetector)
            .build()
            .unwrap();
        let err = detector_down.sanitize("anything").await.unwrap_err();
        assert!(err.is_detector_failure());
        assert!(!err.is_anonymizer_failure());

        let anonymizer_down = Guard::builder()
            .with_config(GuardConfig::minimal())
            .with_detector(FixedDetector(vec![Span::new(0, 3, EntityType::Person, 1.0)]))
            .with_anonymizer(UnreachableAnonymizer)
            .build()
            .unwrap();
        let err = anonymizer_down.sanitize("Ann here").await.unwrap_err();
        assert!(err.is_anonymizer_failure());
        assert!(!err.is_detector_failure());
    }

    #[tokio::test]
    async fn test_unchanged_anonymizer_output_counts_as_clean() {
        let guard = Guard::builder()
            .with_config(GuardConfig::minimal())
            .with_detector(FixedDetector(vec![Span::new(0, 2, EntityType::Person, 1.0)]))
            .with_anonymizer(EchoAnonymizer)
            .build()
            .unwrap();

        let result = guard.sanitize("Jo").await.unwrap();
        assert!(!result.is_modified());
    }

    #[tokio::test]
    async fn test_context() {
        let guard = Guard::new(GuardConfig::full()).unwrap();
        let context = GuardContext::new()
            .with_source("notes.txt")
            .with_unit("document");

        let result = guard
            .sanitize_with_context("Hello", &context)
            .await
            .unwrap();

        assert!(matches!(result, SanitizeResult::Clean(_)));
    }
}
