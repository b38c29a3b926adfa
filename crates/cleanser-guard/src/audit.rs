//! Audit logging for Guard

use crate::config::AuditConfig;
use crate::types::{AuditEntry, AuditResult, GuardContext, SanitizeResult};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{info, warn};

/// Audit logger
pub struct AuditLogger {
    config: AuditConfig,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Log a completed sanitization
    pub fn log(
        &self,
        context: &GuardContext,
        content: &str,
        result: &SanitizeResult,
        duration_ms: u64,
    ) -> Option<AuditEntry> {
        if !self.config.enabled {
            return None;
        }

        let entry = AuditEntry {
            context: context.clone(),
            content_hash: hash_content(content),
            result: match result {
                SanitizeResult::Clean(_) => AuditResult::Passed,
                SanitizeResult::Redacted { spans, .. } => AuditResult::Redacted {
                    count: spans.len(),
                    entity_types: spans.iter().map(|s| s.entity_type.to_string()).collect(),
                },
            },
            processing_time_ms: duration_ms,
        };

        self.emit(&entry, content);
        Some(entry)
    }

    /// Log a detector or anonymizer failure
    pub fn log_failure(&self, context: &GuardContext, content: &str, reason: &str) -> Option<AuditEntry> {
        if !self.config.enabled {
            return None;
        }

        let entry = AuditEntry {
            context: context.clone(),
            content_hash: hash_content(content),
            result: AuditResult::Failed {
                reason: reason.to_string(),
            },
            processing_time_ms: 0,
        };

        warn!(
            request_id = %context.request_id,
            source = ?context.source,
            unit = ?context.unit,
            reason = reason,
            "Redaction failed"
        );

        Some(entry)
    }

    fn emit(&self, entry: &AuditEntry, content: &str) {
        let content_field = if self.config.log_content {
            Some(truncate(content, 500))
        } else {
            None
        };

        info!(
            request_id = %entry.context.request_id,
            source = ?entry.context.source,
            unit = ?entry.context.unit,
            content_hash = %entry.content_hash,
            result = ?entry.result,
            processing_time_ms = entry.processing_time_ms,
            content = ?content_field,
            "Redaction audit"
        );
    }
}

/// Hash content for audit logging (without storing the original)
fn hash_content(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Truncate on a character boundary
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
