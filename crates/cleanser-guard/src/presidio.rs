//! Presidio analyzer/anonymizer REST backend
//!
//! Presidio reports offsets in characters; spans inside this crate use byte
//! offsets, so both directions are converted here.

use crate::config::PresidioConfig;
use crate::error::{GuardError, Result};
use crate::types::{AnonymizedText, EntityType, Span};
use crate::{Anonymizer, Detector};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// HTTP client for a Presidio analyzer/anonymizer pair
#[derive(Clone)]
pub struct PresidioClient {
    config: PresidioConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
struct PresidioSpan {
    start: usize,
    end: usize,
    entity_type: String,
    score: f32,
}

#[derive(Debug, Serialize)]
struct AnonymizeRequest<'a> {
    text: &'a str,
    analyzer_results: Vec<PresidioSpan>,
}

#[derive(Debug, Deserialize)]
struct AnonymizeResponse {
    text: String,
}

impl PresidioClient {
    /// Create a client for the configured endpoints
    pub fn new(config: PresidioConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { config, client })
    }

    fn endpoint(base: &str, path: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Detector for PresidioClient {
    async fn analyze(&self, text: &str, language: &str) -> Result<Vec<Span>> {
        let url = Self::endpoint(&self.config.analyzer_url, "analyze");
        debug!(url = %url, "Calling Presidio analyzer");

        let response = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { text, language })
            .send()
            .await
            .map_err(|e| GuardError::DetectorFailure(format!("Analyzer request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GuardError::DetectorFailure(format!(
                "Analyzer returned status: {}",
                response.status()
            )));
        }

        let raw: Vec<PresidioSpan> = response.json().await.map_err(|e| {
            GuardError::DetectorFailure(format!("Failed to parse analyzer response: {}", e))
        })?;

        let offsets = CharOffsets::new(text);
        raw.into_iter()
            .map(|s| {
                let start = offsets.char_to_byte(s.start);
                let end = offsets.char_to_byte(s.end);
                match (start, end) {
                    (Some(start), Some(end)) if start <= end => Ok(Span::new(
                        start,
                        end,
                        EntityType::from_label(&s.entity_type),
                        s.score,
                    )),
                    _ => Err(GuardError::DetectorFailure(format!(
                        "Analyzer span {}..{} is outside the text",
                        s.start, s.end
                    ))),
                }
            })
            .collect()
    }
}

#[async_trait]
impl Anonymizer for PresidioClient {
    async fn anonymize(&self, text: &str, spans: &[Span]) -> Result<AnonymizedText> {
        let offsets = CharOffsets::new(text);
        let mut analyzer_results = Vec::with_capacity(spans.len());
        for span in spans {
            match (offsets.byte_to_char(span.start), offsets.byte_to_char(span.end)) {
                (Some(start), Some(end)) => analyzer_results.push(PresidioSpan {
                    start,
                    end,
                    entity_type: span.entity_type.to_string(),
                    score: span.score,
                }),
                _ => {
                    return Err(GuardError::InvalidSpan {
                        start: span.start,
                        end: span.end,
                        len: text.len(),
                    })
                }
            }
        }

        let url = Self::endpoint(&self.config.anonymizer_url, "anonymize");
        debug!(url = %url, spans = spans.len(), "Calling Presidio anonymizer");

        let response = self
            .client
            .post(&url)
            .json(&AnonymizeRequest {
                text,
                analyzer_results,
            })
            .send()
            .await
            .map_err(|e| GuardError::AnonymizerFailure(format!("Anonymizer request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GuardError::AnonymizerFailure(format!(
                "Anonymizer returned status: {}",
                response.status()
            )));
        }

        let body: AnonymizeResponse = response.json().await.map_err(|e| {
            GuardError::AnonymizerFailure(format!("Failed to parse anonymizer response: {}", e))
        })?;

        Ok(AnonymizedText {
            text: body.text,
            applied: crate::anonymize::resolve_overlaps(spans.to_vec()),
        })
    }
}

/// Maps between character and byte offsets of one string
struct CharOffsets {
    /// Byte offset of every character, plus the total length
    starts: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let mut starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        starts.push(text.len());
        Self { starts }
    }

    fn char_to_byte(&self, char_offset: usize) -> Option<usize> {
        self.starts.get(char_offset).copied()
    }

    fn byte_to_char(&self, byte_offset: usize) -> Option<usize> {
        self.starts.binary_search(&byte_offset).ok()
    }
}
