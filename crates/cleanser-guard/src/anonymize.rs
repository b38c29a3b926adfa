//! Placeholder substitution of detected spans

use crate::error::{GuardError, Result};
use crate::types::{AnonymizedText, Span};
use crate::Anonymizer;

use async_trait::async_trait;

/// Reduce `spans` to a non-overlapping set ordered by start offset.
///
/// Single sweep in start order: a span overlapping the one currently held
/// replaces it only when longer, or equally long with a higher score, so ties
/// go to the earlier start.
pub fn resolve_overlaps(mut spans: Vec<Span>) -> Vec<Span> {
    spans.retain(|s| s.len() > 0);
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.len().cmp(&a.len()))
            .then(b.score.total_cmp(&a.score))
    });

    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    let mut current: Option<Span> = None;
    for span in spans {
        current = match current {
            Some(held) if held.overlaps(&span) => {
                let wins = span.len() > held.len()
                    || (span.len() == held.len() && span.score > held.score);
                Some(if wins { span } else { held })
            }
            Some(held) => {
                kept.push(held);
                Some(span)
            }
            None => Some(span),
        };
    }
    kept.extend(current);
    kept
}

/// Replaces each span with a type-labeled placeholder such as `<PERSON>`.
pub struct PlaceholderAnonymizer {
    format: String,
}

impl Default for PlaceholderAnonymizer {
    fn default() -> Self {
        Self::new("<{TYPE}>")
    }
}

impl PlaceholderAnonymizer {
    /// Create an anonymizer with a placeholder format (use {TYPE} for the label)
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    fn placeholder(&self, span: &Span) -> String {
        self.format.replace("{TYPE}", span.entity_type.label())
    }

    /// Substitute spans synchronously
    pub fn apply(&self, text: &str, spans: &[Span]) -> Result<AnonymizedText> {
        for span in spans {
            validate_span(text, span)?;
        }

        let applied = resolve_overlaps(spans.to_vec());
        if applied.is_empty() {
            return Ok(AnonymizedText {
                text: text.to_string(),
                applied,
            });
        }

        let mut result = String::with_capacity(text.len());
        let mut last_end = 0;

        for span in &applied {
            result.push_str(&text[last_end..span.start]);
            result.push_str(&self.placeholder(span));
            last_end = span.end;
        }
        result.push_str(&text[last_end..]);

        Ok(AnonymizedText {
            text: result,
            applied,
        })
    }
}

fn validate_span(text: &str, span: &Span) -> Result<()> {
    let fits = span.start <= span.end
        && span.end <= text.len()
        && text.is_char_boundary(span.start)
        && text.is_char_boundary(span.end);

    if fits {
        Ok(())
    } else {
        Err(GuardError::InvalidSpan {
            start: span.start,
            end: span.end,
            len: text.len(),
        })
    }
}

#[async_trait]
impl Anonymizer for PlaceholderAnonymizer {
    async fn anonymize(&self, text: &str, spans: &[Span]) -> Result<AnonymizedText> {
        self.apply(text, spans)
    }
}
