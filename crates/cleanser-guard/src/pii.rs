//! Pattern-based PII detection

use crate::anonymize::resolve_overlaps;
use crate::config::PiiConfig;
use crate::error::Result;
use crate::types::{EntityType, Span};
use crate::Detector;

use async_trait::async_trait;
use regex::Regex;

/// Capitalized words that start sentences or label fields far more often than
/// they start a name.
const NON_NAME_WORDS: &[&str] = &[
    "A", "About", "Account", "Address", "After", "All", "An", "And", "Any", "As", "At",
    "Before", "But", "By", "Call", "Contact", "Customer", "Date", "Dear", "Email", "For",
    "From", "Good", "Hello", "Her", "Hi", "His", "If", "In", "Is", "It", "Its", "Meeting",
    "My", "Name", "No", "Note", "Of", "On", "Or", "Our", "Page", "Phone", "Please",
    "Project", "Regards", "Report", "Section", "See", "Sheet", "Sincerely", "So", "Table",
    "Team", "Thank", "Thanks", "That", "The", "Their", "Then", "These", "They", "This",
    "Those", "To", "Total", "We", "When", "Where", "With", "You", "Your", "Monday",
    "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday", "January",
    "February", "March", "April", "May", "June", "July", "August", "September", "October",
    "November", "December",
];

/// Regex-backed detector for the common PII shapes.
pub struct PatternDetector {
    config: PiiConfig,
    patterns: PiiPatterns,
}

struct PiiPatterns {
    ssn: Regex,
    credit_card: Regex,
    email: Regex,
    phone: Regex,
    ip_v4: Regex,
    ip_v6: Regex,
    api_key: Regex,
    name_run: Regex,
    titled_name: Regex,
    word: Regex,
}

impl PiiPatterns {
    fn new() -> Self {
        Self {
            // SSN: 123-45-6789 or 123456789
            ssn: Regex::new(r"\b\d{3}[-\s]?\d{2}[-\s]?\d{4}\b").unwrap(),
            // Credit cards: 16 digits with optional separators
            credit_card: Regex::new(r"\b(?:\d{4}[-\s]?){3}\d{4}\b|\b\d{15,16}\b").unwrap(),
            email: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap(),
            phone: Regex::new(
                r"(?:\+?1[-.\s]?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b",
            )
            .unwrap(),
            ip_v4: Regex::new(
                r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
            )
            .unwrap(),
            ip_v6: Regex::new(r"\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b").unwrap(),
            api_key: Regex::new(
                r#"\b(?:sk-[a-zA-Z0-9]{20,}|api[_-]?key[=:\s]+['"]?[a-zA-Z0-9_-]{20,}['"]?)"#,
            )
            .unwrap(),
            // Two or more capitalized words separated by spaces or tabs
            name_run: Regex::new(r"\b[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)+\b").unwrap(),
            titled_name: Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?[ \t]+[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)?\b")
                .unwrap(),
            word: Regex::new(r"[A-Z][a-z]+").unwrap(),
        }
    }
}

impl PatternDetector {
    /// Create a new PII detector with the given configuration
    pub fn new(config: PiiConfig) -> Self {
        Self {
            config,
            patterns: PiiPatterns::new(),
        }
    }

    /// Detect all PII in the given text
    pub fn detect(&self, text: &str) -> Vec<Span> {
        if !self.config.enabled {
            return vec![];
        }

        let mut spans = vec![];

        if self.config.detect_ssn {
            push_matches(&mut spans, &self.patterns.ssn, text, EntityType::UsSsn, 0.85);
        }

        if self.config.detect_credit_card {
            for m in self.patterns.credit_card.find_iter(text) {
                // Only Luhn-valid numbers count as cards
                let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
                if luhn_check(&digits) {
                    spans.push(Span::new(m.start(), m.end(), EntityType::CreditCard, 1.0));
                }
            }
        }

        if self.config.detect_email {
            push_matches(&mut spans, &self.patterns.email, text, EntityType::EmailAddress, 1.0);
        }

        if self.config.detect_phone {
            push_matches(&mut spans, &self.patterns.phone, text, EntityType::PhoneNumber, 0.75);
        }

        if self.config.detect_ip {
            push_matches(&mut spans, &self.patterns.ip_v4, text, EntityType::IpAddress, 0.95);
            push_matches(&mut spans, &self.patterns.ip_v6, text, EntityType::IpAddress, 0.95);
        }

        if self.config.detect_api_keys {
            push_matches(&mut spans, &self.patterns.api_key, text, EntityType::ApiKey, 0.9);
        }

        if self.config.detect_person {
            push_matches(&mut spans, &self.patterns.titled_name, text, EntityType::Person, 0.7);
            self.detect_name_runs(text, &mut spans);
        }

        spans.retain(|s| s.score >= self.config.min_score);
        resolve_overlaps(spans)
    }

    /// Runs of capitalized words, trimmed of words that rarely belong to a name.
    fn detect_name_runs(&self, text: &str, spans: &mut Vec<Span>) {
        for run in self.patterns.name_run.find_iter(text) {
            let words: Vec<(usize, usize)> = self
                .patterns
                .word
                .find_iter(run.as_str())
                .filter(|w| !NON_NAME_WORDS.contains(&w.as_str()))
                .map(|w| (run.start() + w.start(), run.start() + w.end()))
                .collect();

            // Stopwords inside the run split it; keep only contiguous survivors
            let mut group: Vec<(usize, usize)> = Vec::new();
            for (start, end) in words {
                let contiguous = group
                    .last()
                    .map(|&(_, prev_end)| text[prev_end..start].chars().all(|c| c == ' ' || c == '\t'))
                    .unwrap_or(true);
                if !contiguous {
                    flush_name_group(&mut group, spans);
                }
                group.push((start, end));
            }
            flush_name_group(&mut group, spans);
        }
    }
}

fn flush_name_group(group: &mut Vec<(usize, usize)>, spans: &mut Vec<Span>) {
    if group.len() >= 2 {
        let start = group[0].0;
        let end = group[group.len() - 1].1;
        spans.push(Span::new(start, end, EntityType::Person, 0.6));
    }
    group.clear();
}

fn push_matches(spans: &mut Vec<Span>, pattern: &Regex, text: &str, entity: EntityType, score: f32) {
    for m in pattern.find_iter(text) {
        spans.push(Span::new(m.start(), m.end(), entity.clone(), score));
    }
}

#[async_trait]
impl Detector for PatternDetector {
    async fn analyze(&self, text: &str, _language: &str) -> Result<Vec<Span>> {
        Ok(self.detect(text))
    }
}

/// Luhn algorithm for credit card validation
fn luhn_check(number: &str) -> bool {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 13 {
        return false;
    }

    let mut sum = 0;
    let mut double = false;

    for &digit in digits.iter().rev() {
        let mut d = digit;
        if double {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
        double = !double;
    }

    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> PatternDetector {
        PatternDetector::new(PiiConfig::default())
    }

    fn covered<'a>(text: &'a str, spans: &[Span]) -> Vec<&'a str> {
        spans.iter().map(|s| &text[s.start..s.end]).collect()
    }

    #[test]
    fn test_ssn_detection() {
        let text = "My SSN is 123-45-6789 and yours is 987654321";
        let spans = detector().detect(text);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].entity_type, EntityType::UsSsn);
    }

    #[test]
    fn test_email_detection() {
        let text = "Contact me at john.doe@example.com for more info";
        let spans = detector().detect(text);

        assert!(spans.iter().any(|s| s.entity_type == EntityType::EmailAddress));
        assert!(covered(text, &spans).contains(&"john.doe@example.com"));
    }

    #[test]
    fn test_phone_and_name() {
        let text = "Contact John Smith at 555-123-4567.";
        let spans = detector().detect(text);

        assert_eq!(covered(text, &spans), vec!["John Smith", "555-123-4567"]);
        assert_eq!(spans[0].entity_type, EntityType::Person);
        assert_eq!(spans[1].entity_type, EntityType::PhoneNumber);
    }

    #[test]
    fn test_parenthesized_phone() {
        let text = "Office: (555) 123-4567";
        let spans = detector().detect(text);
        assert_eq!(covered(text, &spans), vec!["(555) 123-4567"]);
    }

    #[test]
    fn test_titled_name() {
        let text = "Ask Dr. Watson about it";
        let spans = detector().detect(text);
        assert_eq!(covered(text, &spans), vec!["Dr. Watson"]);
    }

    #[test]
    fn test_stopword_only_runs_are_ignored() {
        let spans = detector().detect("Thank You for the Project Report");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_placeholders_are_not_detected() {
        let spans = detector().detect("Contact <PERSON> at <PHONE_NUMBER>.");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_disabled_detector_finds_nothing() {
        let config = PiiConfig {
            enabled: false,
            ..Default::default()
        };
        let spans = PatternDetector::new(config).detect("mail bob@example.com");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_min_score_filters_weak_spans() {
        let config = PiiConfig {
            min_score: 0.7,
            ..Default::default()
        };
        let text = "Call John Smith or bob@example.com";
        let spans = PatternDetector::new(config).detect(text);
        assert_eq!(covered(text, &spans), vec!["bob@example.com"]);
    }

    #[test]
    fn test_credit_card_luhn() {
        // Valid test card number
        assert!(luhn_check("4532015112830366"));
        // Invalid number
        assert!(!luhn_check("1234567890123456"));
    }
}
