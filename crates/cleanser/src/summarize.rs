//! LLM summarization seam and the OpenAI-compatible chat completion client

use crate::config::SummaryConfig;
use crate::error::{PipelineError, Result};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shown in place of a summary when the backend fails
pub const SUMMARY_UNAVAILABLE: &str = "AI summary unavailable.";

/// Prompt sent to the model for `text`
pub fn summary_prompt(text: &str) -> String {
    format!(
        "You are an AI assistant. Summarize the following text concisely:\n\n{}",
        text
    )
}

/// Produces a bounded-length completion for a prompt
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Outcome of summarizing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    Generated { text: String },
    Unavailable { reason: String },
}

impl Summary {
    /// Text to show the user; the placeholder when unavailable
    pub fn text(&self) -> &str {
        match self {
            Summary::Generated { text } => text,
            Summary::Unavailable { .. } => SUMMARY_UNAVAILABLE,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Summary::Generated { .. })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Summarize `text`, folding every failure into [`Summary::Unavailable`]. No retries.
pub async fn summarize(summarizer: &dyn Summarizer, text: &str, max_tokens: u32) -> Summary {
    match summarizer.complete(&summary_prompt(text), max_tokens).await {
        Ok(completion) if !completion.trim().is_empty() => Summary::Generated { text: completion },
        Ok(_) => {
            warn!("Summarizer returned an empty completion");
            Summary::Unavailable {
                reason: "empty completion".to_string(),
            }
        }
        Err(e) => {
            warn!(error = %e, "Summarization failed");
            Summary::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion client for Groq and other OpenAI-compatible endpoints
pub struct GroqSummarizer {
    config: SummaryConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GroqSummarizer {
    /// Build a client, reading the API key from the configured environment variable.
    ///
    /// A missing key is not an error here; each call then fails and the
    /// pipeline shows the placeholder.
    pub fn new(config: SummaryConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(env = %config.api_key_env, "Summarizer API key not set");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Use an explicit API key instead of the environment
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Summarizer for GroqSummarizer {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PipelineError::Summarization(format!("{} is not set", self.config.api_key_env))
        })?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };

        let endpoint = self.endpoint();
        debug!(url = %endpoint, model = %self.config.model, "Requesting summary");
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Summarization(format!(
                "backend error ({}): {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Summarization("no choices in response".to_string()))?;

        info!(model = %self.config.model, chars = content.chars().count(), "Summary generated");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoLength;

    #[async_trait]
    impl Summarizer for EchoLength {
        async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
            Ok(format!("{} chars, {} tokens", prompt.len(), max_tokens))
        }
    }

    struct Down;

    #[async_trait]
    impl Summarizer for Down {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            Err(PipelineError::Summarization("503".to_string()))
        }
    }

    #[test]
    fn test_prompt() {
        assert_eq!(
            summary_prompt("<PERSON> called."),
            "You are an AI assistant. Summarize the following text concisely:\n\n<PERSON> called."
        );
    }

    #[tokio::test]
    async fn test_summarize_passes_prompt_and_bound() {
        let summary = summarize(&EchoLength, "abc", 500).await;
        let expected = format!("{} chars, 500 tokens", summary_prompt("abc").len());
        assert_eq!(summary, Summary::Generated { text: expected });
    }

    #[tokio::test]
    async fn test_failure_becomes_placeholder() {
        let summary = summarize(&Down, "abc", 500).await;
        assert!(!summary.is_available());
        assert_eq!(summary.text(), SUMMARY_UNAVAILABLE);
        assert_eq!(summary.to_string(), "AI summary unavailable.");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_error() {
        let config = SummaryConfig {
            api_base: "http://127.0.0.1:9/v1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let summarizer = GroqSummarizer::new(config).unwrap().with_api_key("test-key");

        assert_eq!(summarizer.endpoint(), "http://127.0.0.1:9/v1/chat/completions");
        assert!(summarizer.complete("hi", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_key_is_summarization_error() {
        let config = SummaryConfig {
            api_key_env: "CLEANSER_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..Default::default()
        };
        let summarizer = GroqSummarizer::new(config).unwrap();

        let err = summarizer.complete("hi", 10).await.unwrap_err();
        assert!(matches!(err, PipelineError::Summarization(_)));
    }
}
