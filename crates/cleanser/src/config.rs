//! Layered configuration for the cleanser

use crate::error::{PipelineError, Result};

use cleanser_extract::{ExtractorConfig, TableRedactionMode};
use cleanser_guard::GuardConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up under the platform config directory
pub const CONFIG_FILE_NAME: &str = "cleanser.toml";

/// Complete cleanser configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanserConfig {
    /// Extraction limits and OCR settings
    pub extract: ExtractorConfig,
    /// PII detection backend, entity toggles and audit logging
    pub guard: GuardConfig,
    /// Orchestration switches
    pub pipeline: PipelineConfig,
    /// LLM summarization backend
    pub summary: SummaryConfig,
}

impl CleanserConfig {
    /// `<config_dir>/cleanser/cleanser.toml`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cleanser").join(CONFIG_FILE_NAME))
    }

    /// Load from `path` if given, else from the default location when it
    /// exists, else fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write the config as pretty TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_summary(mut self, summary: SummaryConfig) -> Self {
        self.summary = summary;
        self
    }
}

/// Orchestration switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ask the LLM for a summary of each redacted document
    pub summarize: bool,
    /// How spreadsheet rows are redacted
    pub table_mode: TableRedactionMode,
    /// Emit a plain-text artifact when the original format cannot be rebuilt
    pub text_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            summarize: true,
            table_mode: TableRedactionMode::Row,
            text_fallback: true,
        }
    }
}

impl PipelineConfig {
    pub fn with_summarize(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    pub fn with_table_mode(mut self, mode: TableRedactionMode) -> Self {
        self.table_mode = mode;
        self
    }

    pub fn with_text_fallback(mut self, enabled: bool) -> Self {
        self.text_fallback = enabled;
        self
    }
}

/// OpenAI-compatible chat completion backend (Groq by default)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Base URL; `/chat/completions` is appended
    pub api_base: String,
    pub model: String,
    /// Environment variable holding the bearer token
    pub api_key_env: String,
    /// Completion length bound
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            max_tokens: 500,
            timeout_secs: 30,
        }
    }
}

impl SummaryConfig {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
[pipeline]
summarize = false
table_mode = "cell"

[guard.pii]
detect_ip = false

[summary]
max_tokens = 200
"#,
        )
        .unwrap();

        let config = CleanserConfig::load(Some(&path)).unwrap();
        assert!(!config.pipeline.summarize);
        assert!(config.pipeline.text_fallback);
        assert_eq!(config.pipeline.table_mode, TableRedactionMode::Cell);
        assert!(!config.guard.pii.detect_ip);
        assert!(config.guard.pii.detect_email);
        assert_eq!(config.summary.max_tokens, 200);
        assert_eq!(config.summary.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.extract.max_input_bytes, ExtractorConfig::default().max_input_bytes);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = CleanserConfig::default()
            .with_summary(SummaryConfig::default().with_model("llama-3.1-8b-instant"));
        config.save(&path).unwrap();

        let loaded = CleanserConfig::from_file(&path).unwrap();
        assert_eq!(loaded.summary.model, "llama-3.1-8b-instant");
        assert_eq!(loaded.guard.pii.language, "en");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[pipeline]\nsummarize = \"maybe\"").unwrap();

        let err = CleanserConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
