/*!
 * Translator abstraction and its concrete backends.
 *
 * A translator maps one segment's source text to the target language. It is
 * called once per segment; retries, caching and the failure policy live in
 * `BatchTranslator`.
 */

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::errors::TranslationError;
use crate::language_utils;
use crate::providers::Provider;
use crate::providers::ollama::{GenerationRequest, Ollama};

/// Maps a text span from one language to another
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate `text`; an error means this attempt failed
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError>;

    /// Short name used in logs
    fn name(&self) -> &str;

    /// Confirm the backend answers before a run sends it any segment
    async fn health_check(&self) -> Result<(), TranslationError> {
        Ok(())
    }
}

/// What to do when a segment cannot be translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and report the failing segment
    Abort,
    /// Keep the source text for that segment and carry on
    #[default]
    Fallback,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Fallback => write!(f, "fallback"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "fallback" => Ok(FailurePolicy::Fallback),
            _ => Err(format!("Invalid failure policy: {} (expected abort or fallback)", s)),
        }
    }
}

/// Returns the text unchanged; used for source-language output and `provider = none`
#[derive(Debug, Clone, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        _target_language: &str,
    ) -> Result<String, TranslationError> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

/// Translator backed by an Ollama model
#[derive(Debug, Clone)]
pub struct OllamaTranslator {
    client: Ollama,
    model: String,
    system_prompt: String,
    temperature: f32,
}

impl OllamaTranslator {
    /// Create a translator for `endpoint`; `system_prompt` may use
    /// `{source_language}` and `{target_language}` placeholders
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, TranslationError> {
        Ok(Self {
            client: Ollama::new(endpoint, timeout)?,
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature,
        })
    }

    /// Build the generate request for one segment
    pub fn build_request(&self, text: &str, source_language: &str, target_language: &str) -> GenerationRequest {
        let source_name = display_language(source_language);
        let target_name = display_language(target_language);
        let system = self
            .system_prompt
            .replace("{source_language}", &source_name)
            .replace("{target_language}", &target_name);

        GenerationRequest::new(&self.model, text)
            .system(system)
            .temperature(self.temperature)
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let request = self.build_request(text, source_language, target_language);
        let started = Instant::now();
        let response = self.client.complete(request).await?;
        debug!("Ollama response received in {:?}", started.elapsed());

        let translated = Ollama::extract_text(&response);
        if translated.is_empty() {
            return Err(TranslationError::EmptyResponse(text.to_string()));
        }
        Ok(translated)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<(), TranslationError> {
        self.client.test_connection().await.map_err(TranslationError::from)
    }
}

/// Human-readable language name for prompts, falling back to the code itself
fn display_language(code: &str) -> String {
    language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string())
}
