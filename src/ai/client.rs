//! Multi-provider AI client for log summarization.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use thiserror::Error;

use crate::config::{AiConfig, ProviderKind, RetryConfig};

use super::prompts::{format_log_excerpt, SUMMARIZER_SYSTEM_PROMPT};

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for HTTP requests.
///
/// Bounds each summarization attempt; the retry loop above it handles
/// transient failures.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build an HTTP client with proper timeout configuration.
fn build_http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
}

/// A summary produced by the AI provider.
///
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    /// Model-generated summary and fix suggestion.
    pub summary_text: String,
    /// Length of the raw text that was summarized, in bytes.
    pub original_length: usize,
    /// Length of the summary, in bytes.
    pub summary_length: usize,
    /// Model that produced the summary.
    pub model_identifier: String,
    /// When the summary was produced.
    pub produced_at: DateTime<Utc>,
}

/// Errors from a single provider call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API key not configured (env: {0})")]
    MissingApiKey(String),
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Summarization request timed out")]
    Timeout,
}

/// Errors from the summarization client.
#[derive(Error, Debug)]
pub enum SummarizeError {
    /// Input was empty or whitespace-only; checked before any network call
    /// and never retried.
    #[error("Cannot summarize empty content")]
    EmptyInput,
    /// All retry attempts failed.
    #[error("Summarization failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ProviderError,
    },
}

/// Trait for AI providers.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a response from the AI provider.
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}

/// Gemini API provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    #[must_use]
    pub fn new(base_url: String, api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: build_http_client(),
            base_url,
            api_key,
            model,
            max_tokens,
        }
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": user }]
            }],
            "systemInstruction": {
                "parts": [{ "text": system }]
            },
            "generationConfig": {
                "maxOutputTokens": self.max_tokens
            }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;

            // Extract text from Gemini response format
            return json["candidates"][0]["content"]["parts"][0]["text"]
                .as_str()
                .map(String::from)
                .ok_or_else(|| {
                    ProviderError::ParseError("No text in Gemini response".to_string())
                });
        }

        let text = response.text().await.unwrap_or_default();
        Err(ProviderError::RequestFailed(format!("HTTP {status}: {text}")))
    }
}

/// Claude API provider.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeProvider {
    /// Create a new Claude provider.
    #[must_use]
    pub fn new(base_url: String, api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: build_http_client(),
            base_url,
            api_key,
            model,
            max_tokens,
        }
    }
}

#[async_trait]
impl AiProvider for ClaudeProvider {
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": [{
                "role": "user",
                "content": user
            }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;

            // Extract text from Claude response format
            return json["content"][0]["text"]
                .as_str()
                .map(String::from)
                .ok_or_else(|| {
                    ProviderError::ParseError("No text in Claude response".to_string())
                });
        }

        let text = response.text().await.unwrap_or_default();
        Err(ProviderError::RequestFailed(format!("HTTP {status}: {text}")))
    }
}

/// Provider enum for dispatch.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(GeminiProvider),
    Claude(ClaudeProvider),
}

#[async_trait]
impl AiProvider for Provider {
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        match self {
            Self::Gemini(p) => p.generate(system, user).await,
            Self::Claude(p) => p.generate(system, user).await,
        }
    }
}

/// Trait for summarization, so the pipeline can be tested without a network.
#[async_trait]
pub trait Summarize: Send + Sync {
    /// Summarize the given raw log text.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::EmptyInput`] for empty or whitespace-only
    /// text and [`SummarizeError::RetriesExhausted`] when all attempts fail.
    async fn summarize(&self, text: &str) -> Result<SummaryResult, SummarizeError>;
}

/// Client wrapping an AI provider with bounded retry and linear backoff.
#[derive(Debug, Clone)]
pub struct Summarizer {
    provider: Provider,
    model: String,
    retry: RetryConfig,
}

impl Summarizer {
    /// Create a new summarizer with the given provider and retry policy.
    #[must_use]
    pub fn new(provider: Provider, model: String, retry: RetryConfig) -> Self {
        Self {
            provider,
            model,
            retry,
        }
    }

    /// Create a summarizer from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingApiKey`] if the configured API key
    /// environment variable is not set.
    pub fn from_config(config: &AiConfig, retry: RetryConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ProviderError::MissingApiKey(config.api_key_env.clone()))?;

        let provider = match config.provider {
            ProviderKind::Gemini => Provider::Gemini(GeminiProvider::new(
                config.base_url.clone(),
                api_key,
                config.model.clone(),
                config.max_tokens,
            )),
            ProviderKind::Claude => Provider::Claude(ClaudeProvider::new(
                config.base_url.clone(),
                api_key,
                config.model.clone(),
                config.max_tokens,
            )),
        };

        Ok(Self {
            provider,
            model: config.model.clone(),
            retry,
        })
    }

    /// Get the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Summarize for Summarizer {
    async fn summarize(&self, text: &str) -> Result<SummaryResult, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        let user_message = format_log_excerpt(text);
        let mut attempt = 1;
        loop {
            match self
                .provider
                .generate(SUMMARIZER_SYSTEM_PROMPT, &user_message)
                .await
            {
                Ok(summary_text) => {
                    return Ok(SummaryResult {
                        original_length: text.len(),
                        summary_length: summary_text.len(),
                        summary_text,
                        model_identifier: self.model.clone(),
                        produced_at: Utc::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        error = %e,
                        "Summarization attempt failed"
                    );
                    if attempt >= self.retry.max_retries {
                        return Err(SummarizeError::RetriesExhausted {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    // Linear backoff: base, 2*base, 3*base, ...
                    tokio::time::sleep(self.retry.base_delay() * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}
