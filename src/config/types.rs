//! Configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// AI provider kind.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Claude,
}

/// Configuration for the AI summarization client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider to use (gemini or claude).
    #[serde(default)]
    pub provider: ProviderKind,
    /// Model to use for summaries.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Base URL for the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable name for the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_model() -> String {
    "gemini-3-flash".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Retry policy for summarization calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per call.
    pub max_retries: u32,
    /// Base delay between attempts; attempt N sleeps `base_delay * N`.
    pub base_delay_ms: u64,
}

impl RetryConfig {
    /// Base delay as a [`Duration`].
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Watch-loop timing settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Seconds between scheduled checks.
    pub interval_secs: u64,
    /// Seconds between existence polls while the file is absent.
    pub file_wait_secs: u64,
}

impl WatchSettings {
    /// Check interval as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// File-wait backoff as a [`Duration`].
    #[must_use]
    pub fn file_wait(&self) -> Duration {
        Duration::from_secs(self.file_wait_secs)
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            file_wait_secs: 5,
        }
    }
}
