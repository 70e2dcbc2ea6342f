//! Configuration for OpenAI-compatible providers.
//!
//! Any gateway that speaks the chat completions protocol (OpenAI itself,
//! OpenRouter, Gemini's compatibility endpoint, Mistral, a local proxy) is
//! reached by pointing [`OpenAiCompatConfig::base_url`] at it.

use secrecy::SecretString;

/// Base URL used when `[provider] base_url` is not set.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openai", "openrouter").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    /// API key for authentication, if one was found.
    pub api_key: Option<SecretString>,
}

impl OpenAiCompatConfig {
    pub fn new(provider_name: impl Into<String>, base_url: Option<&str>, api_key: Option<SecretString>) -> Self {
        Self {
            provider_name: provider_name.into(),
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            api_key,
        }
    }
}
