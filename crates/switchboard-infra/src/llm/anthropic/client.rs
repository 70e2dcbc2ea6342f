//! AnthropicProvider -- concrete [`LlmProvider`] implementation for Anthropic Claude.
//!
//! Sends requests to the Anthropic Messages API (`/v1/messages`) with
//! the required authentication headers. The model comes from
//! [`ChatOptions::model`] on every call, so one provider serves every
//! Claude candidate in the routing table.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use switchboard_core::cost::PricingTable;
use switchboard_core::llm::{EventStream, LlmProvider};
use switchboard_types::llm::{ChatOptions, ChatResponse, LlmError, Message, MessageRole, StopReason};
use switchboard_types::usage::TokenUsage;

use super::streaming::create_anthropic_stream;
use super::types::{
    AnthropicContentBlock, AnthropicMessage, AnthropicNonStreamResponse, AnthropicRequest,
    ErrorPayload,
};

/// The Anthropic API version header value.
pub(crate) const API_VERSION: &str = "2023-06-01";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic Claude LLM provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    name: String,
    api_key: Option<SecretString>,
    base_url: String,
    pricing: PricingTable,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    ///
    /// A missing key is accepted so the provider can still be constructed;
    /// [`is_available`](LlmProvider::is_available) then reports `false` and
    /// calls fail with `AuthenticationFailed`.
    pub fn new(api_key: Option<SecretString>, pricing: PricingTable) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            name: "anthropic".to_string(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            pricing,
        })
    }

    /// Override the base URL (proxies, gateways, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the display name used in logs and the ledger.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn key(&self) -> Result<&SecretString, LlmError> {
        self.api_key
            .as_ref()
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or(LlmError::AuthenticationFailed)
    }

    /// Convert messages and options into an [`AnthropicRequest`].
    ///
    /// System messages in the history are folded into the top-level `system`
    /// field, since the Messages API only accepts user/assistant turns.
    fn to_anthropic_request(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        stream: bool,
    ) -> AnthropicRequest {
        let mut system_parts: Vec<&str> = options.system.iter().map(String::as_str).collect();
        let mut turns = Vec::with_capacity(messages.len());

        for m in messages {
            match m.role {
                MessageRole::System => system_parts.push(&m.content),
                MessageRole::User | MessageRole::Assistant => turns.push(AnthropicMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                }),
            }
        }

        AnthropicRequest {
            model: options.model.clone(),
            max_tokens: options.max_tokens,
            messages: turns,
            system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
            stream,
            temperature: options.temperature,
            stop_sequences: options.stop_sequences.clone(),
        }
    }
}

/// Map a non-2xx HTTP status (and its body) to an [`LlmError`].
pub(crate) fn error_for_status(status: reqwest::StatusCode, body: String) -> LlmError {
    let message = serde_json::from_str::<ErrorPayload>(&body)
        .map(|p| p.error.message)
        .unwrap_or(body);

    match status.as_u16() {
        400 | 404 | 413 => LlmError::InvalidRequest(message),
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        529 => LlmError::Overloaded(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

pub(crate) fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        Some("tool_use") => StopReason::ToolUse,
        _ => StopReason::EndTurn,
    }
}

// No Debug derive: the SecretString already redacts, but the provider is
// never meant to be printed.

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        self.key().is_ok()
    }

    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse, LlmError> {
        let api_key = self.key()?;
        let body = self.to_anthropic_request(messages, options, false);

        let response = self
            .client
            .post(self.url("/v1/messages"))
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Unavailable(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, error_body));
        }

        let anthropic_resp: AnthropicNonStreamResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let content = anthropic_resp
            .content
            .iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text.as_str()),
                AnthropicContentBlock::Other => None,
            })
            .collect::<String>();

        tracing::debug!(message_id = %anthropic_resp.id, model = %anthropic_resp.model, "Anthropic response received");

        Ok(ChatResponse {
            content,
            model: anthropic_resp.model,
            stop_reason: map_stop_reason(anthropic_resp.stop_reason.as_deref()),
            usage: TokenUsage::new(
                anthropic_resp.usage.input_tokens,
                anthropic_resp.usage.output_tokens,
            ),
        })
    }

    fn chat_stream(&self, messages: Vec<Message>, options: ChatOptions) -> EventStream {
        let api_key = match self.key() {
            Ok(key) => key.clone(),
            Err(e) => return Box::pin(futures_util::stream::once(async move { Err(e) })),
        };
        let body = self.to_anthropic_request(&messages, &options, true);
        create_anthropic_stream(&self.client, &self.url("/v1/messages"), body, &api_key)
    }

    fn estimate_cost(&self, usage: &TokenUsage, model: &str) -> f64 {
        self.pricing.cost(usage, model)
    }
}
