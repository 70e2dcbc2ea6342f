//! LlmProvider trait definition.
//!
//! This is the only contract a backend has to satisfy to be routed to.
//! Uses RPITIT for `chat` and `is_available`, and a boxed stream for
//! `chat_stream` (streams need to be object-safe for the `BoxLlmProvider`
//! wrapper).

use std::pin::Pin;

use futures_util::Stream;

use switchboard_types::llm::{ChatOptions, ChatResponse, LlmError, Message, StreamEvent};
use switchboard_types::usage::TokenUsage;

use crate::cost::pricing::PricingTable;

/// Boxed stream of provider events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for LLM provider backends (Anthropic, OpenAI-compatible gateways, ...).
///
/// Wire protocol, auth and endpoint are provider-internal. The model to use
/// is always taken from `ChatOptions::model`, which the orchestrator fills in
/// per attempt.
///
/// Implementations live in switchboard-infra (e.g., `AnthropicProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic", "openrouter").
    fn name(&self) -> &str;

    /// Whether the provider is configured well enough to accept calls.
    fn is_available(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Send a chat request and receive the full response.
    fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> impl std::future::Future<Output = Result<ChatResponse, LlmError>> + Send;

    /// Send a streaming chat request. Token usage arrives as a
    /// `StreamEvent::Usage` before `Done`.
    fn chat_stream(&self, messages: Vec<Message>, options: ChatOptions) -> EventStream;

    /// Cost in USD of a call. Defaults to the built-in pricing table.
    fn estimate_cost(&self, usage: &TokenUsage, model: &str) -> f64 {
        PricingTable::default().cost(usage, model)
    }
}
