//! BoxLlmProvider -- object-safe dynamic dispatch wrapper for LlmProvider.
//!
//! 1. Define an object-safe `LlmProviderDyn` trait with boxed futures
//! 2. Blanket-impl `LlmProviderDyn` for all `T: LlmProvider`
//! 3. `BoxLlmProvider` wraps `Box<dyn LlmProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use switchboard_types::llm::{ChatOptions, ChatResponse, LlmError, Message};
use switchboard_types::usage::TokenUsage;

use super::provider::{EventStream, LlmProvider};
use super::stream::ChatStream;

/// Object-safe version of [`LlmProvider`] with boxed futures.
pub trait LlmProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn is_available_boxed<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

    fn chat_boxed<'a>(
        &'a self,
        messages: &'a [Message],
        options: &'a ChatOptions,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>>;

    fn chat_stream_boxed(&self, messages: Vec<Message>, options: ChatOptions) -> EventStream;

    fn estimate_cost(&self, usage: &TokenUsage, model: &str) -> f64;
}

/// Blanket implementation: any `LlmProvider` automatically implements `LlmProviderDyn`.
impl<T: LlmProvider> LlmProviderDyn for T {
    fn name(&self) -> &str {
        LlmProvider::name(self)
    }

    fn is_available_boxed<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(self.is_available())
    }

    fn chat_boxed<'a>(
        &'a self,
        messages: &'a [Message],
        options: &'a ChatOptions,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.chat(messages, options))
    }

    fn chat_stream_boxed(&self, messages: Vec<Message>, options: ChatOptions) -> EventStream {
        self.chat_stream(messages, options)
    }

    fn estimate_cost(&self, usage: &TokenUsage, model: &str) -> f64 {
        LlmProvider::estimate_cost(self, usage, model)
    }
}

/// Type-erased LLM provider for runtime provider selection.
///
/// Since `LlmProvider` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxLlmProvider` provides equivalent methods that delegate to
/// the inner `LlmProviderDyn` trait object.
pub struct BoxLlmProvider {
    inner: Box<dyn LlmProviderDyn + Send + Sync>,
}

impl BoxLlmProvider {
    /// Wrap a concrete `LlmProvider` in a type-erased box.
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn is_available(&self) -> bool {
        self.inner.is_available_boxed().await
    }

    pub async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        self.inner.chat_boxed(messages, options).await
    }

    /// Start a streaming call. Usage is captured by the returned [`ChatStream`].
    pub fn chat_stream(&self, messages: Vec<Message>, options: ChatOptions) -> ChatStream {
        ChatStream::new(self.inner.chat_stream_boxed(messages, options))
    }

    pub fn estimate_cost(&self, usage: &TokenUsage, model: &str) -> f64 {
        self.inner.estimate_cost(usage, model)
    }
}

impl std::fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("name", &self.name())
            .finish()
    }
}
