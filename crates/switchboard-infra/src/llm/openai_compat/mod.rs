//! OpenAI-compatible LLM provider implementation.
//!
//! A single [`OpenAiCompatibleProvider`] serves OpenAI, OpenRouter, Gemini's
//! compatibility endpoint, Mistral and any other gateway speaking the chat
//! completions protocol, via a configurable base URL.
//!
//! Uses [`async_openai`] for type-safe request/response handling and
//! built-in SSE streaming.

pub mod config;
pub mod streaming;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, ChatCompletionStreamOptions,
    CreateChatCompletionRequest, StopConfiguration,
};
use secrecy::ExposeSecret;

use switchboard_core::cost::PricingTable;
use switchboard_core::llm::{EventStream, LlmProvider};
use switchboard_types::llm::{ChatOptions, ChatResponse, LlmError, Message, MessageRole, StopReason};
use switchboard_types::usage::TokenUsage;

use self::config::OpenAiCompatConfig;
use self::streaming::{map_finish_reason, map_openai_stream};

/// Unified provider for any OpenAI-compatible API.
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    has_key: bool,
    pricing: PricingTable,
}

impl OpenAiCompatibleProvider {
    /// Create a new OpenAI-compatible provider from a configuration.
    pub fn new(config: OpenAiCompatConfig, pricing: PricingTable) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_base(&config.base_url);
        let has_key = match &config.api_key {
            Some(key) if !key.expose_secret().is_empty() => {
                openai_config = openai_config.with_api_key(key.expose_secret());
                true
            }
            _ => false,
        };

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            has_key,
            pricing,
        }
    }

    /// Build a [`CreateChatCompletionRequest`] from messages and options.
    fn build_request(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        stream: bool,
    ) -> CreateChatCompletionRequest {
        let mut oai_messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(messages.len() + 1);

        if let Some(system) = &options.system {
            oai_messages.push(system_message(system));
        }

        for msg in messages {
            let oai_msg = match msg.role {
                MessageRole::System => system_message(&msg.content),
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        )),
                        refusal: None,
                        name: None,
                        audio: None,
                        tool_calls: None,
                        function_call: None,
                    })
                }
            };
            oai_messages.push(oai_msg);
        }

        let mut req = CreateChatCompletionRequest {
            model: options.model.clone(),
            messages: oai_messages,
            max_completion_tokens: Some(options.max_tokens),
            temperature: options.temperature.map(|t| t as f32),
            ..Default::default()
        };

        if let Some(stops) = &options.stop_sequences
            && !stops.is_empty()
        {
            req.stop = Some(StopConfiguration::StringArray(stops.clone()));
        }

        if stream {
            req.stream = Some(true);
            req.stream_options = Some(ChatCompletionStreamOptions {
                include_usage: Some(true),
                include_obfuscation: None,
            });
        }

        req
    }
}

fn system_message(content: &str) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
        content: ChatCompletionRequestSystemMessageContent::Text(content.to_string()),
        name: None,
    })
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn is_available(&self) -> bool {
        self.has_key
    }

    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse, LlmError> {
        if !self.has_key {
            return Err(LlmError::AuthenticationFailed);
        }
        let oai_request = self.build_request(messages, options, false);

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        let choice = response.choices.first();
        let content = choice
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let stop_reason = choice
            .and_then(|c| c.finish_reason.as_ref())
            .map(map_finish_reason)
            .unwrap_or(StopReason::EndTurn);
        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        tracing::debug!(response_id = %response.id, model = %response.model, "Chat completion received");

        Ok(ChatResponse {
            content,
            model: response.model,
            stop_reason,
            usage,
        })
    }

    fn chat_stream(&self, messages: Vec<Message>, options: ChatOptions) -> EventStream {
        if !self.has_key {
            return Box::pin(futures_util::stream::once(async {
                Err(LlmError::AuthenticationFailed)
            }));
        }
        let oai_request = self.build_request(&messages, &options, true);
        let client = self.client.clone();

        Box::pin(async_stream::try_stream! {
            let oai_stream = client
                .chat()
                .create_stream(oai_request)
                .await
                .map_err(map_openai_error)?;

            let mut inner = map_openai_stream(oai_stream);

            use futures_util::StreamExt;
            while let Some(event) = inner.next().await {
                yield event?;
            }
        })
    }

    fn estimate_cost(&self, usage: &TokenUsage, model: &str) -> f64 {
        self.pricing.cost(usage, model)
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "model_not_found" || code == "context_length_exceeded" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else if code == "server_error" || error_type == "overloaded_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) | Some(403) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            Some(529) => LlmError::Overloaded(err.to_string()),
            Some(_) => LlmError::Provider {
                message: err.to_string(),
            },
            None => LlmError::Unavailable(err.to_string()),
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::StreamError(stream_err) => LlmError::Stream(stream_err.to_string()),
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}
