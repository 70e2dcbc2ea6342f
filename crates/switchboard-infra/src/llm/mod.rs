//! LLM provider implementations.
//!
//! Contains the concrete implementations of the [`LlmProvider`] trait
//! defined in `switchboard-core`, and the closed [`ProviderBackend`] union
//! that the factory ([`create_provider`]) builds once at startup from the
//! `[provider]` section of `config.toml`.

pub mod anthropic;
pub mod openai_compat;

use secrecy::SecretString;
use tracing::Instrument;

use switchboard_core::cost::PricingTable;
use switchboard_core::llm::{EventStream, LlmProvider};
use switchboard_observe::genai_attrs;
use switchboard_types::llm::{ChatOptions, ChatResponse, LlmError, Message, ProviderConfig, ProviderType};
use switchboard_types::usage::TokenUsage;

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Every backend a routed call can be sent to.
pub enum ProviderBackend {
    Anthropic(AnthropicProvider),
    OpenAiCompatible(OpenAiCompatibleProvider),
}

impl ProviderBackend {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderBackend::Anthropic(_) => ProviderType::Anthropic,
            ProviderBackend::OpenAiCompatible(_) => ProviderType::OpenAiCompatible,
        }
    }
}

impl LlmProvider for ProviderBackend {
    fn name(&self) -> &str {
        match self {
            ProviderBackend::Anthropic(p) => p.name(),
            ProviderBackend::OpenAiCompatible(p) => p.name(),
        }
    }

    async fn is_available(&self) -> bool {
        match self {
            ProviderBackend::Anthropic(p) => p.is_available().await,
            ProviderBackend::OpenAiCompatible(p) => p.is_available().await,
        }
    }

    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse, LlmError> {
        let span = tracing::info_span!(
            "chat",
            gen_ai.operation.name = genai_attrs::OP_CHAT,
            gen_ai.provider.name = %self.name(),
            gen_ai.request.model = %options.model,
            gen_ai.request.max_tokens = options.max_tokens,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty,
        );

        let result = async {
            match self {
                ProviderBackend::Anthropic(p) => p.chat(messages, options).await,
                ProviderBackend::OpenAiCompatible(p) => p.chat(messages, options).await,
            }
        }
        .instrument(span.clone())
        .await;

        if let Ok(response) = &result {
            span.record(genai_attrs::GEN_AI_USAGE_INPUT_TOKENS, response.usage.prompt_tokens);
            span.record(genai_attrs::GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.completion_tokens);
            span.record(
                genai_attrs::GEN_AI_RESPONSE_FINISH_REASONS,
                tracing::field::display(&response.stop_reason),
            );
        }
        result
    }

    fn chat_stream(&self, messages: Vec<Message>, options: ChatOptions) -> EventStream {
        tracing::debug!(
            gen_ai.operation.name = genai_attrs::OP_CHAT_STREAM,
            gen_ai.provider.name = %self.name(),
            gen_ai.request.model = %options.model,
            "Opening provider stream"
        );
        match self {
            ProviderBackend::Anthropic(p) => p.chat_stream(messages, options),
            ProviderBackend::OpenAiCompatible(p) => p.chat_stream(messages, options),
        }
    }

    fn estimate_cost(&self, usage: &TokenUsage, model: &str) -> f64 {
        match self {
            ProviderBackend::Anthropic(p) => p.estimate_cost(usage, model),
            ProviderBackend::OpenAiCompatible(p) => p.estimate_cost(usage, model),
        }
    }
}

/// Read the API key named by `api_key_env`. Empty values count as missing.
pub fn resolve_api_key(api_key_env: &str) -> Option<SecretString> {
    std::env::var(api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .map(SecretString::from)
}

/// Build the configured [`ProviderBackend`].
///
/// A missing API key is not an error here: the provider is still built,
/// reports itself unavailable, and the caller decides what to do.
pub fn create_provider(config: &ProviderConfig, pricing: PricingTable) -> Result<ProviderBackend, LlmError> {
    let api_key = resolve_api_key(&config.api_key_env);
    if api_key.is_none() {
        tracing::warn!(
            provider = %config.name,
            env = %config.api_key_env,
            "No API key found for provider"
        );
    }

    let backend = match config.provider_type {
        ProviderType::Anthropic => {
            let mut provider = AnthropicProvider::new(api_key, pricing)?.with_name(&config.name);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url);
            }
            ProviderBackend::Anthropic(provider)
        }
        ProviderType::OpenAiCompatible => {
            let name = if config.name.is_empty() {
                genai_attrs::PROVIDER_OPENAI_COMPATIBLE
            } else {
                &config.name
            };
            let oai_config = OpenAiCompatConfig::new(name, config.base_url.as_deref(), api_key);
            ProviderBackend::OpenAiCompatible(OpenAiCompatibleProvider::new(oai_config, pricing))
        }
    };

    tracing::debug!(
        provider = %backend.name(),
        provider_type = %backend.provider_type(),
        "Provider backend created"
    );
    Ok(backend)
}
