//! Provider manager: runs one turn against the routed model and falls back
//! through the router's candidate list when a call fails.
//!
//! Attempts are strictly sequential and capped at [`MAX_ATTEMPTS`]. Every
//! outcome is written to the ledger before the next decision is made:
//! successes to `usage_logs`, failures to `failure_logs`. A ledger write
//! that fails is logged and skipped; it never fails the turn.

use std::future::Future;
use std::time::Instant;

use chrono::Utc;
use futures_util::StreamExt;
use tracing::Instrument;

use switchboard_types::error::RoutingError;
use switchboard_types::llm::{ChatOptions, ChatResponse, LlmError, Message, StreamEvent};
use switchboard_types::routing::RoutingDecision;
use switchboard_types::usage::{FailureLogEntry, TokenUsage, UsageLogEntry};

use crate::routing::ModelRouter;
use crate::usage::{UsageRepository, UsageTracker};

use super::box_provider::BoxLlmProvider;

/// Total attempts allowed for one turn, the first call included.
pub const MAX_ATTEMPTS: u32 = 3;

/// Result of a turn that eventually succeeded.
#[derive(Debug, Clone)]
pub struct FallbackOutcome<T> {
    pub value: T,
    /// The decision that produced `value`; differs from the input on fallback.
    pub decision: RoutingDecision,
    /// Attempts made, the successful one included.
    pub attempts: u32,
    pub usage: TokenUsage,
    /// Cost in USD as estimated by the provider.
    pub cost: f64,
}

impl<T> FallbackOutcome<T> {
    /// Model that served the turn.
    pub fn model(&self) -> &str {
        &self.decision.model
    }

    pub fn fell_back(&self) -> bool {
        self.attempts > 1
    }
}

/// Text and stop details from a drained stream.
#[derive(Debug, Clone)]
pub struct StreamedReply {
    pub content: String,
    pub stop_reason: Option<switchboard_types::llm::StopReason>,
}

/// Composes router, provider and usage ledger for one chat session.
pub struct ProviderManager<R: UsageRepository> {
    provider: BoxLlmProvider,
    router: ModelRouter,
    tracker: UsageTracker<R>,
    session_id: String,
}

impl<R: UsageRepository> ProviderManager<R> {
    pub fn new(
        provider: BoxLlmProvider,
        router: ModelRouter,
        tracker: UsageTracker<R>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            router,
            tracker,
            session_id: session_id.into(),
        }
    }

    pub fn provider(&self) -> &BoxLlmProvider {
        &self.provider
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    pub fn tracker(&self) -> &UsageTracker<R> {
        &self.tracker
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run `operation` against `decision.model`, falling back on failure.
    ///
    /// `operation` receives the model id for each attempt and returns the
    /// result with its token usage. Any error triggers fallback. The loop
    /// ends with [`RoutingError::TerminalFailure`] once [`MAX_ATTEMPTS`]
    /// calls have failed, or [`RoutingError::NoFallbackAvailable`] when the
    /// router has no next candidate.
    pub async fn execute_with_fallback<T, F, Fut>(
        &self,
        mut decision: RoutingDecision,
        mut operation: F,
    ) -> Result<FallbackOutcome<T>, RoutingError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<(T, TokenUsage), LlmError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            let start = Instant::now();
            let span = tracing::info_span!(
                "routed_call",
                model = %decision.model,
                complexity = %decision.complexity,
                attempt = attempt + 1,
            );

            match operation(decision.model.clone()).instrument(span).await {
                Ok((value, usage)) => {
                    let cost = self.provider.estimate_cost(&usage, &decision.model);
                    tracing::info!(
                        model = %decision.model,
                        attempt = attempt + 1,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        cost,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Routed call succeeded"
                    );
                    self.record_usage(&decision, usage, cost).await;
                    return Ok(FallbackOutcome {
                        value,
                        decision,
                        attempts: attempt + 1,
                        usage,
                        cost,
                    });
                }
                Err(err) => {
                    let last_error = err.to_string();

                    if attempt + 1 >= MAX_ATTEMPTS {
                        tracing::error!(
                            model = %decision.model,
                            attempts = attempt + 1,
                            error = %last_error,
                            "Attempt limit reached, giving up"
                        );
                        self.record_failure(&decision.model, &last_error, None).await;
                        return Err(RoutingError::TerminalFailure {
                            model: decision.model,
                            attempts: attempt + 1,
                            last_error,
                        });
                    }

                    let Some(fallback) = self
                        .router
                        .get_fallback(&decision.model, decision.complexity)
                    else {
                        tracing::error!(
                            model = %decision.model,
                            complexity = %decision.complexity,
                            error = %last_error,
                            "No fallback model available"
                        );
                        self.record_failure(&decision.model, &last_error, None).await;
                        return Err(RoutingError::NoFallbackAvailable {
                            model: decision.model,
                            complexity: decision.complexity,
                            last_error,
                        });
                    };

                    tracing::warn!(
                        model = %decision.model,
                        fallback = %fallback.model,
                        error = %last_error,
                        "Model failed, falling back"
                    );
                    self.record_failure(&decision.model, &last_error, Some(&fallback.model))
                        .await;

                    decision = RoutingDecision {
                        reason: format!("fallback from {} ({last_error})", decision.model),
                        model: fallback.model,
                        complexity: decision.complexity,
                        estimated_cost: fallback.cost_per_million,
                    };
                    attempt += 1;
                }
            }
        }
    }

    /// Non-streaming chat through the fallback loop.
    pub async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        decision: RoutingDecision,
    ) -> Result<FallbackOutcome<ChatResponse>, RoutingError> {
        let provider = &self.provider;
        self.execute_with_fallback(decision, |model| {
            let options = options.for_model(&model);
            async move {
                let response = provider.chat(messages, &options).await?;
                let usage = response.usage;
                Ok::<_, LlmError>((response, usage))
            }
        })
        .await
    }

    /// Streaming chat through the fallback loop.
    ///
    /// Each text delta is handed to `on_delta` as it arrives. A stream that
    /// errors part-way counts as a failed attempt; the fallback model then
    /// starts over, so `on_delta` may see a partial reply before the full one.
    pub async fn chat_stream<D>(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        decision: RoutingDecision,
        on_delta: &D,
    ) -> Result<FallbackOutcome<StreamedReply>, RoutingError>
    where
        D: Fn(&str) + Sync,
    {
        let provider = &self.provider;
        self.execute_with_fallback(decision, |model| {
            let options = options.for_model(&model);
            let messages = messages.to_vec();
            async move {
                let mut stream = provider.chat_stream(messages, options);
                while let Some(event) = stream.next().await {
                    if let StreamEvent::TextDelta { text } = event? {
                        on_delta(&text);
                    }
                }
                let usage = match stream.usage() {
                    Some(usage) => usage,
                    None => {
                        tracing::warn!(
                            model = %model,
                            "Stream completed without reporting usage, recording zero tokens"
                        );
                        TokenUsage::default()
                    }
                };
                let reply = StreamedReply {
                    content: stream.text().to_string(),
                    stop_reason: stream.stop_reason().cloned(),
                };
                Ok::<_, LlmError>((reply, usage))
            }
        })
        .await
    }

    async fn record_usage(&self, decision: &RoutingDecision, usage: TokenUsage, cost: f64) {
        let entry = UsageLogEntry {
            timestamp: Utc::now(),
            model: decision.model.clone(),
            usage,
            cost,
            complexity: decision.complexity,
            session_id: self.session_id.clone(),
            success: true,
        };
        if let Err(e) = self.tracker.log_usage(&entry).await {
            tracing::warn!(error = %e, model = %entry.model, "Failed to persist usage row");
        }
    }

    async fn record_failure(&self, model: &str, error: &str, fallback_model: Option<&str>) {
        let entry = FailureLogEntry {
            timestamp: Utc::now(),
            model: model.to_string(),
            error_message: error.to_string(),
            fallback_model: fallback_model.map(str::to_string),
            fallback_succeeded: false,
        };
        if let Err(e) = self.tracker.log_failure(&entry).await {
            tracing::warn!(error = %e, model, "Failed to persist failure row");
        }
    }
}
