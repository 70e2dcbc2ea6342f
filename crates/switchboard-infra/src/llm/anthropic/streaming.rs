//! SSE stream creation and state machine for the Anthropic Messages API.
//!
//! The streaming protocol:
//! 1. `message_start` -- message object carrying the prompt token count
//! 2. Per block: `content_block_start` -> N x `content_block_delta` -> `content_block_stop`
//! 3. `message_delta` -- stop_reason and cumulative output token count
//! 4. `message_stop` -- final event
//! 5. `ping` events may appear anywhere (keepalive)
//! 6. `error` events may appear mid-stream
//!
//! Usage is reported once, on `message_delta`, by combining the prompt count
//! from `message_start` with the completion count.

use futures_util::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use secrecy::{ExposeSecret, SecretString};

use switchboard_core::llm::EventStream;
use switchboard_types::llm::{LlmError, StreamEvent};
use switchboard_types::usage::TokenUsage;

use super::client::{API_VERSION, error_for_status, map_stop_reason};
use super::types::{
    AnthropicDelta, AnthropicRequest, ContentBlockDeltaPayload, ErrorPayload,
    MessageDeltaPayload, MessageStartPayload,
};

/// Per-stream state: translates named SSE events into [`StreamEvent`]s.
#[derive(Debug, Default)]
pub(crate) struct AnthropicStreamState {
    input_tokens: u32,
    done: bool,
}

impl AnthropicStreamState {
    /// Handle one SSE message. Unknown event names are ignored.
    pub(crate) fn handle(&mut self, event: &str, data: &str) -> Result<Vec<StreamEvent>, LlmError> {
        match event {
            "message_start" => {
                let payload: MessageStartPayload = parse(event, data)?;
                self.input_tokens = payload.message.usage.map(|u| u.input_tokens).unwrap_or(0);
                tracing::trace!(message_id = %payload.message.id, model = %payload.message.model, "Anthropic stream started");
                Ok(Vec::new())
            }
            "content_block_delta" => {
                let payload: ContentBlockDeltaPayload = parse(event, data)?;
                match payload.delta {
                    AnthropicDelta::TextDelta { text } if !text.is_empty() => {
                        Ok(vec![StreamEvent::TextDelta { text }])
                    }
                    _ => Ok(Vec::new()),
                }
            }
            "message_delta" => {
                let payload: MessageDeltaPayload = parse(event, data)?;
                let usage = TokenUsage::new(
                    self.input_tokens.max(payload.usage.input_tokens),
                    payload.usage.output_tokens,
                );
                Ok(vec![
                    StreamEvent::MessageDelta {
                        stop_reason: map_stop_reason(payload.delta.stop_reason.as_deref()),
                    },
                    StreamEvent::Usage(usage),
                ])
            }
            "message_stop" => {
                self.done = true;
                Ok(vec![StreamEvent::Done])
            }
            "error" => {
                let payload: ErrorPayload = parse(event, data)?;
                Err(match payload.error.error_type.as_str() {
                    "overloaded_error" => LlmError::Overloaded(payload.error.message),
                    "rate_limit_error" => LlmError::RateLimited {
                        retry_after_ms: None,
                    },
                    _ => LlmError::Stream(format!(
                        "{}: {}",
                        payload.error.error_type, payload.error.message
                    )),
                })
            }
            _ => Ok(Vec::new()),
        }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }
}

fn parse<T: serde::de::DeserializeOwned>(event: &str, data: &str) -> Result<T, LlmError> {
    serde_json::from_str(data)
        .map_err(|e| LlmError::Deserialization(format!("invalid {event} payload: {e}")))
}

/// Create a streaming SSE connection to the Anthropic Messages API.
///
/// The returned stream yields `Connected` once the connection opens, then the
/// translated events. It ends after `message_stop`, or with an error if the
/// connection drops before that.
pub fn create_anthropic_stream(
    client: &reqwest::Client,
    url: &str,
    body: AnthropicRequest,
    api_key: &SecretString,
) -> EventStream {
    let request = client
        .post(url)
        .header("x-api-key", api_key.expose_secret())
        .header("anthropic-version", API_VERSION)
        .header("content-type", "application/json")
        .json(&body);

    Box::pin(async_stream::try_stream! {
        let mut source = EventSource::new(request)
            .map_err(|e| LlmError::InvalidRequest(format!("cannot stream request: {e}")))?;
        let mut state = AnthropicStreamState::default();

        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => yield StreamEvent::Connected,
                Ok(Event::Message(message)) => {
                    let events = match state.handle(&message.event, &message.data) {
                        Ok(events) => events,
                        Err(e) => {
                            source.close();
                            Err(e)?
                        }
                    };
                    for event in events {
                        yield event;
                    }
                    if state.is_done() {
                        source.close();
                        break;
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(e) => {
                    // EventSource reconnects on its own; a routed call must not.
                    source.close();
                    Err::<(), _>(map_eventsource_error(e).await)?;
                }
            }
        }

        if !state.is_done() {
            Err::<(), _>(LlmError::Stream("stream ended before message_stop".to_string()))?;
        }
    })
}

async fn map_eventsource_error(err: reqwest_eventsource::Error) -> LlmError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            error_for_status(status, body)
        }
        reqwest_eventsource::Error::Transport(e) => LlmError::Unavailable(e.to_string()),
        other => LlmError::Stream(other.to_string()),
    }
}
