//! OpenAI SSE stream to [`StreamEvent`] adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] chunks to the
//! provider-agnostic [`StreamEvent`] enum defined in `switchboard-types`.

use futures_util::StreamExt;

use async_openai::types::chat::{ChatCompletionResponseStream, FinishReason};

use switchboard_core::llm::EventStream;
use switchboard_types::llm::{LlmError, StopReason, StreamEvent};
use switchboard_types::usage::TokenUsage;

/// Map an async-openai [`ChatCompletionResponseStream`] to a stream of [`StreamEvent`]s.
///
/// The returned stream emits events in this order:
/// 1. `Connected` -- immediately on entry
/// 2. `TextDelta` -- for each text content chunk
/// 3. `MessageDelta` -- with the stop reason when finish_reason appears
/// 4. `Usage` -- token usage (requires `stream_options.include_usage = true` on request)
/// 5. `Done` -- at the end of the stream
///
/// A stream that ends before any choice reports a finish reason was cut off
/// and ends with an [`LlmError::Stream`] instead of `Done`.
pub fn map_openai_stream(stream: ChatCompletionResponseStream) -> EventStream {
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        let mut stream = stream;
        let mut finished = false;
        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| LlmError::Stream(e.to_string()))?;

            for choice in &chunk.choices {
                if let Some(text) = choice.delta.content.as_ref()
                    && !text.is_empty()
                {
                    yield StreamEvent::TextDelta { text: text.clone() };
                }

                if let Some(finish_reason) = choice.finish_reason.as_ref() {
                    finished = true;
                    yield StreamEvent::MessageDelta {
                        stop_reason: map_finish_reason(finish_reason),
                    };
                }
            }

            // The usage chunk arrives last, with an empty choices array.
            if let Some(usage) = chunk.usage.as_ref() {
                yield StreamEvent::Usage(TokenUsage::new(usage.prompt_tokens, usage.completion_tokens));
            }
        }

        if !finished {
            Err::<(), _>(LlmError::Stream(
                "stream ended before finish_reason".to_string(),
            ))?;
        }

        yield StreamEvent::Done;
    })
}

pub(crate) fn map_finish_reason(reason: &FinishReason) -> StopReason {
    match reason {
        FinishReason::Stop | FinishReason::ContentFilter => StopReason::EndTurn,
        FinishReason::Length => StopReason::MaxTokens,
        FinishReason::ToolCalls | FinishReason::FunctionCall => StopReason::ToolUse,
    }
}

#[cfg(test)]
mod tests {
    use async_openai::error::OpenAIError;
    use async_openai::types::chat::CreateChatCompletionStreamResponse;

    use super::*;

    fn chunk(value: serde_json::Value) -> CreateChatCompletionStreamResponse {
        serde_json::from_value(value).unwrap()
    }

    fn text_chunk(text: &str, finish_reason: Option<&str>) -> CreateChatCompletionStreamResponse {
        chunk(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 0,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "delta": { "content": text },
                "finish_reason": finish_reason,
            }],
        }))
    }

    fn usage_chunk(prompt: u32, completion: u32) -> CreateChatCompletionStreamResponse {
        chunk(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 0,
            "model": "gpt-4o-mini",
            "choices": [],
            "usage": {
                "prompt_tokens": prompt,
                "completion_tokens": completion,
                "total_tokens": prompt + completion,
            },
        }))
    }

    async fn collect(
        chunks: Vec<CreateChatCompletionStreamResponse>,
    ) -> Vec<Result<StreamEvent, LlmError>> {
        let items: Vec<Result<CreateChatCompletionStreamResponse, OpenAIError>> =
            chunks.into_iter().map(Ok).collect();
        let source: ChatCompletionResponseStream = Box::pin(futures_util::stream::iter(items));
        map_openai_stream(source).collect().await
    }

    #[tokio::test]
    async fn test_complete_stream_ends_with_usage_and_done() {
        let events = collect(vec![
            text_chunk("Hel", None),
            text_chunk("lo", Some("stop")),
            usage_chunk(12, 2),
        ])
        .await;

        let events: Vec<StreamEvent> = events.into_iter().map(Result::unwrap).collect();
        assert!(matches!(events[0], StreamEvent::Connected));
        assert!(matches!(&events[1], StreamEvent::TextDelta { text } if text == "Hel"));
        assert!(matches!(&events[2], StreamEvent::TextDelta { text } if text == "lo"));
        assert!(matches!(
            &events[3],
            StreamEvent::MessageDelta {
                stop_reason: StopReason::EndTurn
            }
        ));
        assert!(matches!(&events[4], StreamEvent::Usage(u) if *u == TokenUsage::new(12, 2)));
        assert!(matches!(events[5], StreamEvent::Done));
        assert_eq!(events.len(), 6);
    }

    #[tokio::test]
    async fn test_stream_cut_off_before_finish_reason_is_an_error() {
        let events = collect(vec![text_chunk("Hel", None)]).await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Ok(StreamEvent::Connected)));
        assert!(matches!(&events[1], Ok(StreamEvent::TextDelta { text }) if text == "Hel"));
        assert!(matches!(&events[2], Err(LlmError::Stream(msg)) if msg.contains("finish_reason")));
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason(&FinishReason::Stop), StopReason::EndTurn);
        assert_eq!(map_finish_reason(&FinishReason::Length), StopReason::MaxTokens);
        assert_eq!(map_finish_reason(&FinishReason::ToolCalls), StopReason::ToolUse);
        assert_eq!(map_finish_reason(&FinishReason::ContentFilter), StopReason::EndTurn);
    }
}
