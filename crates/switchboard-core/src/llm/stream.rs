//! Streaming response wrapper that remembers what it has seen.
//!
//! `ChatStream` forwards every provider event unchanged while keeping the
//! last reported token usage, the accumulated text and the stop reason, so
//! callers can read them once the stream is drained.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use pin_project_lite::pin_project;

use switchboard_types::llm::{LlmError, StopReason, StreamEvent};
use switchboard_types::usage::TokenUsage;

use super::provider::EventStream;

pin_project! {
    pub struct ChatStream {
        #[pin]
        inner: EventStream,
        usage: Option<TokenUsage>,
        text: String,
        stop_reason: Option<StopReason>,
        finished: bool,
    }
}

impl ChatStream {
    pub fn new(inner: EventStream) -> Self {
        Self {
            inner,
            usage: None,
            text: String::new(),
            stop_reason: None,
            finished: false,
        }
    }

    /// Usage reported by the provider, if it has arrived yet.
    pub fn usage(&self) -> Option<TokenUsage> {
        self.usage
    }

    /// All text deltas seen so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// True once a `Done` event has been observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Stream for ChatStream {
    type Item = Result<StreamEvent, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let polled = this.inner.poll_next(cx);
        if let Poll::Ready(Some(Ok(event))) = &polled {
            match event {
                StreamEvent::TextDelta { text } => this.text.push_str(text),
                StreamEvent::Usage(usage) => *this.usage = Some(*usage),
                StreamEvent::MessageDelta { stop_reason } => {
                    *this.stop_reason = Some(stop_reason.clone())
                }
                StreamEvent::Done => *this.finished = true,
                StreamEvent::Connected => {}
            }
        }
        polled
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("usage", &self.usage)
            .field("text_len", &self.text.len())
            .field("finished", &self.finished)
            .field("inner", &"<stream>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    fn events(items: Vec<Result<StreamEvent, LlmError>>) -> EventStream {
        Box::pin(futures_util::stream::iter(items))
    }

    #[tokio::test]
    async fn test_captures_usage_and_text() {
        let mut stream = ChatStream::new(events(vec![
            Ok(StreamEvent::Connected),
            Ok(StreamEvent::TextDelta { text: "Hel".into() }),
            Ok(StreamEvent::TextDelta { text: "lo".into() }),
            Ok(StreamEvent::MessageDelta {
                stop_reason: StopReason::EndTurn,
            }),
            Ok(StreamEvent::Usage(TokenUsage::new(12, 3))),
            Ok(StreamEvent::Done),
        ]));

        let mut count = 0;
        while let Some(event) = stream.next().await {
            event.unwrap();
            count += 1;
        }

        assert_eq!(count, 6);
        assert_eq!(stream.text(), "Hello");
        assert_eq!(stream.usage(), Some(TokenUsage::new(12, 3)));
        assert_eq!(stream.stop_reason(), Some(&StopReason::EndTurn));
        assert!(stream.is_finished());
    }

    #[tokio::test]
    async fn test_usage_absent_until_reported() {
        let mut stream = ChatStream::new(events(vec![
            Ok(StreamEvent::TextDelta { text: "x".into() }),
            Err(LlmError::Stream("connection reset".into())),
        ]));

        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
        assert_eq!(stream.usage(), None);
        assert!(!stream.is_finished());
    }
}
