//! LLM provider abstractions for Switchboard.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ChatStream`: stream wrapper that captures usage as it passes
//! - `ProviderManager`: bounded fallback loop over the router's candidates

pub mod box_provider;
pub mod manager;
pub mod provider;
pub mod stream;

pub use box_provider::BoxLlmProvider;
pub use manager::{FallbackOutcome, MAX_ATTEMPTS, ProviderManager, StreamedReply};
pub use provider::{EventStream, LlmProvider};
pub use stream::ChatStream;
