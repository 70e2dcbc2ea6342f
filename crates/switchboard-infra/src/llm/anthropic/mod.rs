//! Anthropic Claude LLM provider implementation.
//!
//! This module provides the [`AnthropicProvider`] which implements the
//! [`LlmProvider`](switchboard_core::llm::LlmProvider) trait for the
//! Anthropic Messages API, including SSE streaming with usage capture.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::AnthropicProvider;
