//! Observability for Switchboard: tracing subscriber setup and GenAI
//! semantic-convention attribute names for LLM call spans.

pub mod genai_attrs;
pub mod tracing_setup;
