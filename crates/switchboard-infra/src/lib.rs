//! Infrastructure layer for Switchboard.
//!
//! Contains implementations of the ports defined in `switchboard-core`:
//! the SQLite usage ledger, the `config.toml` loader, and the HTTP LLM
//! providers (Anthropic Messages API and OpenAI-compatible gateways).

pub mod config;
pub mod llm;
pub mod sqlite;
