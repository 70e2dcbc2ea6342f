//! Shared domain types for Switchboard.
//!
//! This crate contains the core domain types used across the Switchboard
//! workspace: routing decisions, ledger records, LLM message shapes,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod routing;
pub mod usage;
