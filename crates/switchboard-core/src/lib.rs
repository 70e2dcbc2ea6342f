//! Routing, fallback orchestration and cost accounting for Switchboard.
//!
//! This crate defines the "ports" (provider and repository traits) that the
//! infrastructure layer implements. It depends only on `switchboard-types`
//! -- never on `switchboard-infra` or any database/IO crate.

pub mod complexity;
pub mod cost;
pub mod llm;
pub mod routing;
pub mod usage;
