//! Global configuration types for Switchboard.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! routing strategy, the budget downgrade threshold, pricing overrides, the
//! provider backend and an optional routing table override.

use serde::{Deserialize, Serialize};

use crate::llm::ProviderConfig;
use crate::routing::{ModelCandidate, Strategy};

/// Top-level configuration.
///
/// Loaded from `~/.switchboard/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Candidate ordering policy.
    #[serde(default)]
    pub strategy: Strategy,

    /// Remaining budget (USD) below which routing downgrades one tier.
    #[serde(default = "default_budget_threshold")]
    pub budget_threshold: f64,

    /// Pricing overrides, consulted before the built-in table.
    #[serde(default)]
    pub model_pricing: Vec<ModelPricing>,

    /// Backend serving routed calls.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Replaces the built-in routing table when present.
    #[serde(default)]
    pub routing_table: Option<RoutingTableConfig>,
}

fn default_budget_threshold() -> f64 {
    0.10
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            budget_threshold: default_budget_threshold(),
            model_pricing: Vec::new(),
            provider: ProviderConfig::default(),
            routing_table: None,
        }
    }
}

/// Per-million-token prices for models matching a prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Prefix matched against model ids (e.g., "claude-sonnet-4").
    pub model_pattern: String,
    /// USD per million prompt tokens.
    pub prompt_price_per_million: f64,
    /// USD per million completion tokens.
    pub completion_price_per_million: f64,
}

/// Candidate lists per complexity tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingTableConfig {
    #[serde(default)]
    pub simple: Vec<ModelCandidate>,
    #[serde(default)]
    pub moderate: Vec<ModelCandidate>,
    #[serde(default)]
    pub complex: Vec<ModelCandidate>,
}
