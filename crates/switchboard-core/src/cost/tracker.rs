//! Session-scoped, in-memory cost accumulator.
//!
//! A `CostTracker` lives as long as one chat session. It never touches the
//! durable ledger; resetting it only clears what this session has seen.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use switchboard_types::usage::TokenUsage;

use super::pricing::PricingTable;

/// One priced call recorded by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRecord {
    pub model: String,
    pub usage: TokenUsage,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CostTracker {
    pricing: PricingTable,
    records: Vec<CostRecord>,
    total_cost: f64,
}

impl CostTracker {
    pub fn new(pricing: PricingTable) -> Self {
        Self {
            pricing,
            records: Vec::new(),
            total_cost: 0.0,
        }
    }

    /// Price a call without recording it. Unknown models use fallback rates.
    pub fn calculate_cost(&self, usage: &TokenUsage, model: &str) -> f64 {
        self.pricing.cost(usage, model)
    }

    /// Price a call, append it to the session and return the record.
    pub fn add_usage(&mut self, usage: TokenUsage, model: &str) -> CostRecord {
        let record = CostRecord {
            model: model.to_string(),
            usage,
            cost: self.calculate_cost(&usage, model),
            timestamp: Utc::now(),
        };
        self.total_cost += record.cost;
        self.records.push(record.clone());
        record
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn message_count(&self) -> usize {
        self.records.len()
    }

    /// Recorded calls in insertion order.
    pub fn records(&self) -> &[CostRecord] {
        &self.records
    }

    /// Token totals across the session.
    pub fn total_usage(&self) -> TokenUsage {
        self.records.iter().fold(TokenUsage::default(), |acc, r| {
            TokenUsage::new(
                acc.prompt_tokens.saturating_add(r.usage.prompt_tokens),
                acc.completion_tokens.saturating_add(r.usage.completion_tokens),
            )
        })
    }

    /// Session cost per model, sorted by model id.
    pub fn cost_by_model(&self) -> BTreeMap<String, f64> {
        let mut by_model = BTreeMap::new();
        for record in &self.records {
            *by_model.entry(record.model.clone()).or_insert(0.0) += record.cost;
        }
        by_model
    }

    /// Forget everything this session recorded.
    pub fn reset(&mut self) {
        self.records.clear();
        self.total_cost = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use switchboard_types::config::ModelPricing;

    use super::*;
    use crate::cost::pricing::ModelRates;

    #[test]
    fn test_add_usage_returns_priced_record() {
        let mut tracker = CostTracker::default();
        let usage = TokenUsage::new(2_000, 500);
        let record = tracker.add_usage(usage, "claude-sonnet-4-5");
        let expected = (2_000.0 * 3.0 + 500.0 * 15.0) / 1e6;
        assert!((record.cost - expected).abs() < 1e-12);
        assert_eq!(record.usage.total_tokens, 2_500);
        assert_eq!(tracker.message_count(), 1);
        assert!((tracker.total_cost() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_running_total_and_order() {
        let mut tracker = CostTracker::default();
        tracker.add_usage(TokenUsage::new(1_000, 1_000), "gpt-4o-mini");
        tracker.add_usage(TokenUsage::new(1_000, 1_000), "claude-opus-4-1");
        tracker.add_usage(TokenUsage::new(1_000, 1_000), "gpt-4o-mini");

        let models: Vec<&str> = tracker.records().iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, vec!["gpt-4o-mini", "claude-opus-4-1", "gpt-4o-mini"]);

        let sum: f64 = tracker.records().iter().map(|r| r.cost).sum();
        assert!((tracker.total_cost() - sum).abs() < 1e-12);

        let by_model = tracker.cost_by_model();
        assert_eq!(by_model.len(), 2);
        assert!((by_model["gpt-4o-mini"] - 2.0 * 0.00075).abs() < 1e-12);

        let usage = tracker.total_usage();
        assert_eq!(usage.prompt_tokens, 3_000);
        assert_eq!(usage.total_tokens, 6_000);
    }

    #[test]
    fn test_reset_clears_session_state() {
        let mut tracker = CostTracker::default();
        tracker.add_usage(TokenUsage::new(10, 20), "claude-haiku-4-5");
        tracker.add_usage(TokenUsage::new(10, 20), "claude-haiku-4-5");
        tracker.reset();
        assert_eq!(tracker.message_count(), 0);
        assert_eq!(tracker.total_cost(), 0.0);
        assert!(tracker.records().is_empty());
    }

    #[test]
    fn test_unknown_model_does_not_fail() {
        let tracker = CostTracker::default();
        let usage = TokenUsage::new(1_000_000, 0);
        let cost = tracker.calculate_cost(&usage, "mystery-model");
        assert!((cost - ModelRates::FALLBACK.prompt_price_per_million).abs() < 1e-9);
    }

    #[test]
    fn test_uses_injected_pricing() {
        let tracker = CostTracker::new(PricingTable::new(vec![ModelPricing {
            model_pattern: "local-".to_string(),
            prompt_price_per_million: 0.0,
            completion_price_per_million: 0.0,
        }]));
        assert_eq!(tracker.calculate_cost(&TokenUsage::new(500, 500), "local-llama"), 0.0);
    }
}
