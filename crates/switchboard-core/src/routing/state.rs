//! Shared, injectable routing settings.
//!
//! `RoutingState` holds the current strategy and budget threshold. Clones
//! share the same underlying values, so a CLI command or chat loop can flip
//! the strategy on the same handle the router reads from. Reads and writes
//! are lock-free.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use switchboard_types::routing::Strategy;

/// Remaining budget (USD) below which routing downgrades one tier.
pub const DEFAULT_BUDGET_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone)]
pub struct RoutingState {
    strategy: Arc<AtomicU8>,
    budget_threshold_bits: Arc<AtomicU64>,
}

impl RoutingState {
    pub fn new(strategy: Strategy, budget_threshold: f64) -> Self {
        Self {
            strategy: Arc::new(AtomicU8::new(encode(strategy))),
            budget_threshold_bits: Arc::new(AtomicU64::new(budget_threshold.to_bits())),
        }
    }

    pub fn strategy(&self) -> Strategy {
        decode(self.strategy.load(Ordering::SeqCst))
    }

    pub fn set_strategy(&self, strategy: Strategy) {
        self.strategy.store(encode(strategy), Ordering::SeqCst);
    }

    pub fn budget_threshold(&self) -> f64 {
        f64::from_bits(self.budget_threshold_bits.load(Ordering::SeqCst))
    }

    pub fn set_budget_threshold(&self, threshold: f64) {
        self.budget_threshold_bits
            .store(threshold.to_bits(), Ordering::SeqCst);
    }
}

impl Default for RoutingState {
    fn default() -> Self {
        Self::new(Strategy::default(), DEFAULT_BUDGET_THRESHOLD)
    }
}

fn encode(strategy: Strategy) -> u8 {
    match strategy {
        Strategy::Cost => 0,
        Strategy::Performance => 1,
        Strategy::Balanced => 2,
    }
}

fn decode(value: u8) -> Strategy {
    match value {
        0 => Strategy::Cost,
        1 => Strategy::Performance,
        _ => Strategy::Balanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = RoutingState::default();
        assert_eq!(state.strategy(), Strategy::Balanced);
        assert!((state.budget_threshold() - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clones_share_state() {
        let state = RoutingState::default();
        let handle = state.clone();
        handle.set_strategy(Strategy::Cost);
        handle.set_budget_threshold(1.5);
        assert_eq!(state.strategy(), Strategy::Cost);
        assert!((state.budget_threshold() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_every_strategy_roundtrips() {
        let state = RoutingState::default();
        for strategy in Strategy::ALL {
            state.set_strategy(strategy);
            assert_eq!(state.strategy(), strategy);
        }
    }
}
