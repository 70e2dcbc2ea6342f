//! Per-tier candidate lists and strategy reordering.
//!
//! The default table is hand-curated (that order is the `balanced`
//! strategy). [`RoutingTable::for_strategy`] always returns a fresh copy;
//! the source table is never reordered in place.

use std::collections::BTreeMap;

use switchboard_types::config::RoutingTableConfig;
use switchboard_types::error::RoutingError;
use switchboard_types::routing::{ModelCandidate, Strategy, TaskComplexity};

/// Ordered candidate models for each complexity tier.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingTable {
    tiers: BTreeMap<TaskComplexity, Vec<ModelCandidate>>,
}

impl RoutingTable {
    /// Build a table from explicit tiers. Missing tiers are treated as empty.
    pub fn new(tiers: BTreeMap<TaskComplexity, Vec<ModelCandidate>>) -> Self {
        Self { tiers }
    }

    /// Build and validate a table from the `[routing_table]` config section.
    pub fn from_config(config: &RoutingTableConfig) -> Result<Self, RoutingError> {
        let mut tiers = BTreeMap::new();
        tiers.insert(TaskComplexity::Simple, config.simple.clone());
        tiers.insert(TaskComplexity::Moderate, config.moderate.clone());
        tiers.insert(TaskComplexity::Complex, config.complex.clone());
        let table = Self::new(tiers);
        table.validate()?;
        Ok(table)
    }

    /// Candidates for a tier in stored order (empty if the tier is missing).
    pub fn candidates(&self, complexity: TaskComplexity) -> &[ModelCandidate] {
        self.tiers
            .get(&complexity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Candidates for a tier sorted by priority, preferred first.
    pub fn ranked(&self, complexity: TaskComplexity) -> Vec<ModelCandidate> {
        let mut ranked = self.candidates(complexity).to_vec();
        ranked.sort_by_key(|c| c.priority);
        ranked
    }

    /// A deep copy ordered for `strategy`.
    ///
    /// - `Cost`: ascending cost per million, priorities reassigned 1..N.
    /// - `Performance`: descending cost per million, priorities reassigned 1..N.
    /// - `Balanced`: unchanged copy.
    ///
    /// Sorting is stable, so equal-cost candidates keep their curated order.
    pub fn for_strategy(&self, strategy: Strategy) -> RoutingTable {
        let mut copy = self.clone();
        if strategy == Strategy::Balanced {
            return copy;
        }

        for candidates in copy.tiers.values_mut() {
            match strategy {
                Strategy::Cost => {
                    candidates.sort_by(|a, b| a.cost_per_million.total_cmp(&b.cost_per_million))
                }
                Strategy::Performance => {
                    candidates.sort_by(|a, b| b.cost_per_million.total_cmp(&a.cost_per_million))
                }
                Strategy::Balanced => unreachable!("handled above"),
            }
            for (rank, candidate) in candidates.iter_mut().enumerate() {
                candidate.priority = rank as u32 + 1;
            }
        }

        copy
    }

    /// Check that every tier's priorities form the contiguous rank 1..N.
    pub fn validate(&self) -> Result<(), RoutingError> {
        for (complexity, candidates) in &self.tiers {
            let mut priorities: Vec<u32> = candidates.iter().map(|c| c.priority).collect();
            priorities.sort_unstable();
            let contiguous = priorities
                .iter()
                .enumerate()
                .all(|(i, p)| *p == i as u32 + 1);
            if !contiguous {
                return Err(RoutingError::InvalidConfig(format!(
                    "{complexity} tier priorities must be 1..{} without gaps or duplicates, got {priorities:?}",
                    candidates.len()
                )));
            }
            if let Some(bad) = candidates.iter().find(|c| !c.cost_per_million.is_finite() || c.cost_per_million < 0.0) {
                return Err(RoutingError::InvalidConfig(format!(
                    "{complexity} tier model '{}' has invalid cost {}",
                    bad.model, bad.cost_per_million
                )));
            }
        }
        Ok(())
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        default_table()
    }
}

/// The curated table. Costs are blended USD per million tokens.
pub fn default_table() -> RoutingTable {
    let mut tiers = BTreeMap::new();
    tiers.insert(
        TaskComplexity::Simple,
        vec![
            ModelCandidate::new("claude-haiku-4-5", 3.0, 1),
            ModelCandidate::new("gpt-4o-mini", 0.38, 2),
            ModelCandidate::new("gemini-2.0-flash", 0.25, 3),
        ],
    );
    tiers.insert(
        TaskComplexity::Moderate,
        vec![
            ModelCandidate::new("claude-sonnet-4-5", 9.0, 1),
            ModelCandidate::new("gpt-4.1", 5.0, 2),
            ModelCandidate::new("gemini-2.5-pro", 5.63, 3),
        ],
    );
    tiers.insert(
        TaskComplexity::Complex,
        vec![
            ModelCandidate::new("claude-opus-4-1", 45.0, 1),
            ModelCandidate::new("claude-sonnet-4-5", 9.0, 2),
            ModelCandidate::new("gpt-4.1", 5.0, 3),
        ],
    );
    RoutingTable::new(tiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(table: &RoutingTable) {
        for complexity in TaskComplexity::ALL {
            let mut priorities: Vec<u32> =
                table.candidates(complexity).iter().map(|c| c.priority).collect();
            priorities.sort_unstable();
            let expected: Vec<u32> = (1..=priorities.len() as u32).collect();
            assert_eq!(priorities, expected, "{complexity} tier");
        }
    }

    #[test]
    fn test_default_table_is_valid() {
        let table = default_table();
        table.validate().unwrap();
        for complexity in TaskComplexity::ALL {
            assert!(!table.candidates(complexity).is_empty());
        }
    }

    #[test]
    fn test_for_strategy_never_mutates_source() {
        let table = default_table();
        let baseline = table.clone();
        for _ in 0..3 {
            for strategy in Strategy::ALL {
                let _ = table.for_strategy(strategy);
            }
        }
        assert_eq!(table, baseline);
        assert_eq!(table, default_table());
    }

    #[test]
    fn test_cost_strategy_sorted_ascending() {
        let table = default_table().for_strategy(Strategy::Cost);
        for complexity in TaskComplexity::ALL {
            let ranked = table.ranked(complexity);
            assert!(
                ranked
                    .windows(2)
                    .all(|w| w[0].cost_per_million <= w[1].cost_per_million),
                "{complexity} tier not ascending: {ranked:?}"
            );
        }
        assert_contiguous(&table);
    }

    #[test]
    fn test_performance_strategy_sorted_descending() {
        let table = default_table().for_strategy(Strategy::Performance);
        for complexity in TaskComplexity::ALL {
            let ranked = table.ranked(complexity);
            assert!(
                ranked
                    .windows(2)
                    .all(|w| w[0].cost_per_million >= w[1].cost_per_million),
                "{complexity} tier not descending: {ranked:?}"
            );
        }
        assert_contiguous(&table);
    }

    #[test]
    fn test_balanced_strategy_keeps_curated_order() {
        let table = default_table();
        assert_eq!(table.for_strategy(Strategy::Balanced), table);
        assert_contiguous(&table);
    }

    #[test]
    fn test_cost_strategy_is_stable_for_ties() {
        let mut tiers = BTreeMap::new();
        tiers.insert(
            TaskComplexity::Simple,
            vec![
                ModelCandidate::new("b", 1.0, 1),
                ModelCandidate::new("a", 1.0, 2),
                ModelCandidate::new("c", 0.5, 3),
            ],
        );
        let table = RoutingTable::new(tiers).for_strategy(Strategy::Cost);
        let ranked = table.ranked(TaskComplexity::Simple);
        let models: Vec<&str> = ranked.iter().map(|c| c.model.as_str()).collect();
        assert_eq!(models, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_validate_rejects_gaps_and_duplicates() {
        let config = RoutingTableConfig {
            simple: vec![ModelCandidate::new("a", 1.0, 1), ModelCandidate::new("b", 2.0, 3)],
            ..Default::default()
        };
        assert!(matches!(
            RoutingTable::from_config(&config),
            Err(RoutingError::InvalidConfig(_))
        ));

        let config = RoutingTableConfig {
            complex: vec![ModelCandidate::new("a", 1.0, 1), ModelCandidate::new("b", 2.0, 1)],
            ..Default::default()
        };
        assert!(RoutingTable::from_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_cost() {
        let config = RoutingTableConfig {
            moderate: vec![ModelCandidate::new("a", -1.0, 1)],
            ..Default::default()
        };
        assert!(RoutingTable::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_allows_empty_tiers() {
        let config = RoutingTableConfig {
            simple: vec![ModelCandidate::new("only", 1.0, 1)],
            ..Default::default()
        };
        let table = RoutingTable::from_config(&config).unwrap();
        assert!(table.candidates(TaskComplexity::Complex).is_empty());
        assert_eq!(table.candidates(TaskComplexity::Simple).len(), 1);
    }
}
