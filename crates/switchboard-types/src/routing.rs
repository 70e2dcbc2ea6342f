//! Routing domain types: complexity tiers, strategies, candidates, decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical estimate of how demanding a task is.
///
/// Ordered so that `Simple < Moderate < Complex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskComplexity {
    Simple,
    Moderate,
    Complex,
}

impl TaskComplexity {
    /// All tiers, cheapest first.
    pub const ALL: [TaskComplexity; 3] = [
        TaskComplexity::Simple,
        TaskComplexity::Moderate,
        TaskComplexity::Complex,
    ];

    /// One tier down. `Simple` stays `Simple`.
    pub fn downgrade(self) -> Self {
        match self {
            TaskComplexity::Complex => TaskComplexity::Moderate,
            TaskComplexity::Moderate | TaskComplexity::Simple => TaskComplexity::Simple,
        }
    }
}

impl fmt::Display for TaskComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskComplexity::Simple => write!(f, "simple"),
            TaskComplexity::Moderate => write!(f, "moderate"),
            TaskComplexity::Complex => write!(f, "complex"),
        }
    }
}

impl FromStr for TaskComplexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(TaskComplexity::Simple),
            "moderate" => Ok(TaskComplexity::Moderate),
            "complex" => Ok(TaskComplexity::Complex),
            other => Err(format!("invalid task complexity: '{other}'")),
        }
    }
}

/// Policy controlling candidate ordering within a complexity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Cheapest candidate first.
    Cost,
    /// Most expensive (most capable) candidate first.
    Performance,
    /// Hand-curated order.
    #[default]
    Balanced,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Cost, Strategy::Performance, Strategy::Balanced];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Cost => write!(f, "cost"),
            Strategy::Performance => write!(f, "performance"),
            Strategy::Balanced => write!(f, "balanced"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cost" => Ok(Strategy::Cost),
            "performance" => Ok(Strategy::Performance),
            "balanced" => Ok(Strategy::Balanced),
            other => Err(format!(
                "invalid strategy: '{other}' (expected cost, performance or balanced)"
            )),
        }
    }
}

/// One model eligible for a complexity tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCandidate {
    /// Model identifier passed to the provider.
    pub model: String,
    /// Blended cost in USD per million tokens.
    pub cost_per_million: f64,
    /// Rank within the tier; 1 = preferred.
    pub priority: u32,
}

impl ModelCandidate {
    pub fn new(model: impl Into<String>, cost_per_million: f64, priority: u32) -> Self {
        Self {
            model: model.into(),
            cost_per_million,
            priority,
        }
    }
}

/// Outcome of routing one turn. Ephemeral; never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub model: String,
    pub complexity: TaskComplexity,
    /// Human-readable explanation for display and logs.
    pub reason: String,
    /// The selected candidate's declared cost per million tokens.
    pub estimated_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_roundtrip() {
        for c in TaskComplexity::ALL {
            let parsed: TaskComplexity = c.to_string().parse().unwrap();
            assert_eq!(c, parsed);
        }
    }

    #[test]
    fn test_downgrade_is_single_step() {
        assert_eq!(TaskComplexity::Complex.downgrade(), TaskComplexity::Moderate);
        assert_eq!(TaskComplexity::Moderate.downgrade(), TaskComplexity::Simple);
        assert_eq!(TaskComplexity::Simple.downgrade(), TaskComplexity::Simple);
    }

    #[test]
    fn test_complexity_ordering() {
        assert!(TaskComplexity::Simple < TaskComplexity::Moderate);
        assert!(TaskComplexity::Moderate < TaskComplexity::Complex);
    }

    #[test]
    fn test_strategy_parse_case_insensitive() {
        assert_eq!("COST".parse::<Strategy>().unwrap(), Strategy::Cost);
        assert_eq!("Balanced".parse::<Strategy>().unwrap(), Strategy::Balanced);
        assert!("cheapest".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_serde() {
        let json = serde_json::to_string(&Strategy::Performance).unwrap();
        assert_eq!(json, "\"performance\"");
        assert_eq!(Strategy::default(), Strategy::Balanced);
    }
}
