//! Usage ledger types.
//!
//! `UsageLogEntry` and `FailureLogEntry` are append-only records: once
//! written they are never updated. `BudgetConfig` is the single mutable row.
//! `ModelStats` and `BudgetStatus` are derived on every query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::routing::TaskComplexity;

/// Token counts for one provider call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Build a usage record; `total_tokens` is always derived.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// One billable provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub usage: TokenUsage,
    /// Cost in USD.
    pub cost: f64,
    pub complexity: TaskComplexity,
    pub session_id: String,
    pub success: bool,
}

/// One failed provider attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureLogEntry {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub error_message: String,
    /// The model tried next, if the router had one.
    pub fallback_model: Option<String>,
    /// Recorded at write time and never updated afterwards.
    pub fallback_succeeded: bool,
}

/// Rolling calendar window a spending limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl BudgetPeriod {
    pub const ALL: [BudgetPeriod; 3] = [BudgetPeriod::Daily, BudgetPeriod::Weekly, BudgetPeriod::Monthly];
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetPeriod::Daily => write!(f, "daily"),
            BudgetPeriod::Weekly => write!(f, "weekly"),
            BudgetPeriod::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(BudgetPeriod::Daily),
            "weekly" | "week" => Ok(BudgetPeriod::Weekly),
            "monthly" | "month" => Ok(BudgetPeriod::Monthly),
            other => Err(format!("invalid budget period: '{other}'")),
        }
    }
}

/// Spending limits in USD. Singleton row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub daily_limit: Option<f64>,
    pub weekly_limit: Option<f64>,
    pub monthly_limit: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetConfig {
    /// A config with no limits set.
    pub fn unlimited() -> Self {
        Self {
            daily_limit: None,
            weekly_limit: None,
            monthly_limit: None,
            updated_at: Utc::now(),
        }
    }

    pub fn limit_for(&self, period: BudgetPeriod) -> Option<f64> {
        match period {
            BudgetPeriod::Daily => self.daily_limit,
            BudgetPeriod::Weekly => self.weekly_limit,
            BudgetPeriod::Monthly => self.monthly_limit,
        }
    }

    pub fn set_limit(&mut self, period: BudgetPeriod, limit: Option<f64>) {
        match period {
            BudgetPeriod::Daily => self.daily_limit = limit,
            BudgetPeriod::Weekly => self.weekly_limit = limit,
            BudgetPeriod::Monthly => self.monthly_limit = limit,
        }
    }
}

/// Snapshot of one budget window, for budget bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub period: BudgetPeriod,
    pub limit: f64,
    pub spent: f64,
    /// `limit - spent`; negative when over budget.
    pub remaining: f64,
    /// `spent / limit * 100`; may exceed 100.
    pub percent_used: f64,
}

/// Per-model aggregate over the usage ledger. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub model: String,
    pub total_calls: u64,
    /// Percentage in `0.0..=100.0`.
    pub success_rate: f64,
    pub avg_cost: f64,
    pub total_cost: f64,
}
