//! In-memory `UsageRepository` for unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use switchboard_types::error::RepositoryError;
use switchboard_types::usage::{
    BudgetConfig, BudgetPeriod, FailureLogEntry, ModelStats, UsageLogEntry,
};

use super::repository::UsageRepository;

#[derive(Default)]
struct Inner {
    usage: Vec<UsageLogEntry>,
    failures: Vec<FailureLogEntry>,
    budget: Option<BudgetConfig>,
}

#[derive(Clone, Default)]
pub struct InMemoryUsageRepository {
    inner: Arc<Mutex<Inner>>,
    fail_writes: bool,
}

impl InMemoryUsageRepository {
    /// A repository whose log writes always fail.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn usage_entries(&self) -> Vec<UsageLogEntry> {
        self.inner.lock().unwrap().usage.clone()
    }

    pub fn failure_entries(&self) -> Vec<FailureLogEntry> {
        self.inner.lock().unwrap().failures.clone()
    }

    fn write_guard(&self) -> Result<(), RepositoryError> {
        if self.fail_writes {
            Err(RepositoryError::Query("disk I/O error".to_string()))
        } else {
            Ok(())
        }
    }
}

impl UsageRepository for InMemoryUsageRepository {
    async fn log_usage(&self, entry: &UsageLogEntry) -> Result<(), RepositoryError> {
        self.write_guard()?;
        self.inner.lock().unwrap().usage.push(entry.clone());
        Ok(())
    }

    async fn log_failure(&self, entry: &FailureLogEntry) -> Result<(), RepositoryError> {
        self.write_guard()?;
        self.inner.lock().unwrap().failures.push(entry.clone());
        Ok(())
    }

    async fn get_budget_config(&self) -> Result<BudgetConfig, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .budget
            .clone()
            .unwrap_or_else(BudgetConfig::unlimited))
    }

    async fn set_budget_limit(
        &self,
        period: BudgetPeriod,
        limit: Option<f64>,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        let config = inner.budget.get_or_insert_with(BudgetConfig::unlimited);
        config.set_limit(period, limit);
        config.updated_at = Utc::now();
        Ok(())
    }

    async fn clear_budget_limits(&self) -> Result<(), RepositoryError> {
        self.inner.lock().unwrap().budget = Some(BudgetConfig::unlimited());
        Ok(())
    }

    async fn total_cost_since(&self, since: DateTime<Utc>) -> Result<f64, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .usage
            .iter()
            .filter(|e| e.timestamp >= since)
            .map(|e| e.cost)
            .sum())
    }

    async fn model_stats(&self) -> Result<Vec<ModelStats>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        let mut grouped: BTreeMap<&str, (u64, u64, f64)> = BTreeMap::new();
        for e in &inner.usage {
            let slot = grouped.entry(e.model.as_str()).or_default();
            slot.0 += 1;
            slot.1 += u64::from(e.success);
            slot.2 += e.cost;
        }
        Ok(grouped
            .into_iter()
            .map(|(model, (calls, ok, total))| ModelStats {
                model: model.to_string(),
                total_calls: calls,
                success_rate: ok as f64 / calls as f64 * 100.0,
                avg_cost: total / calls as f64,
                total_cost: total,
            })
            .collect())
    }

    async fn recent_usage(&self, limit: u32) -> Result<Vec<UsageLogEntry>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.usage.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn recent_failures(&self, limit: u32) -> Result<Vec<FailureLogEntry>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.failures.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn session_cost(&self, session_id: &str) -> Result<f64, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .usage
            .iter()
            .filter(|e| e.session_id == session_id)
            .map(|e| e.cost)
            .sum())
    }
}
