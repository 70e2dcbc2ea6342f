//! Usage tracker service.
//!
//! Wraps a [`UsageRepository`] with the budget arithmetic: rolling calendar
//! windows, remaining budget and status snapshots for budget bars.

use chrono::{DateTime, Local, TimeZone};
use switchboard_types::error::RepositoryError;
use switchboard_types::usage::{
    BudgetConfig, BudgetPeriod, BudgetStatus, FailureLogEntry, ModelStats, UsageLogEntry,
};

use super::repository::UsageRepository;
use super::window::window_start;

/// Durable ledger plus budget queries.
///
/// Generic over the repository so switchboard-core never depends on
/// switchboard-infra.
#[derive(Debug, Clone)]
pub struct UsageTracker<R: UsageRepository> {
    repo: R,
}

impl<R: UsageRepository> UsageTracker<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub async fn log_usage(&self, entry: &UsageLogEntry) -> Result<(), RepositoryError> {
        self.repo.log_usage(entry).await?;
        tracing::debug!(
            model = %entry.model,
            cost = entry.cost,
            tokens = entry.usage.total_tokens,
            "Logged usage"
        );
        Ok(())
    }

    pub async fn log_failure(&self, entry: &FailureLogEntry) -> Result<(), RepositoryError> {
        self.repo.log_failure(entry).await?;
        tracing::debug!(
            model = %entry.model,
            fallback = entry.fallback_model.as_deref().unwrap_or("none"),
            "Logged failure"
        );
        Ok(())
    }

    pub async fn get_budget_config(&self) -> Result<BudgetConfig, RepositoryError> {
        self.repo.get_budget_config().await
    }

    pub async fn set_budget_limit(
        &self,
        period: BudgetPeriod,
        limit: Option<f64>,
    ) -> Result<(), RepositoryError> {
        self.repo.set_budget_limit(period, limit).await?;
        tracing::info!(%period, ?limit, "Budget limit updated");
        Ok(())
    }

    pub async fn clear_budget_limits(&self) -> Result<(), RepositoryError> {
        self.repo.clear_budget_limits().await?;
        tracing::info!("Budget limits cleared");
        Ok(())
    }

    /// Spend in the current `period` window.
    pub async fn get_spend(&self, period: BudgetPeriod) -> Result<f64, RepositoryError> {
        self.get_spend_at(period, &Local::now()).await
    }

    pub async fn get_spend_at<Tz: TimeZone>(
        &self,
        period: BudgetPeriod,
        now: &DateTime<Tz>,
    ) -> Result<f64, RepositoryError> {
        self.repo.total_cost_since(window_start(period, now)).await
    }

    /// `limit - spent` for `period`, or `None` when no limit is set.
    ///
    /// The result goes negative once the window is over budget.
    pub async fn get_budget_remaining(
        &self,
        period: BudgetPeriod,
    ) -> Result<Option<f64>, RepositoryError> {
        self.get_budget_remaining_at(period, &Local::now()).await
    }

    pub async fn get_budget_remaining_at<Tz: TimeZone>(
        &self,
        period: BudgetPeriod,
        now: &DateTime<Tz>,
    ) -> Result<Option<f64>, RepositoryError> {
        Ok(self
            .get_budget_status_at(period, now)
            .await?
            .map(|status| status.remaining))
    }

    pub async fn get_budget_status(
        &self,
        period: BudgetPeriod,
    ) -> Result<Option<BudgetStatus>, RepositoryError> {
        self.get_budget_status_at(period, &Local::now()).await
    }

    pub async fn get_budget_status_at<Tz: TimeZone>(
        &self,
        period: BudgetPeriod,
        now: &DateTime<Tz>,
    ) -> Result<Option<BudgetStatus>, RepositoryError> {
        let config = self.repo.get_budget_config().await?;
        let Some(limit) = config.limit_for(period) else {
            return Ok(None);
        };
        let spent = self.get_spend_at(period, now).await?;
        Ok(Some(status(period, limit, spent)))
    }

    /// Status for every period that has a limit, daily first.
    pub async fn all_budget_statuses(&self) -> Result<Vec<BudgetStatus>, RepositoryError> {
        let now = Local::now();
        let mut statuses = Vec::new();
        for period in BudgetPeriod::ALL {
            if let Some(status) = self.get_budget_status_at(period, &now).await? {
                statuses.push(status);
            }
        }
        Ok(statuses)
    }

    /// The smallest remaining amount across configured periods.
    ///
    /// This is what routing compares against the downgrade threshold.
    pub async fn tightest_budget_remaining(&self) -> Result<Option<f64>, RepositoryError> {
        let statuses = self.all_budget_statuses().await?;
        Ok(statuses
            .iter()
            .map(|s| s.remaining)
            .min_by(|a, b| a.total_cmp(b)))
    }

    pub async fn get_model_stats(&self) -> Result<Vec<ModelStats>, RepositoryError> {
        self.repo.model_stats().await
    }

    pub async fn recent_usage(&self, limit: u32) -> Result<Vec<UsageLogEntry>, RepositoryError> {
        self.repo.recent_usage(limit).await
    }

    pub async fn recent_failures(
        &self,
        limit: u32,
    ) -> Result<Vec<FailureLogEntry>, RepositoryError> {
        self.repo.recent_failures(limit).await
    }

    pub async fn session_cost(&self, session_id: &str) -> Result<f64, RepositoryError> {
        self.repo.session_cost(session_id).await
    }
}

fn status(period: BudgetPeriod, limit: f64, spent: f64) -> BudgetStatus {
    let percent_used = if limit > 0.0 {
        spent / limit * 100.0
    } else if spent > 0.0 {
        100.0
    } else {
        0.0
    };
    BudgetStatus {
        period,
        limit,
        spent,
        remaining: limit - spent,
        percent_used,
    }
}
