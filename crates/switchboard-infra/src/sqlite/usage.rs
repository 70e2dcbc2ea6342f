//! SQLite usage ledger repository implementation.
//!
//! `usage_logs` and `failure_logs` are insert-only. `budget_config` holds a
//! single row (id = 1) seeded by the migration and updated in place.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use switchboard_core::usage::UsageRepository;
use switchboard_types::error::RepositoryError;
use switchboard_types::routing::TaskComplexity;
use switchboard_types::usage::{
    BudgetConfig, BudgetPeriod, FailureLogEntry, ModelStats, TokenUsage, UsageLogEntry,
};

use super::pool::DatabasePool;

/// SQLite-backed implementation of [`UsageRepository`].
#[derive(Clone)]
pub struct SqliteUsageRepository {
    pool: DatabasePool,
}

impl SqliteUsageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn limit_column(period: BudgetPeriod) -> &'static str {
    match period {
        BudgetPeriod::Daily => "daily_limit",
        BudgetPeriod::Weekly => "weekly_limit",
        BudgetPeriod::Monthly => "monthly_limit",
    }
}

impl UsageRepository for SqliteUsageRepository {
    async fn log_usage(&self, entry: &UsageLogEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO usage_logs (timestamp, model, prompt_tokens, completion_tokens, total_tokens, cost, complexity, session_id, success)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(format_datetime(&entry.timestamp))
        .bind(&entry.model)
        .bind(i64::from(entry.usage.prompt_tokens))
        .bind(i64::from(entry.usage.completion_tokens))
        .bind(i64::from(entry.usage.total_tokens))
        .bind(entry.cost)
        .bind(entry.complexity.to_string())
        .bind(&entry.session_id)
        .bind(entry.success)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn log_failure(&self, entry: &FailureLogEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO failure_logs (timestamp, model, error_message, fallback_model, fallback_succeeded)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(format_datetime(&entry.timestamp))
        .bind(&entry.model)
        .bind(&entry.error_message)
        .bind(&entry.fallback_model)
        .bind(entry.fallback_succeeded)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_budget_config(&self) -> Result<BudgetConfig, RepositoryError> {
        let row = sqlx::query(
            "SELECT daily_limit, weekly_limit, monthly_limit, updated_at FROM budget_config WHERE id = 1",
        )
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(BudgetConfig::unlimited());
        };

        Ok(BudgetConfig {
            daily_limit: row
                .try_get("daily_limit")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            weekly_limit: row
                .try_get("weekly_limit")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            monthly_limit: row
                .try_get("monthly_limit")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            updated_at: parse_datetime(
                &row.try_get::<String, _>("updated_at")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?,
            )?,
        })
    }

    async fn set_budget_limit(
        &self,
        period: BudgetPeriod,
        limit: Option<f64>,
    ) -> Result<(), RepositoryError> {
        let column = limit_column(period);
        let sql = format!(
            "INSERT INTO budget_config (id, {column}, updated_at) VALUES (1, ?, ?)
             ON CONFLICT (id) DO UPDATE SET {column} = excluded.{column}, updated_at = excluded.updated_at"
        );
        sqlx::query(&sql)
            .bind(limit)
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn clear_budget_limits(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO budget_config (id, daily_limit, weekly_limit, monthly_limit, updated_at)
               VALUES (1, NULL, NULL, NULL, ?)
               ON CONFLICT (id) DO UPDATE SET
                   daily_limit = NULL,
                   weekly_limit = NULL,
                   monthly_limit = NULL,
                   updated_at = excluded.updated_at"#,
        )
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn total_cost_since(&self, since: DateTime<Utc>) -> Result<f64, RepositoryError> {
        let (total,): (f64,) =
            sqlx::query_as("SELECT COALESCE(SUM(cost), 0.0) FROM usage_logs WHERE timestamp >= ?")
                .bind(format_datetime(&since))
                .fetch_one(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(total)
    }

    async fn model_stats(&self) -> Result<Vec<ModelStats>, RepositoryError> {
        // Failed attempts count as calls with zero cost.
        let rows = sqlx::query(
            r#"WITH calls AS (
                   SELECT model, success, cost FROM usage_logs
                   UNION ALL
                   SELECT model, 0 AS success, 0.0 AS cost FROM failure_logs
               )
               SELECT model,
                      COUNT(*) AS total_calls,
                      SUM(success) AS successes,
                      COALESCE(SUM(cost), 0.0) AS total_cost
               FROM calls
               GROUP BY model
               ORDER BY total_cost DESC, model ASC"#,
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut stats = Vec::with_capacity(rows.len());
        for row in &rows {
            let stat_row =
                StatsSqlRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            stats.push(stat_row.into_model_stats());
        }

        Ok(stats)
    }

    async fn recent_usage(&self, limit: u32) -> Result<Vec<UsageLogEntry>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM usage_logs ORDER BY timestamp DESC, id DESC LIMIT ?")
            .bind(i64::from(limit))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let usage_row =
                UsageSqlRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            entries.push(usage_row.into_entry()?);
        }

        Ok(entries)
    }

    async fn recent_failures(&self, limit: u32) -> Result<Vec<FailureLogEntry>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM failure_logs ORDER BY timestamp DESC, id DESC LIMIT ?")
                .bind(i64::from(limit))
                .fetch_all(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let failure_row =
                FailureSqlRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            entries.push(failure_row.into_entry()?);
        }

        Ok(entries)
    }

    async fn session_cost(&self, session_id: &str) -> Result<f64, RepositoryError> {
        let (total,): (f64,) =
            sqlx::query_as("SELECT COALESCE(SUM(cost), 0.0) FROM usage_logs WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(total)
    }
}

// ---------------------------------------------------------------------------
// Private Row types
// ---------------------------------------------------------------------------

struct UsageSqlRow {
    timestamp: String,
    model: String,
    prompt_tokens: i64,
    completion_tokens: i64,
    cost: f64,
    complexity: String,
    session_id: String,
    success: bool,
}

impl UsageSqlRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            timestamp: row.try_get("timestamp")?,
            model: row.try_get("model")?,
            prompt_tokens: row.try_get("prompt_tokens")?,
            completion_tokens: row.try_get("completion_tokens")?,
            cost: row.try_get("cost")?,
            complexity: row.try_get("complexity")?,
            session_id: row.try_get("session_id")?,
            success: row.try_get("success")?,
        })
    }

    fn into_entry(self) -> Result<UsageLogEntry, RepositoryError> {
        let complexity: TaskComplexity = self
            .complexity
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid complexity: {e}")))?;

        Ok(UsageLogEntry {
            timestamp: parse_datetime(&self.timestamp)?,
            model: self.model,
            usage: TokenUsage::new(
                clamp_tokens(self.prompt_tokens),
                clamp_tokens(self.completion_tokens),
            ),
            cost: self.cost,
            complexity,
            session_id: self.session_id,
            success: self.success,
        })
    }
}

struct FailureSqlRow {
    timestamp: String,
    model: String,
    error_message: String,
    fallback_model: Option<String>,
    fallback_succeeded: bool,
}

impl FailureSqlRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            timestamp: row.try_get("timestamp")?,
            model: row.try_get("model")?,
            error_message: row.try_get("error_message")?,
            fallback_model: row.try_get("fallback_model")?,
            fallback_succeeded: row.try_get("fallback_succeeded")?,
        })
    }

    fn into_entry(self) -> Result<FailureLogEntry, RepositoryError> {
        Ok(FailureLogEntry {
            timestamp: parse_datetime(&self.timestamp)?,
            model: self.model,
            error_message: self.error_message,
            fallback_model: self.fallback_model,
            fallback_succeeded: self.fallback_succeeded,
        })
    }
}

struct StatsSqlRow {
    model: String,
    total_calls: i64,
    successes: i64,
    total_cost: f64,
}

impl StatsSqlRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            model: row.try_get("model")?,
            total_calls: row.try_get("total_calls")?,
            successes: row.try_get("successes")?,
            total_cost: row.try_get("total_cost")?,
        })
    }

    /// Average cost is per billed (successful) call.
    fn into_model_stats(self) -> ModelStats {
        let calls = self.total_calls.max(0) as u64;
        let successes = self.successes.max(0) as u64;
        let success_rate = if calls == 0 {
            0.0
        } else {
            successes as f64 / calls as f64 * 100.0
        };
        let avg_cost = if successes == 0 {
            0.0
        } else {
            self.total_cost / successes as f64
        };

        ModelStats {
            model: self.model,
            total_calls: calls,
            success_rate,
            avg_cost,
            total_cost: self.total_cost,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn clamp_tokens(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC timestamps keep `timestamp >= ?` comparisons chronological.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use switchboard_core::usage::UsageTracker;

    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn usage_entry(model: &str, cost: f64, timestamp: DateTime<Utc>) -> UsageLogEntry {
        UsageLogEntry {
            timestamp,
            model: model.to_string(),
            usage: TokenUsage::new(1_200, 300),
            cost,
            complexity: TaskComplexity::Moderate,
            session_id: "session-a".to_string(),
            success: true,
        }
    }

    fn failure_entry(model: &str, fallback: Option<&str>) -> FailureLogEntry {
        FailureLogEntry {
            timestamp: Utc::now(),
            model: model.to_string(),
            error_message: "provider overloaded".to_string(),
            fallback_model: fallback.map(str::to_string),
            fallback_succeeded: false,
        }
    }

    fn noon_today() -> DateTime<Utc> {
        Utc::now()
            .date_naive()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[tokio::test]
    async fn test_log_usage_roundtrip() {
        let repo = SqliteUsageRepository::new(test_pool().await);
        let ts = Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap();
        repo.log_usage(&usage_entry("claude-sonnet-4-5", 0.42, ts))
            .await
            .unwrap();

        let recent = repo.recent_usage(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        let entry = &recent[0];
        assert_eq!(entry.timestamp, ts);
        assert_eq!(entry.model, "claude-sonnet-4-5");
        assert_eq!(entry.usage, TokenUsage::new(1_200, 300));
        assert!((entry.cost - 0.42).abs() < 1e-12);
        assert_eq!(entry.complexity, TaskComplexity::Moderate);
        assert!(entry.success);
    }

    #[tokio::test]
    async fn test_log_failure_roundtrip() {
        let repo = SqliteUsageRepository::new(test_pool().await);
        repo.log_failure(&failure_entry("claude-opus-4-1", Some("claude-sonnet-4-5")))
            .await
            .unwrap();
        repo.log_failure(&failure_entry("claude-sonnet-4-5", None))
            .await
            .unwrap();

        let failures = repo.recent_failures(10).await.unwrap();
        assert_eq!(failures.len(), 2);
        let with_fallback = failures
            .iter()
            .find(|f| f.model == "claude-opus-4-1")
            .unwrap();
        assert_eq!(with_fallback.fallback_model.as_deref(), Some("claude-sonnet-4-5"));
        assert!(!with_fallback.fallback_succeeded);
    }

    #[tokio::test]
    async fn test_budget_config_defaults_to_unlimited() {
        let repo = SqliteUsageRepository::new(test_pool().await);
        let config = repo.get_budget_config().await.unwrap();
        assert_eq!(config.daily_limit, None);
        assert_eq!(config.weekly_limit, None);
        assert_eq!(config.monthly_limit, None);
    }

    #[tokio::test]
    async fn test_set_and_clear_budget_limits() {
        let repo = SqliteUsageRepository::new(test_pool().await);
        repo.set_budget_limit(BudgetPeriod::Daily, Some(10.0))
            .await
            .unwrap();
        repo.set_budget_limit(BudgetPeriod::Monthly, Some(200.0))
            .await
            .unwrap();

        let config = repo.get_budget_config().await.unwrap();
        assert_eq!(config.daily_limit, Some(10.0));
        assert_eq!(config.weekly_limit, None);
        assert_eq!(config.monthly_limit, Some(200.0));

        repo.set_budget_limit(BudgetPeriod::Daily, None).await.unwrap();
        assert_eq!(repo.get_budget_config().await.unwrap().daily_limit, None);

        repo.clear_budget_limits().await.unwrap();
        let config = repo.get_budget_config().await.unwrap();
        assert_eq!(config.monthly_limit, None);

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM budget_config")
            .fetch_one(&repo.pool.reader)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_daily_budget_remaining_excludes_yesterday() {
        let tracker = UsageTracker::new(SqliteUsageRepository::new(test_pool().await));
        let now = noon_today() + Duration::hours(2);

        tracker
            .set_budget_limit(BudgetPeriod::Daily, Some(10.0))
            .await
            .unwrap();
        tracker
            .log_usage(&usage_entry("claude-sonnet-4-5", 1.25, noon_today()))
            .await
            .unwrap();
        tracker
            .log_usage(&usage_entry("gpt-4.1", 1.75, noon_today() + Duration::minutes(5)))
            .await
            .unwrap();
        tracker
            .log_usage(&usage_entry("gpt-4.1", 5.0, noon_today() - Duration::days(1)))
            .await
            .unwrap();

        let remaining = tracker
            .get_budget_remaining_at(BudgetPeriod::Daily, &now)
            .await
            .unwrap()
            .unwrap();
        assert!((remaining - 7.0).abs() < 1e-9, "expected 7.0, got {remaining}");

        assert_eq!(
            tracker
                .get_budget_remaining_at(BudgetPeriod::Weekly, &now)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_window_boundary_is_inclusive() {
        let repo = SqliteUsageRepository::new(test_pool().await);
        let midnight = Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap();
        repo.log_usage(&usage_entry("m", 1.0, midnight)).await.unwrap();
        repo.log_usage(&usage_entry("m", 2.0, midnight - Duration::microseconds(1)))
            .await
            .unwrap();

        let spent = repo.total_cost_since(midnight).await.unwrap();
        assert!((spent - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_spend_is_account_wide() {
        let repo = SqliteUsageRepository::new(test_pool().await);
        let ts = Utc::now();
        let mut other = usage_entry("m", 2.0, ts);
        other.session_id = "session-b".to_string();
        repo.log_usage(&usage_entry("m", 1.0, ts)).await.unwrap();
        repo.log_usage(&other).await.unwrap();

        let spent = repo
            .total_cost_since(ts - Duration::hours(1))
            .await
            .unwrap();
        assert!((spent - 3.0).abs() < 1e-12);
        assert!((repo.session_cost("session-a").await.unwrap() - 1.0).abs() < 1e-12);
        assert!((repo.session_cost("session-b").await.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(repo.session_cost("nobody").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_model_stats_aggregates_successes_and_failures() {
        let repo = SqliteUsageRepository::new(test_pool().await);
        let ts = Utc::now();
        repo.log_usage(&usage_entry("claude-opus-4-1", 3.0, ts)).await.unwrap();
        repo.log_usage(&usage_entry("claude-opus-4-1", 1.0, ts)).await.unwrap();
        repo.log_failure(&failure_entry("claude-opus-4-1", Some("claude-sonnet-4-5")))
            .await
            .unwrap();
        repo.log_failure(&failure_entry("claude-opus-4-1", None))
            .await
            .unwrap();
        repo.log_usage(&usage_entry("gpt-4o-mini", 0.01, ts)).await.unwrap();

        let stats = repo.model_stats().await.unwrap();
        assert_eq!(stats.len(), 2);

        let opus = &stats[0];
        assert_eq!(opus.model, "claude-opus-4-1");
        assert_eq!(opus.total_calls, 4);
        assert!((opus.success_rate - 50.0).abs() < 1e-9);
        assert!((opus.avg_cost - 2.0).abs() < 1e-9);
        assert!((opus.total_cost - 4.0).abs() < 1e-9);

        let mini = &stats[1];
        assert_eq!(mini.total_calls, 1);
        assert!((mini.success_rate - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_model_stats_recomputed_each_call() {
        let repo = SqliteUsageRepository::new(test_pool().await);
        assert!(repo.model_stats().await.unwrap().is_empty());
        repo.log_usage(&usage_entry("m", 1.0, Utc::now())).await.unwrap();
        assert_eq!(repo.model_stats().await.unwrap()[0].total_calls, 1);
        repo.log_usage(&usage_entry("m", 1.0, Utc::now())).await.unwrap();
        assert_eq!(repo.model_stats().await.unwrap()[0].total_calls, 2);
    }

    #[tokio::test]
    async fn test_recent_usage_newest_first_and_limited() {
        let repo = SqliteUsageRepository::new(test_pool().await);
        let base = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
        for i in 0..5 {
            repo.log_usage(&usage_entry(&format!("m{i}"), 0.1, base + Duration::minutes(i)))
                .await
                .unwrap();
        }
        let recent = repo.recent_usage(3).await.unwrap();
        let models: Vec<&str> = recent.iter().map(|e| e.model.as_str()).collect();
        assert_eq!(models, vec!["m4", "m3", "m2"]);
    }

    #[test]
    fn test_format_datetime_is_fixed_width() {
        let a = format_datetime(&Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let b = format_datetime(
            &(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::microseconds(5)),
        );
        assert_eq!(a, "2026-01-01T00:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }
}
