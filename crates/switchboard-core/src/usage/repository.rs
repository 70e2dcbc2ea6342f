//! Usage ledger repository trait definition.
//!
//! Defines the storage interface for the durable usage ledger. The
//! infrastructure layer (switchboard-infra) implements this trait with
//! SQLite persistence.

use chrono::{DateTime, Utc};
use switchboard_types::error::RepositoryError;
use switchboard_types::usage::{
    BudgetConfig, BudgetPeriod, FailureLogEntry, ModelStats, UsageLogEntry,
};

/// Repository trait for the usage ledger.
///
/// Covers three record families:
/// - **Usage logs:** append-only, one row per successful call.
/// - **Failure logs:** append-only, one row per failed attempt.
/// - **Budget config:** a single row with a fixed id, mutated in place.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait UsageRepository: Send + Sync {
    // -----------------------------------------------------------------------
    // Append-only logs
    // -----------------------------------------------------------------------

    /// Insert one usage row.
    fn log_usage(
        &self,
        entry: &UsageLogEntry,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert one failure row.
    fn log_failure(
        &self,
        entry: &FailureLogEntry,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Budget config (singleton)
    // -----------------------------------------------------------------------

    /// Read the budget row. Missing row means no limits.
    fn get_budget_config(
        &self,
    ) -> impl std::future::Future<Output = Result<BudgetConfig, RepositoryError>> + Send;

    /// Set or unset the limit for one period.
    fn set_budget_limit(
        &self,
        period: BudgetPeriod,
        limit: Option<f64>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Unset every limit.
    fn clear_budget_limits(
        &self,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Sum of `cost` over all usage rows at or after `since`, across sessions.
    fn total_cost_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<f64, RepositoryError>> + Send;

    /// Per-model aggregates, most expensive first. Computed on every call.
    fn model_stats(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ModelStats>, RepositoryError>> + Send;

    /// Most recent usage rows, newest first.
    fn recent_usage(
        &self,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<UsageLogEntry>, RepositoryError>> + Send;

    /// Most recent failure rows, newest first.
    fn recent_failures(
        &self,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<FailureLogEntry>, RepositoryError>> + Send;

    /// Total cost logged under one session id.
    fn session_cost(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<f64, RepositoryError>> + Send;
}
