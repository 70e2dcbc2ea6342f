//! Application state wiring the router, ledger and provider together.
//!
//! AppState holds the concrete service instances used by the CLI. Core
//! services are generic over the ledger trait; AppState pins them to the
//! SQLite implementation.

use std::path::PathBuf;

use anyhow::Context;

use switchboard_core::cost::PricingTable;
use switchboard_core::llm::{BoxLlmProvider, ProviderManager};
use switchboard_core::routing::{ModelRouter, RoutingState};
use switchboard_core::usage::UsageTracker;
use switchboard_infra::config::{load_global_config, resolve_data_dir, resolve_routing_table};
use switchboard_infra::llm::create_provider;
use switchboard_infra::sqlite::pool::{DatabasePool, database_url};
use switchboard_infra::sqlite::usage::SqliteUsageRepository;
use switchboard_types::config::GlobalConfig;
use switchboard_types::routing::Strategy;

/// Usage tracker pinned to the SQLite ledger.
pub type ConcreteUsageTracker = UsageTracker<SqliteUsageRepository>;

/// Provider manager pinned to the SQLite ledger.
pub type ConcreteProviderManager = ProviderManager<SqliteUsageRepository>;

/// Command-line values that take precedence over `config.toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingOverrides {
    pub strategy: Option<Strategy>,
    pub budget_threshold: Option<f64>,
}

/// Shared application state.
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: GlobalConfig,
    pub db_pool: DatabasePool,
    pub tracker: ConcreteUsageTracker,
    pub router: ModelRouter,
    pub pricing: PricingTable,
}

impl AppState {
    /// Initialize the application state: load config, open the ledger,
    /// build the router.
    pub async fn init(overrides: RoutingOverrides) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open usage ledger")?;
        let tracker = UsageTracker::new(SqliteUsageRepository::new(db_pool.clone()));

        let table = resolve_routing_table(&config).context("invalid [routing_table] in config.toml")?;
        let threshold = match overrides.budget_threshold {
            Some(t) if !t.is_finite() || t < 0.0 => {
                anyhow::bail!("--budget-threshold must be a non-negative amount, got {t}")
            }
            Some(t) => t,
            None => config.budget_threshold,
        };
        let state = RoutingState::new(overrides.strategy.unwrap_or(config.strategy), threshold);
        let router = ModelRouter::new(table, state);

        let pricing = PricingTable::new(config.model_pricing.clone());

        tracing::debug!(
            data_dir = %data_dir.display(),
            strategy = %router.strategy(),
            threshold,
            "Application state initialized"
        );

        Ok(Self {
            data_dir,
            config,
            db_pool,
            tracker,
            router,
            pricing,
        })
    }

    /// Build the configured provider and a manager for one session.
    ///
    /// Fails when the provider has no usable API key, since every call would
    /// fail on every fallback attempt.
    pub async fn provider_manager(&self, session_id: &str) -> anyhow::Result<ConcreteProviderManager> {
        let backend = create_provider(&self.config.provider, self.pricing.clone())
            .context("failed to create LLM provider")?;
        let provider = BoxLlmProvider::new(backend);

        if !provider.is_available().await {
            anyhow::bail!(
                "provider '{}' is not available: set {} to an API key",
                provider.name(),
                self.config.provider.api_key_env
            );
        }

        Ok(ProviderManager::new(
            provider,
            self.router.clone(),
            self.tracker.clone(),
            session_id,
        ))
    }
}
