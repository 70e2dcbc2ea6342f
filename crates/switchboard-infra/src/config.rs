//! Global configuration loader for Switchboard.
//!
//! Reads `config.toml` from the data directory (`~/.switchboard/` in
//! production) and deserializes it into [`GlobalConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use switchboard_core::routing::RoutingTable;
use switchboard_types::config::GlobalConfig;
use switchboard_types::error::RoutingError;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "SWITCHBOARD_DATA_DIR";

/// Resolve the data directory.
///
/// Priority:
/// 1. `SWITCHBOARD_DATA_DIR`
/// 2. `~/.switchboard`
/// 3. `./.switchboard` when no home directory can be found
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".switchboard");
    }

    PathBuf::from(".switchboard")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - A negative or non-finite `budget_threshold` is replaced by the default.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    let mut config = match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            return GlobalConfig::default();
        }
    };

    if !config.budget_threshold.is_finite() || config.budget_threshold < 0.0 {
        tracing::warn!(
            threshold = config.budget_threshold,
            "Invalid budget_threshold in config.toml, using default"
        );
        config.budget_threshold = GlobalConfig::default().budget_threshold;
    }

    config
}

/// The routing table to use: the `[routing_table]` override when present,
/// otherwise the curated default.
///
/// An override that fails validation is an error rather than a silent
/// fallback, since it would otherwise route to unexpected models.
pub fn resolve_routing_table(config: &GlobalConfig) -> Result<RoutingTable, RoutingError> {
    match &config.routing_table {
        Some(table) => {
            let table = RoutingTable::from_config(table)?;
            tracing::debug!("Using routing table from config.toml");
            Ok(table)
        }
        None => Ok(RoutingTable::default()),
    }
}
