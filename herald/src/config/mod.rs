//! Process configuration loaded from the environment.
//!
//! Each component owns a typed config with a `Default` impl and a
//! `from_env_or_default()` constructor; [`AppConfig`] gathers them.

use crate::api::server::ApiServerConfig;
use crate::campaign::{ExecutorConfig, SchedulerConfig};
use crate::channels::TransportConfig;

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:herald.db?mode=rwc";

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_dir: String,
    pub api: ApiServerConfig,
    pub scheduler: SchedulerConfig,
    pub executor: ExecutorConfig,
    pub transport: TransportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_dir: DEFAULT_LOG_DIR.to_string(),
            api: ApiServerConfig::default(),
            scheduler: SchedulerConfig::default(),
            executor: ExecutorConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from environment variables (after `.env` has been applied).
    ///
    /// Supported env vars: `DATABASE_URL`, `LOG_DIR`, plus those read by each
    /// component config.
    pub fn from_env_or_default() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            log_dir: env_or("LOG_DIR", DEFAULT_LOG_DIR),
            api: ApiServerConfig::from_env_or_default(),
            scheduler: SchedulerConfig::from_env_or_default(),
            executor: ExecutorConfig::from_env_or_default(),
            transport: TransportConfig::from_env_or_default(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database_url, "sqlite:herald.db?mode=rwc");
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.api.port, 12580);
        assert_eq!(config.scheduler.interval.as_secs(), 60);
        assert_eq!(config.executor.dispatch_concurrency, 8);
        assert_eq!(config.transport.transport_type(), "log");
    }
}
