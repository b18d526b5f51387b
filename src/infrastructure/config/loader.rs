use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".reasoning_bank";

/// Environment variable prefix; `__` separates nested keys.
pub const ENV_PREFIX: &str = "REASONING_BANK_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid operation_timeout_ms: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid {0}: must be at least 1")]
    InvalidCapacity(&'static str),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. .reasoning_bank/config.yaml
    /// 3. .reasoning_bank/local.yaml (optional overrides)
    /// 4. Environment variables (REASONING_BANK_* prefix)
    pub fn load() -> Result<Config> {
        Self::load_layered(Path::new(CONFIG_DIR), ENV_PREFIX)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn load_layered(dir: &Path, env_prefix: &str) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let storage = &config.storage;
        if storage.initial_backoff_ms > storage.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                storage.initial_backoff_ms,
                storage.max_backoff_ms,
            ));
        }

        if storage.operation_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(storage.operation_timeout_ms));
        }

        if config.trajectory_store.max_resident == 0 {
            return Err(ConfigError::InvalidCapacity("trajectory_store.max_resident"));
        }

        if config.trajectory_store.idle_ttl_secs == 0 {
            return Err(ConfigError::InvalidCapacity("trajectory_store.idle_ttl_secs"));
        }

        if config.events.channel_capacity == 0 {
            return Err(ConfigError::InvalidCapacity("events.channel_capacity"));
        }

        if config.feedback.batch_concurrency == 0 {
            return Err(ConfigError::InvalidCapacity("feedback.batch_concurrency"));
        }

        Ok(())
    }
}
