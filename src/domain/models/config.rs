use serde::{Deserialize, Serialize};

/// Main configuration structure for the reasoning bank
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Durable-store retry and timeout policy
    #[serde(default)]
    pub storage: StorageConfig,

    /// Resident trajectory tier
    #[serde(default)]
    pub trajectory_store: TrajectoryStoreConfig,

    /// Observability bus
    #[serde(default)]
    pub events: EventsConfig,

    /// Hyperedge graph storage
    #[serde(default)]
    pub hyperedges: HyperedgeConfig,

    /// Feedback ingestion
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".reasoning_bank/reasoning_bank.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            retention_days: default_retention_days(),
        }
    }
}

/// Retry and timeout policy for durable-store operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Per-attempt timeout in milliseconds
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    50
}

const fn default_max_backoff_ms() -> u64 {
    1_000
}

const fn default_operation_timeout_ms() -> u64 {
    5_000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

/// Resident trajectory tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrajectoryStoreConfig {
    /// Maximum number of full trajectories kept in process
    #[serde(default = "default_max_resident")]
    pub max_resident: u64,

    /// Evict trajectories not read for this many seconds
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

const fn default_max_resident() -> u64 {
    10_000
}

const fn default_idle_ttl_secs() -> u64 {
    3_600
}

impl Default for TrajectoryStoreConfig {
    fn default() -> Self {
        Self {
            max_resident: default_max_resident(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

/// Observability bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EventsConfig {
    /// Broadcast channel capacity; slow subscribers lose older events
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

const fn default_channel_capacity() -> usize {
    1024
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Where the hyperedge graph lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HyperedgeBackend {
    /// Process-local graph, lost on restart
    #[default]
    Memory,
    /// Stored alongside trajectory metadata
    Sqlite,
}

/// Hyperedge graph configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HyperedgeConfig {
    #[serde(default)]
    pub backend: HyperedgeBackend,
}

/// Feedback ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeedbackConfig {
    /// Maximum feedback events processed concurrently by batch ingestion
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

const fn default_batch_concurrency() -> usize {
    8
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            batch_concurrency: default_batch_concurrency(),
        }
    }
}
