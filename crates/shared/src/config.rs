//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Criteria, scoring and ranking behaviour.
    #[serde(default)]
    pub prioritization: PrioritizationConfig,
    /// Capital budget behaviour.
    #[serde(default)]
    pub budget: BudgetConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait when opening a connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    8
}

fn default_acquire_timeout() -> u64 {
    8
}

/// Criteria, scoring and ranking configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PrioritizationConfig {
    /// How many times a criteria mutation is retried after losing a concurrent commit.
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,
    /// Name of the auto-provisioned environmental criterion.
    #[serde(default = "default_environmental_criterion_name")]
    pub environmental_criterion_name: String,
    /// Weight (percentage points) requested when provisioning the environmental criterion.
    #[serde(default = "default_environmental_weight")]
    pub environmental_default_weight: u32,
    /// Default row count for recent audit activity.
    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: u64,
}

fn default_max_commit_retries() -> u32 {
    3
}

fn default_environmental_criterion_name() -> String {
    "Environmental Impact".to_string()
}

fn default_environmental_weight() -> u32 {
    10
}

fn default_recent_activity_limit() -> u64 {
    50
}

impl Default for PrioritizationConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: default_max_commit_retries(),
            environmental_criterion_name: default_environmental_criterion_name(),
            environmental_default_weight: default_environmental_weight(),
            recent_activity_limit: default_recent_activity_limit(),
        }
    }
}

/// Capital budget configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Reject allocations that push a year over its funding constraint.
    #[serde(default = "default_enforce_funding_constraints")]
    pub enforce_funding_constraints: bool,
}

fn default_enforce_funding_constraints() -> bool {
    true
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            enforce_funding_constraints: default_enforce_funding_constraints(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "keystone=info,sea_orm=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KEYSTONE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
