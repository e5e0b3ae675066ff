use core_config::{env_parse_or_default, env_required, ConfigError, FromEnv};
use sea_orm::ConnectOptions;
use std::time::Duration;

/// PostgreSQL connection pool configuration.
///
/// Each directory partition owns an independent pool, so the service loads
/// one of these per partition with [`PostgresConfig::from_env_with_prefix`].
///
/// # Example
///
/// ```ignore
/// use database::postgres::PostgresConfig;
///
/// let a = PostgresConfig::from_env_with_prefix("PARTITION_A")?;
/// let b = PostgresConfig::from_env_with_prefix("PARTITION_B")?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    /// Database connection URL (required)
    pub url: String,

    pub max_connections: u32,

    pub min_connections: u32,

    pub connect_timeout_secs: u64,

    /// Upper bound on waiting for a pooled connection; exhaustion fails
    /// after this instead of blocking
    pub acquire_timeout_secs: u64,

    pub idle_timeout_secs: u64,

    pub max_lifetime_secs: u64,

    /// Enable SQL statement logging
    pub sqlx_logging: bool,
}

impl PostgresConfig {
    /// Create a config with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_pool_size(mut self, max_connections: u32, min_connections: u32) -> Self {
        self.max_connections = max_connections;
        self.min_connections = min_connections;
        self
    }

    pub fn with_acquire_timeout(mut self, secs: u64) -> Self {
        self.acquire_timeout_secs = secs;
        self
    }

    /// Load from `{prefix}_DATABASE_URL`, `{prefix}_DB_MAX_CONNECTIONS`, ...
    ///
    /// Variables (defaults in parentheses):
    /// - `{prefix}_DATABASE_URL` (required)
    /// - `{prefix}_DB_MAX_CONNECTIONS` (10)
    /// - `{prefix}_DB_MIN_CONNECTIONS` (1)
    /// - `{prefix}_DB_CONNECT_TIMEOUT_SECS` (8)
    /// - `{prefix}_DB_ACQUIRE_TIMEOUT_SECS` (8)
    /// - `{prefix}_DB_IDLE_TIMEOUT_SECS` (300)
    /// - `{prefix}_DB_MAX_LIFETIME_SECS` (1800)
    /// - `{prefix}_DB_SQLX_LOGGING` (false)
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        Self::load(|name| format!("{}_{}", prefix, name))
    }

    /// Convert this config into SeaORM ConnectOptions
    pub fn into_connect_options(self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(&self.url);
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .sqlx_logging(self.sqlx_logging);
        opt
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn load(key: impl Fn(&str) -> String) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            url: env_required(&key("DATABASE_URL"))?,
            max_connections: env_parse_or_default(
                &key("DB_MAX_CONNECTIONS"),
                &defaults.max_connections.to_string(),
            )?,
            min_connections: env_parse_or_default(
                &key("DB_MIN_CONNECTIONS"),
                &defaults.min_connections.to_string(),
            )?,
            connect_timeout_secs: env_parse_or_default(
                &key("DB_CONNECT_TIMEOUT_SECS"),
                &defaults.connect_timeout_secs.to_string(),
            )?,
            acquire_timeout_secs: env_parse_or_default(
                &key("DB_ACQUIRE_TIMEOUT_SECS"),
                &defaults.acquire_timeout_secs.to_string(),
            )?,
            idle_timeout_secs: env_parse_or_default(
                &key("DB_IDLE_TIMEOUT_SECS"),
                &defaults.idle_timeout_secs.to_string(),
            )?,
            max_lifetime_secs: env_parse_or_default(
                &key("DB_MAX_LIFETIME_SECS"),
                &defaults.max_lifetime_secs.to_string(),
            )?,
            sqlx_logging: env_parse_or_default(
                &key("DB_SQLX_LOGGING"),
                &defaults.sqlx_logging.to_string(),
            )?,
        })
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 8,
            acquire_timeout_secs: 8,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
            sqlx_logging: false,
        }
    }
}

/// Unprefixed variant (`DATABASE_URL`, `DB_MAX_CONNECTIONS`, ...)
impl FromEnv for PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::load(|name| name.to_string())
    }
}
