use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse_or_default,
    server::ServerConfig,
};
use database::postgres::PostgresConfig;
use domain_directory::PlacementStrategy;
use std::time::Duration;

pub use core_config::Environment;

pub const DEFAULT_TABLE_A: &str = "users";
pub const DEFAULT_TABLE_B: &str = "users_server2";

/// One partition: its own pool settings and backing table
#[derive(Clone, Debug)]
pub struct PartitionConfig {
    pub database: PostgresConfig,
    pub table: String,
}

impl PartitionConfig {
    /// Reads `{prefix}_DATABASE_URL`, `{prefix}_DB_*` and `{prefix}_TABLE`
    pub fn from_env_with_prefix(prefix: &str, default_table: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            database: PostgresConfig::from_env_with_prefix(prefix)?,
            table: env_or_default(&format!("{}_TABLE", prefix), default_table),
        })
    }
}

/// Coordinator behaviour
#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    pub placement: PlacementStrategy,
    pub call_timeout: Duration,
    /// Create missing partition tables at startup
    pub ensure_schema: bool,
}

impl FromEnv for DirectoryConfig {
    /// - DIRECTORY_PLACEMENT: a | b | hashed (default a)
    /// - DIRECTORY_CALL_TIMEOUT_MS: 5000
    /// - DIRECTORY_ENSURE_SCHEMA: true
    fn from_env() -> Result<Self, ConfigError> {
        let call_timeout_ms: u64 = env_parse_or_default("DIRECTORY_CALL_TIMEOUT_MS", "5000")?;
        if call_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DIRECTORY_CALL_TIMEOUT_MS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            placement: env_parse_or_default("DIRECTORY_PLACEMENT", "a")?,
            call_timeout: Duration::from_millis(call_timeout_ms),
            ensure_schema: env_parse_or_default("DIRECTORY_ENSURE_SCHEMA", "true")?,
        })
    }
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub partition_a: PartitionConfig,
    pub partition_b: PartitionConfig,
    pub directory: DirectoryConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let partition_a = PartitionConfig::from_env_with_prefix("PARTITION_A", DEFAULT_TABLE_A)?;
        let partition_b = PartitionConfig::from_env_with_prefix("PARTITION_B", DEFAULT_TABLE_B)?;
        let directory = DirectoryConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            partition_a,
            partition_b,
            directory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLS: [(&str, Option<&str>); 2] = [
        ("PARTITION_A_DATABASE_URL", Some("postgres://a/users")),
        ("PARTITION_B_DATABASE_URL", Some("postgres://b/users")),
    ];

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars(
            [
                URLS[0],
                URLS[1],
                ("PARTITION_A_TABLE", None),
                ("PARTITION_B_TABLE", None),
                ("DIRECTORY_PLACEMENT", None),
                ("DIRECTORY_CALL_TIMEOUT_MS", None),
                ("DIRECTORY_ENSURE_SCHEMA", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.app.name, "directory_api");
                assert_eq!(config.partition_a.table, "users");
                assert_eq!(config.partition_b.table, "users_server2");
                assert_eq!(config.partition_b.database.url, "postgres://b/users");
                assert_eq!(config.directory.placement, PlacementStrategy::A);
                assert_eq!(config.directory.call_timeout, Duration::from_secs(5));
                assert!(config.directory.ensure_schema);
            },
        );
    }

    #[test]
    fn test_config_overrides() {
        temp_env::with_vars(
            [
                URLS[0],
                URLS[1],
                ("PARTITION_B_TABLE", Some("directory_b")),
                ("DIRECTORY_PLACEMENT", Some("hashed")),
                ("DIRECTORY_CALL_TIMEOUT_MS", Some("250")),
                ("DIRECTORY_ENSURE_SCHEMA", Some("false")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.partition_b.table, "directory_b");
                assert_eq!(config.directory.placement, PlacementStrategy::Hashed);
                assert_eq!(config.directory.call_timeout, Duration::from_millis(250));
                assert!(!config.directory.ensure_schema);
            },
        );
    }

    #[test]
    fn test_config_requires_both_partitions() {
        temp_env::with_vars([URLS[0], ("PARTITION_B_DATABASE_URL", None)], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("PARTITION_B_DATABASE_URL"));
        });
    }

    #[test]
    fn test_config_rejects_unknown_placement() {
        temp_env::with_vars(
            [URLS[0], URLS[1], ("DIRECTORY_PLACEMENT", Some("random"))],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("DIRECTORY_PLACEMENT"));
            },
        );
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        temp_env::with_var("DIRECTORY_CALL_TIMEOUT_MS", Some("0"), || {
            let err = DirectoryConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
        });
    }
}
