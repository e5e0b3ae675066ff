//! Database plumbing shared by the directory service.
//!
//! Provides PostgreSQL pool configuration (loadable per partition from
//! prefixed environment variables), connection with retry, and health checks.
//!
//! # Example
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//!
//! let config = PostgresConfig::from_env_with_prefix("PARTITION_A")?;
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::check_health(&db).await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult, RetryConfig};
