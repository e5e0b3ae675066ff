//! Application state management.

use database::postgres::DatabaseConnection;
use domain_directory::{DirectoryCoordinator, PgPartitionStore};
use std::sync::Arc;

/// Shared application state.
///
/// Cloning is cheap: the coordinator is behind an `Arc` and connections are
/// pool handles.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub coordinator: Arc<DirectoryCoordinator<PgPartitionStore>>,
    /// Pool for partition A, kept for shutdown
    pub db_a: DatabaseConnection,
    /// Pool for partition B, kept for shutdown
    pub db_b: DatabaseConnection,
}
