use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::postgres::{
    DatabaseConnection, PostgresConfig, check_health, connect_from_config_with_retry,
};
use domain_directory::{DirectoryCoordinator, PgPartitionStore};
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

/// Connect one partition pool and verify it answers before serving traffic
async fn connect_partition(
    partition: &'static str,
    config: PostgresConfig,
) -> eyre::Result<DatabaseConnection> {
    let db = connect_from_config_with_retry(config, None)
        .await
        .map_err(|e| eyre::eyre!("Partition {} connection failed: {}", partition, e))?;

    check_health(&db)
        .await
        .map_err(|e| eyre::eyre!("Partition {} health check failed: {}", partition, e))?;

    info!(partition, "Partition connected");
    Ok(db)
}

async fn close_partition(partition: &'static str, db: DatabaseConnection) {
    match db.close().await {
        Ok(_) => info!(partition, "Partition pool closed"),
        Err(e) => tracing::error!(partition, "Error closing partition pool: {}", e),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    // Partitions are independent; connect them concurrently
    let (db_a, db_b) = tokio::try_join!(
        connect_partition("A", config.partition_a.database.clone()),
        connect_partition("B", config.partition_b.database.clone()),
    )?;

    let call_timeout = config.directory.call_timeout;
    let store_a = PgPartitionStore::new(db_a.clone(), &config.partition_a.table)?
        .with_statement_timeout(call_timeout);
    let store_b = PgPartitionStore::new(db_b.clone(), &config.partition_b.table)?
        .with_statement_timeout(call_timeout);

    if config.directory.ensure_schema {
        tokio::try_join!(store_a.ensure_schema(), store_b.ensure_schema())?;
    }

    info!(
        placement = %config.directory.placement,
        call_timeout = ?config.directory.call_timeout,
        table_a = %store_a.table(),
        table_b = %store_b.table(),
        "Directory coordinator configured"
    );

    let coordinator = DirectoryCoordinator::new(store_a, store_b)
        .with_placement(config.directory.placement.into_policy())
        .with_call_timeout(call_timeout);

    let state = AppState {
        config,
        coordinator: Arc::new(coordinator),
        db_a,
        db_b,
    };

    let api_routes = api::routes(&state);

    // create_router adds docs/middleware to our composed routes
    let router = create_router::<openapi::ApiDoc>(api_routes, &state.config.server);

    // - /health: liveness with app name/version
    // - /ready: pings both partitions
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.coordinator.clone()));

    let server_config = state.config.server.clone();
    info!(
        "Starting directory API (shutdown timeout {:?})",
        server_config.shutdown_timeout
    );

    create_production_app(app, &server_config, async move {
        info!("Shutting down: closing partition pools");
        let AppState { db_a, db_b, .. } = state;
        tokio::join!(close_partition("A", db_a), close_partition("B", db_b));
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Directory API shutdown complete");
    Ok(())
}
