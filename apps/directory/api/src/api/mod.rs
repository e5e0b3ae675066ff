use axum::Router;
use axum::routing::get;
use domain_directory::{DirectoryCoordinator, PartitionStore, handlers};
use std::sync::Arc;

pub mod health;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new().nest(
        "/users",
        handlers::router_with_shared(state.coordinator.clone()),
    )
}

/// Creates a router with the /ready endpoint that pings both partitions.
///
/// It has its state applied and can be merged with the stateless app router
/// from `create_router`.
pub fn ready_router<S: PartitionStore + 'static>(
    coordinator: Arc<DirectoryCoordinator<S>>,
) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler::<S>))
        .with_state(coordinator)
}
