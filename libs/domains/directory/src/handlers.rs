use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use axum_helpers::{
    IdPath, ValidatedJson,
    errors::responses::{
        BadRequestIdResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::coordinator::DirectoryCoordinator;
use crate::error::DirectoryResult;
use crate::models::{CreatedUser, Deleted, Partition, Updated, User, UserInput};
use crate::store::PartitionStore;

pub const TAG: &str = "users";

/// OpenAPI documentation for the user directory
#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_user, update_user, delete_user),
    components(
        schemas(User, UserInput, CreatedUser, Updated, Deleted, Partition),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestIdResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Users across both partitions")
    )
)]
pub struct ApiDoc;

/// Create the user router, to be nested under `/users`
pub fn router<S: PartitionStore + 'static>(coordinator: DirectoryCoordinator<S>) -> Router {
    router_with_shared(Arc::new(coordinator))
}

/// Same as [`router`] for a coordinator the caller also needs (e.g. readiness)
pub fn router_with_shared<S: PartitionStore + 'static>(
    coordinator: Arc<DirectoryCoordinator<S>>,
) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", put(update_user).delete(delete_user))
        .with_state(coordinator)
}

/// List every user, partition A first
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    responses(
        (status = 200, description = "Users from both partitions", body = Vec<User>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<S: PartitionStore>(
    State(coordinator): State<Arc<DirectoryCoordinator<S>>>,
) -> DirectoryResult<Json<Vec<User>>> {
    let users = coordinator.list().await?;
    Ok(Json(users))
}

/// Create a user in the partition chosen by the placement policy
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = UserInput,
    responses(
        (status = 201, description = "User created", body = CreatedUser),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<S: PartitionStore>(
    State(coordinator): State<Arc<DirectoryCoordinator<S>>>,
    ValidatedJson(input): ValidatedJson<UserInput>,
) -> DirectoryResult<impl IntoResponse> {
    let created = coordinator.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a user in whichever partition owns the id
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Partition-local user id")
    ),
    request_body = UserInput,
    responses(
        (status = 200, description = "User updated", body = Updated),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<S: PartitionStore>(
    State(coordinator): State<Arc<DirectoryCoordinator<S>>>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UserInput>,
) -> DirectoryResult<Json<Updated>> {
    let updated = coordinator.update(id, input).await?;
    Ok(Json(updated))
}

/// Delete a user from whichever partition owns the id
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = i32, Path, description = "Partition-local user id")
    ),
    responses(
        (status = 200, description = "User deleted", body = Deleted),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<S: PartitionStore>(
    State(coordinator): State<Arc<DirectoryCoordinator<S>>>,
    IdPath(id): IdPath,
) -> DirectoryResult<Json<Deleted>> {
    let deleted = coordinator.delete(id).await?;
    Ok(Json(deleted))
}
