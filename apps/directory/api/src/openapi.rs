use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Directory API",
        version = "0.1.0",
        description = "User directory spread across two independently-owned partitions"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/users", api = domain_directory::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
