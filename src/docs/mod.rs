use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Current positioned users
#[utoipa::path(
    get,
    path = "/api/v1/presence",
    responses(
        (status = 200, description = "Snapshot of positioned users", body = PresenceResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_presence_doc() {}

/// Report the caller's position, identified by the session cookie
#[utoipa::path(
    post,
    path = "/api/v1/presence/position",
    request_body = PositionReport,
    responses(
        (status = 204, description = "Report accepted (ignored when the session is unknown)")
    )
)]
#[allow(dead_code)]
pub async fn post_position_doc() {}

/// Connection and host statistics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Diagnostics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// List the catalog
#[utoipa::path(
    get,
    path = "/api/v1/items",
    responses(
        (status = 200, description = "Installable items", body = CatalogResponse)
    )
)]
#[allow(dead_code)]
pub async fn list_items_doc() {}

/// Get a catalog item
#[utoipa::path(
    get,
    path = "/api/v1/items/{code}",
    params(
        ("code" = String, Path, description = "Item code")
    ),
    responses(
        (status = 200, description = "The item", body = CatalogItem),
        (status = 404, description = "Unknown item", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_item_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        get_presence_doc,
        post_position_doc,
        diagnostics_doc,
        list_items_doc,
        get_item_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            UserPosition,
            PositionReport,
            PresenceResponse,
            DiagnosticsResponse,
            CatalogItem,
            CatalogResponse,
        )
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
