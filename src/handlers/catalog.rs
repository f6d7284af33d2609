use std::sync::Arc;
use axum::{extract::{Path, State}, http::StatusCode, response::Redirect, Json};
use tracing::{error, info};

use crate::AppState;
use crate::models::{CatalogItem, CatalogResponse, ErrorResponse};
use crate::services::catalog_service;

fn item_not_found(code: &str) -> (StatusCode, Json<ErrorResponse>) {
    error!("Catalog item '{}' not found", code);
    let status = StatusCode::NOT_FOUND;
    (status, Json(ErrorResponse {
        code: status.as_u16(),
        status: status.to_string(),
        error: format!("Catalog item '{}' not found", code),
    }))
}

/// List the catalog
pub async fn list_items() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        items: catalog_service::catalog(),
    })
}

/// Get one catalog item
pub async fn get_item(
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<CatalogItem>), (StatusCode, Json<ErrorResponse>)> {
    match catalog_service::find_item(&code) {
        Some(item) => Ok((StatusCode::OK, Json(item))),
        None => Err(item_not_found(&code)),
    }
}

/// Redirect to the item's release download
pub async fn install(
    State(app_state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Redirect, (StatusCode, Json<ErrorResponse>)> {
    let item = catalog_service::find_item(&code).ok_or_else(|| item_not_found(&code))?;
    let url = catalog_service::download_url(&app_state.config.download_base_url, &item);
    info!("Redirecting install of '{}' to {}", item.title, url);
    Ok(Redirect::to(&url))
}
