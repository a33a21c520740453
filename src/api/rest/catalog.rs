use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;

use crate::catalog::{CatalogItem, ServiceOption};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/catalog/items", post(upsert_item).get(list_items))
        .route("/catalog/services", post(upsert_service))
}

async fn upsert_item(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CatalogItem>,
) -> Result<Json<CatalogItem>, AppError> {
    Ok(Json(state.catalog.upsert_item(payload)?))
}

async fn list_items(State(state): State<Arc<AppState>>) -> Json<Vec<CatalogItem>> {
    Json(state.catalog.items())
}

async fn upsert_service(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ServiceOption>,
) -> Result<Json<ServiceOption>, AppError> {
    Ok(Json(state.catalog.upsert_service(payload)?))
}
