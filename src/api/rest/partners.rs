use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::directory::NewPartner;
use crate::engine::assignment::list_eligible_partners;
use crate::error::AppError;
use crate::models::partner::{ApprovalStatus, Partner};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/partners", post(create_partner).get(list_partners))
        .route("/partners/eligible", get(list_eligible))
        .route("/partners/:id/approval", patch(update_approval))
        .route("/partners/:id/active", patch(update_active))
}

#[derive(Deserialize)]
pub struct EligibleQuery {
    pub village: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateApprovalRequest {
    pub status: ApprovalStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActiveRequest {
    pub is_active: bool,
}

async fn create_partner(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewPartner>,
) -> Result<Json<Partner>, AppError> {
    Ok(Json(state.partners.register(payload)?))
}

async fn list_partners(State(state): State<Arc<AppState>>) -> Json<Vec<Partner>> {
    Json(state.partners.list())
}

async fn list_eligible(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EligibleQuery>,
) -> Json<Vec<Partner>> {
    Json(list_eligible_partners(
        &state.partners,
        query.village.as_deref(),
    ))
}

async fn update_approval(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApprovalRequest>,
) -> Result<Json<Partner>, AppError> {
    Ok(Json(state.partners.set_approval(id, payload.status)?))
}

async fn update_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateActiveRequest>,
) -> Result<Json<Partner>, AppError> {
    Ok(Json(state.partners.set_active(id, payload.is_active)?))
}
