use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::invoice::{Invoice, InvoiceRenderer, TextInvoiceRenderer};
use crate::engine::assignment::{self, AssignRequest, UnassignRequest};
use crate::engine::flow;
use crate::engine::lifecycle::{self, AdvanceRequest, CancelRequest};
use crate::engine::placement::{self, PlaceOrderRequest};
use crate::engine::reconciliation::{self, FinalizeRequest};
use crate::engine::timeline::{render_progress, ProgressStep};
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus, OrderType};
use crate::state::AppState;
use crate::store::OrderFilter;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/next", get(next_status))
        .route("/orders/:id/progress", get(progress))
        .route("/orders/:id/invoice", get(invoice))
        .route("/orders/:id/receipt", get(receipt))
        .route("/orders/:id/advance", post(advance_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/finalize", post(finalize_order))
        .route("/orders/:id/assign", post(assign_partner))
        .route("/orders/:id/unassign", post(unassign_partner))
        .route("/orders/:id/notes", patch(update_notes))
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub status: Option<OrderStatus>,
}

#[derive(Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: Option<String>,
}

#[derive(Serialize)]
struct NextStatusResponse {
    current: OrderStatus,
    next: Option<OrderStatus>,
    cancellable: bool,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = placement::place_order(&state, payload)?;
    Ok(Json(order))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Json<Vec<Order>> {
    Json(state.orders.list(OrderFilter {
        order_type: query.order_type,
        status: query.status,
    }))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.orders.get(id)?))
}

async fn next_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<NextStatusResponse>, AppError> {
    let order = state.orders.get(id)?;

    Ok(Json(NextStatusResponse {
        current: order.status,
        next: flow::next_status(order.order_type, order.status),
        cancellable: flow::can_cancel(order.status),
    }))
}

async fn progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProgressStep>>, AppError> {
    let order = state.orders.get(id)?;
    Ok(Json(render_progress(&order)))
}

async fn invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    let order = state.orders.get(id)?;
    Ok(Json(Invoice::from_order(&order)))
}

async fn receipt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.get(id)?;
    Ok((
        [("content-type", "text/plain; charset=utf-8")],
        TextInvoiceRenderer.render(&order),
    ))
}

async fn advance_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(lifecycle::advance(&state, id, payload).await?))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(lifecycle::cancel(&state, id, payload).await?))
}

async fn finalize_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FinalizeRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(reconciliation::finalize(&state, id, payload).await?))
}

async fn assign_partner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(assignment::assign(&state, id, payload).await?))
}

async fn unassign_partner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UnassignRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(assignment::unassign(&state, id, payload).await?))
}

async fn update_notes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNotesRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(lifecycle::update_notes(&state, id, payload.notes).await?))
}
