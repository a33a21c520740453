pub mod catalog;
pub mod orders;
pub mod partners;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::billing::report::{summarize, Summary};
use crate::store::OrderFilter;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(orders::router())
        .merge(partners::router())
        .merge(catalog::router())
        .route("/reports/summary", get(summary))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::events_handler))
        .route("/orders/:id/watch", get(ws::order_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    orders: usize,
    partners: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        orders: state.orders.len(),
        partners: state.partners.len(),
    })
}

async fn summary(State(state): State<Arc<AppState>>) -> Json<Summary> {
    let orders = state.orders.list(OrderFilter::default());
    Json(summarize(&orders))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
