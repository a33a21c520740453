use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::order::OrderStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order is already {0}; it can no longer be cancelled")]
    TooLateToCancel(OrderStatus),

    #[error("order is {0} and can no longer be changed")]
    OrderTerminal(OrderStatus),

    #[error("collected amount must be positive, got {0}")]
    InvalidAmount(f64),

    #[error("partner {0} is not approved or not active")]
    PartnerIneligible(Uuid),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::TooLateToCancel(_) => "too_late_to_cancel",
            AppError::OrderTerminal(_) => "order_terminal",
            AppError::InvalidAmount(_) => "invalid_amount",
            AppError::PartnerIneligible(_) => "partner_ineligible",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. }
            | AppError::TooLateToCancel(_)
            | AppError::OrderTerminal(_) => StatusCode::CONFLICT,
            AppError::InvalidAmount(_) | AppError::PartnerIneligible(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
