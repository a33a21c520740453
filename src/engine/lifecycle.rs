use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::flow::{self, Transition};
use crate::engine::timeline;
use crate::error::AppError;
use crate::models::order::{Actor, Order, OrderStatus};
use crate::notify::OrderEventKind;
use crate::state::AppState;
use crate::store::Change;

#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceRequest {
    pub status: OrderStatus,
    pub actor: Actor,
    #[serde(default)]
    pub note: Option<String>,
    /// Status the caller last observed; guards against acting on a stale snapshot.
    #[serde(default)]
    pub expected: Option<OrderStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelRequest {
    pub actor: Actor,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub expected: Option<OrderStatus>,
}

/// Rejects a request built against a snapshot that has since moved on.
/// A retry whose target already holds passes through to the no-op path.
pub(crate) fn check_expected(
    order: &Order,
    expected: Option<OrderStatus>,
    target: OrderStatus,
) -> Result<(), AppError> {
    match expected {
        Some(seen) if seen != order.status && order.status != target => {
            if flow::is_absorbing(order.order_type, order.status) {
                Err(AppError::OrderTerminal(order.status))
            } else {
                Err(AppError::InvalidTransition {
                    from: order.status,
                    to: target,
                })
            }
        }
        _ => Ok(()),
    }
}

pub fn apply_advance(
    order: &mut Order,
    request: &AdvanceRequest,
    now: DateTime<Utc>,
) -> Result<Change, AppError> {
    check_expected(order, request.expected, request.status)?;

    match flow::check_transition(order.order_type, order.status, request.status)? {
        Transition::Noop => Ok(Change::Unchanged),
        Transition::Apply => {
            order.status = request.status;
            if request.status == flow::terminal_success(order.order_type) {
                order.completed_at = Some(now);
            }
            timeline::record(
                order,
                request.status,
                &request.actor,
                request.note.clone(),
                now,
            );
            Ok(Change::Applied)
        }
    }
}

pub fn apply_cancel(
    order: &mut Order,
    request: &CancelRequest,
    now: DateTime<Utc>,
) -> Result<Change, AppError> {
    if flow::is_absorbing(order.order_type, order.status) {
        return Err(AppError::OrderTerminal(order.status));
    }
    check_expected(order, request.expected, OrderStatus::Cancelled)?;

    if !flow::can_cancel(order.status) {
        return Err(AppError::TooLateToCancel(order.status));
    }

    // The assignment, if any, stays on the record for audit.
    order.status = OrderStatus::Cancelled;
    timeline::record(
        order,
        OrderStatus::Cancelled,
        &request.actor,
        request.reason.clone(),
        now,
    );
    Ok(Change::Applied)
}

pub fn apply_notes(order: &mut Order, notes: Option<String>) -> Result<Change, AppError> {
    let notes = notes.filter(|text| !text.trim().is_empty());
    if order.notes == notes {
        return Ok(Change::Unchanged);
    }
    order.notes = notes;
    Ok(Change::Applied)
}

pub async fn advance(
    state: &AppState,
    order_id: Uuid,
    mut request: AdvanceRequest,
) -> Result<Order, AppError> {
    request.expected = pin_expected(state, order_id, request.expected, "advance")?;

    let result = state
        .orders
        .update(order_id, OrderEventKind::StatusChanged, |order| {
            apply_advance(order, &request, Utc::now())
        })
        .await;

    match result {
        Ok(committed) if committed.changed => {
            state
                .metrics
                .transitions_total
                .with_label_values(&[request.status.as_str()])
                .inc();
            info!(
                order_id = %order_id,
                to = %request.status,
                actor = %request.actor,
                version = committed.order.version,
                "order advanced"
            );
            Ok(committed.order)
        }
        Ok(committed) => {
            debug!(order_id = %order_id, status = %request.status, "advance already applied");
            Ok(committed.order)
        }
        Err(err) => Err(reject(state, order_id, "advance", err)),
    }
}

pub async fn cancel(
    state: &AppState,
    order_id: Uuid,
    mut request: CancelRequest,
) -> Result<Order, AppError> {
    request.expected = pin_expected(state, order_id, request.expected, "cancel")?;

    let result = state
        .orders
        .update(order_id, OrderEventKind::Cancelled, |order| {
            apply_cancel(order, &request, Utc::now())
        })
        .await;

    match result {
        Ok(committed) => {
            state
                .metrics
                .transitions_total
                .with_label_values(&[OrderStatus::Cancelled.as_str()])
                .inc();
            info!(
                order_id = %order_id,
                actor = %request.actor,
                assigned = committed.order.assignment.is_some(),
                "order cancelled"
            );
            Ok(committed.order)
        }
        Err(err) => Err(reject(state, order_id, "cancel", err)),
    }
}

pub async fn update_notes(
    state: &AppState,
    order_id: Uuid,
    notes: Option<String>,
) -> Result<Order, AppError> {
    let committed = state
        .orders
        .update(order_id, OrderEventKind::NotesUpdated, |order| {
            apply_notes(order, notes.clone())
        })
        .await?;

    Ok(committed.order)
}

/// Without an explicit precondition a request targets the status its caller last saw, so a
/// write that loses a compare-and-set race is re-checked against that status instead of being
/// stacked on top of the winner.
fn pin_expected(
    state: &AppState,
    order_id: Uuid,
    expected: Option<OrderStatus>,
    action: &str,
) -> Result<Option<OrderStatus>, AppError> {
    match expected {
        Some(status) => Ok(Some(status)),
        None => state
            .orders
            .get(order_id)
            .map(|order| Some(order.status))
            .map_err(|err| reject(state, order_id, action, err)),
    }
}

/// Counts and logs a refused mutation, handing the error back to the caller.
pub(crate) fn reject(state: &AppState, order_id: Uuid, action: &str, err: AppError) -> AppError {
    state
        .metrics
        .mutations_rejected_total
        .with_label_values(&[err.code()])
        .inc();
    warn!(order_id = %order_id, action, error = %err, "order mutation rejected");
    err
}
