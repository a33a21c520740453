use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::flow;
use crate::engine::lifecycle::reject;
use crate::engine::timeline;
use crate::error::AppError;
use crate::models::order::{Actor, Order, PaymentStatus};
use crate::notify::OrderEventKind;
use crate::state::AppState;
use crate::store::Change;

#[derive(Debug, Clone, Deserialize)]
pub struct FinalizeRequest {
    pub amount: f64,
    pub actor: Actor,
    #[serde(default)]
    pub note: Option<String>,
}

/// Records the collected amount and moves the order into its terminal success status in one step.
pub fn apply_finalize(
    order: &mut Order,
    request: &FinalizeRequest,
    now: DateTime<Utc>,
) -> Result<Change, AppError> {
    if flow::is_absorbing(order.order_type, order.status) {
        return Err(AppError::OrderTerminal(order.status));
    }
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(AppError::InvalidAmount(request.amount));
    }

    let terminal = flow::terminal_success(order.order_type);
    if flow::next_status(order.order_type, order.status) != Some(terminal) {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: terminal,
        });
    }

    order.financials.final_amount = Some(request.amount);
    order.financials.payment_status = PaymentStatus::Paid;
    order.status = terminal;
    order.completed_at = Some(now);
    timeline::record(order, terminal, &request.actor, request.note.clone(), now);

    Ok(Change::Applied)
}

pub async fn finalize(
    state: &AppState,
    order_id: Uuid,
    request: FinalizeRequest,
) -> Result<Order, AppError> {
    let committed = state
        .orders
        .update(order_id, OrderEventKind::Finalized, |order| {
            apply_finalize(order, &request, Utc::now())
        })
        .await
        .map_err(|err| reject(state, order_id, "finalize", err))?;

    let order = committed.order;
    state
        .metrics
        .transitions_total
        .with_label_values(&[order.status.as_str()])
        .inc();
    info!(
        order_id = %order_id,
        actor = %request.actor,
        quoted = order.financials.total_amount,
        collected = request.amount,
        "order finalized"
    );

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{order_at, rider};
    use crate::models::order::{OrderStatus, OrderType};

    fn finalize_with(amount: f64) -> FinalizeRequest {
        FinalizeRequest {
            amount,
            actor: rider(),
            note: None,
        }
    }

    #[test]
    fn service_in_progress_finalizes_to_completed() {
        let mut order = order_at(OrderType::Service, OrderStatus::InProgress);
        let before = order.timeline.len();

        apply_finalize(&mut order, &finalize_with(450.0), Utc::now()).unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.financials.final_amount, Some(450.0));
        assert_eq!(order.financials.total_amount, 530.0);
        assert_eq!(order.financials.payment_status, PaymentStatus::Paid);
        assert!(order.completed_at.is_some());
        assert_eq!(order.timeline.len(), before + 1);
        assert_eq!(order.timeline.last().unwrap().status, OrderStatus::Completed);
    }

    #[test]
    fn non_positive_amount_is_rejected_without_change() {
        for amount in [0.0, -10.0, f64::NAN] {
            let mut order = order_at(OrderType::Shopping, OrderStatus::OutForDelivery);
            let snapshot = order.clone();

            let err = apply_finalize(&mut order, &finalize_with(amount), Utc::now()).unwrap_err();

            assert_eq!(err.code(), "invalid_amount");
            assert_eq!(order, snapshot);
        }
    }

    #[test]
    fn finalize_requires_step_before_terminal() {
        let mut order = order_at(OrderType::Ride, OrderStatus::Arrived);

        let err = apply_finalize(&mut order, &finalize_with(120.0), Utc::now()).unwrap_err();

        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: OrderStatus::Arrived,
                to: OrderStatus::Completed
            }
        ));
        assert!(order.financials.final_amount.is_none());
    }

    #[test]
    fn second_finalize_fails_and_keeps_first_amount() {
        let mut order = order_at(OrderType::Shopping, OrderStatus::OutForDelivery);
        apply_finalize(&mut order, &finalize_with(510.0), Utc::now()).unwrap();
        let timeline_len = order.timeline.len();

        let err = apply_finalize(&mut order, &finalize_with(510.0), Utc::now()).unwrap_err();

        assert!(matches!(err, AppError::OrderTerminal(OrderStatus::Delivered)));
        assert_eq!(order.financials.final_amount, Some(510.0));
        assert_eq!(order.timeline.len(), timeline_len);
    }

    #[test]
    fn cancelled_order_cannot_be_finalized() {
        let mut order = order_at(OrderType::Ride, OrderStatus::Cancelled);

        let err = apply_finalize(&mut order, &finalize_with(90.0), Utc::now()).unwrap_err();

        assert_eq!(err.code(), "order_terminal");
        assert!(order.financials.final_amount.is_none());
    }
}
