//! Per-type status flows and the legal-transition check.
//!
//! Each order type owns a fixed, ordered list of statuses. Orders only move one step forward
//! along their flow, or sideways into `cancelled` while still in the pre-dispatch window.

use crate::error::AppError;
use crate::models::order::{OrderStatus, OrderType};

const SHOPPING_FLOW: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::OutForDelivery,
    OrderStatus::Delivered,
];

const RIDE_FLOW: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::DriverOnWay,
    OrderStatus::Arrived,
    OrderStatus::InProgress,
    OrderStatus::Completed,
];

const SERVICE_FLOW: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::TechnicianAssigned,
    OrderStatus::InProgress,
    OrderStatus::Completed,
];

/// Statuses from which `cancelled` is reachable, for every type.
const CANCELLABLE: &[OrderStatus] = &[OrderStatus::Pending, OrderStatus::Confirmed];

pub fn flow(order_type: OrderType) -> &'static [OrderStatus] {
    match order_type {
        OrderType::Shopping => SHOPPING_FLOW,
        OrderType::Ride => RIDE_FLOW,
        OrderType::Service => SERVICE_FLOW,
    }
}

pub fn position(order_type: OrderType, status: OrderStatus) -> Option<usize> {
    flow(order_type).iter().position(|step| *step == status)
}

pub fn next_status(order_type: OrderType, status: OrderStatus) -> Option<OrderStatus> {
    let index = position(order_type, status)?;
    flow(order_type).get(index + 1).copied()
}

pub fn terminal_success(order_type: OrderType) -> OrderStatus {
    match order_type {
        OrderType::Shopping => OrderStatus::Delivered,
        OrderType::Ride | OrderType::Service => OrderStatus::Completed,
    }
}

/// `cancelled` or the type's terminal success status.
pub fn is_absorbing(order_type: OrderType, status: OrderStatus) -> bool {
    status == OrderStatus::Cancelled || status == terminal_success(order_type)
}

pub fn can_cancel(status: OrderStatus) -> bool {
    CANCELLABLE.contains(&status)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current status; a retried request.
    Noop,
    Apply,
}

/// Decides whether `current -> target` is legal for `order_type`.
///
/// Absorbing states reject everything with `OrderTerminal`, including a repeat of the same
/// status, so a late request can never revive or re-stamp a closed order.
pub fn check_transition(
    order_type: OrderType,
    current: OrderStatus,
    target: OrderStatus,
) -> Result<Transition, AppError> {
    if is_absorbing(order_type, current) {
        return Err(AppError::OrderTerminal(current));
    }

    if target == current {
        return Ok(Transition::Noop);
    }

    let legal = if target == OrderStatus::Cancelled {
        can_cancel(current)
    } else {
        next_status(order_type, current) == Some(target)
    };

    if legal {
        Ok(Transition::Apply)
    } else {
        Err(AppError::InvalidTransition {
            from: current,
            to: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_flow_starts_pending_and_ends_in_terminal_success() {
        for order_type in [OrderType::Shopping, OrderType::Ride, OrderType::Service] {
            let steps = flow(order_type);
            assert_eq!(steps[0], OrderStatus::Pending);
            assert_eq!(steps[steps.len() - 1], terminal_success(order_type));
            assert!(!steps.contains(&OrderStatus::Cancelled));
        }
    }

    #[test]
    fn next_status_walks_the_ride_flow() {
        assert_eq!(
            next_status(OrderType::Ride, OrderStatus::Confirmed),
            Some(OrderStatus::DriverOnWay)
        );
        assert_eq!(
            next_status(OrderType::Ride, OrderStatus::InProgress),
            Some(OrderStatus::Completed)
        );
        assert_eq!(next_status(OrderType::Ride, OrderStatus::Completed), None);
        assert_eq!(next_status(OrderType::Ride, OrderStatus::Preparing), None);
        assert_eq!(next_status(OrderType::Ride, OrderStatus::Cancelled), None);
    }

    #[test]
    fn skipping_a_step_is_invalid() {
        let err = check_transition(
            OrderType::Shopping,
            OrderStatus::Confirmed,
            OrderStatus::Delivered,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: OrderStatus::Confirmed,
                to: OrderStatus::Delivered
            }
        ));
    }

    #[test]
    fn status_from_another_flow_is_invalid() {
        let err = check_transition(
            OrderType::Service,
            OrderStatus::Confirmed,
            OrderStatus::DriverOnWay,
        )
        .unwrap_err();

        assert_eq!(err.code(), "invalid_transition");
    }

    #[test]
    fn moving_backwards_is_invalid() {
        let err = check_transition(
            OrderType::Shopping,
            OrderStatus::Preparing,
            OrderStatus::Confirmed,
        )
        .unwrap_err();

        assert_eq!(err.code(), "invalid_transition");
    }

    #[test]
    fn same_status_is_a_noop() {
        assert_eq!(
            check_transition(OrderType::Ride, OrderStatus::Arrived, OrderStatus::Arrived).unwrap(),
            Transition::Noop
        );
    }

    #[test]
    fn cancellation_only_from_pending_or_confirmed() {
        for order_type in [OrderType::Shopping, OrderType::Ride, OrderType::Service] {
            for status in flow(order_type) {
                let result = check_transition(order_type, *status, OrderStatus::Cancelled);
                if is_absorbing(order_type, *status) {
                    assert_eq!(result.unwrap_err().code(), "order_terminal");
                } else if can_cancel(*status) {
                    assert_eq!(result.unwrap(), Transition::Apply);
                } else {
                    assert_eq!(result.unwrap_err().code(), "invalid_transition");
                }
            }
        }
    }

    #[test]
    fn absorbing_states_reject_everything() {
        for target in [OrderStatus::Cancelled, OrderStatus::Delivered, OrderStatus::Pending] {
            let err =
                check_transition(OrderType::Shopping, OrderStatus::Delivered, target).unwrap_err();
            assert!(matches!(err, AppError::OrderTerminal(OrderStatus::Delivered)));
        }

        let err = check_transition(
            OrderType::Service,
            OrderStatus::Cancelled,
            OrderStatus::Confirmed,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::OrderTerminal(OrderStatus::Cancelled)));
    }
}
