use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::flow;
use crate::models::order::{Actor, Order, OrderStatus, TimelineEntry};

/// Appends one audit entry. Entries are never edited or removed afterwards.
pub fn record(
    order: &mut Order,
    status: OrderStatus,
    actor: &Actor,
    note: Option<String>,
    at: DateTime<Utc>,
) {
    order.timeline.push(TimelineEntry {
        status,
        time: at,
        actor: actor.clone(),
        note,
    });
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Current,
    Pending,
    NotApplicable,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProgressStep {
    pub status: OrderStatus,
    pub state: StepState,
}

/// Display-only view of where an order sits in its flow.
///
/// A cancelled order marks every step it reached as completed, every later step as not
/// applicable, and ends with a `cancelled` step marked current.
pub fn render_progress(order: &Order) -> Vec<ProgressStep> {
    let steps = flow::flow(order.order_type);

    if order.status == OrderStatus::Cancelled {
        let reached = cancellation_point(order)
            .and_then(|status| flow::position(order.order_type, status))
            .unwrap_or(0);

        let mut progress: Vec<ProgressStep> = steps
            .iter()
            .enumerate()
            .map(|(index, status)| ProgressStep {
                status: *status,
                state: if index <= reached {
                    StepState::Completed
                } else {
                    StepState::NotApplicable
                },
            })
            .collect();
        progress.push(ProgressStep {
            status: OrderStatus::Cancelled,
            state: StepState::Current,
        });
        return progress;
    }

    let current = flow::position(order.order_type, order.status).unwrap_or(0);
    let finished = flow::is_absorbing(order.order_type, order.status);

    steps
        .iter()
        .enumerate()
        .map(|(index, status)| {
            let state = if index < current || (index == current && finished) {
                StepState::Completed
            } else if index == current {
                StepState::Current
            } else {
                StepState::Pending
            };
            ProgressStep {
                status: *status,
                state,
            }
        })
        .collect()
}

/// Last status the order held before it was cancelled.
fn cancellation_point(order: &Order) -> Option<OrderStatus> {
    order
        .timeline
        .iter()
        .rev()
        .map(|entry| entry.status)
        .find(|status| *status != OrderStatus::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{admin, order_at};
    use crate::models::order::OrderType;

    fn states(progress: &[ProgressStep]) -> Vec<StepState> {
        progress.iter().map(|step| step.state).collect()
    }

    #[test]
    fn record_appends_in_order() {
        let mut order = order_at(OrderType::Shopping, OrderStatus::Pending);
        let before = order.timeline.len();

        record(
            &mut order,
            OrderStatus::Confirmed,
            &admin(),
            Some("called customer".to_string()),
            Utc::now(),
        );

        assert_eq!(order.timeline.len(), before + 1);
        let last = order.timeline.last().unwrap();
        assert_eq!(last.status, OrderStatus::Confirmed);
        assert_eq!(last.note.as_deref(), Some("called customer"));
    }

    #[test]
    fn in_flight_order_has_current_step() {
        let order = order_at(OrderType::Shopping, OrderStatus::Preparing);

        assert_eq!(
            states(&render_progress(&order)),
            vec![
                StepState::Completed,
                StepState::Completed,
                StepState::Current,
                StepState::Pending,
                StepState::Pending,
            ]
        );
    }

    #[test]
    fn terminal_success_is_fully_completed() {
        let order = order_at(OrderType::Service, OrderStatus::Completed);

        assert!(
            render_progress(&order)
                .iter()
                .all(|step| step.state == StepState::Completed)
        );
    }

    #[test]
    fn cancelled_order_marks_later_steps_not_applicable() {
        let mut order = order_at(OrderType::Ride, OrderStatus::Confirmed);
        record(&mut order, OrderStatus::Cancelled, &admin(), None, Utc::now());
        order.status = OrderStatus::Cancelled;

        let progress = render_progress(&order);

        assert_eq!(
            states(&progress),
            vec![
                StepState::Completed,
                StepState::Completed,
                StepState::NotApplicable,
                StepState::NotApplicable,
                StepState::NotApplicable,
                StepState::NotApplicable,
                StepState::Current,
            ]
        );
        assert_eq!(progress.last().unwrap().status, OrderStatus::Cancelled);
        assert!(!progress.iter().any(|step| step.state == StepState::Pending));
    }
}
