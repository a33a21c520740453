//! Order change fan-out.
//!
//! Every order owns a `watch` channel holding its latest committed snapshot, so each listener
//! sees snapshots in commit order and rapid successive commits may collapse into one delivery.
//! A crate-wide broadcast firehose carries every commit for dashboards.

use serde::Serialize;
use tokio::sync::watch;

use crate::models::order::Order;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    Placed,
    StatusChanged,
    Cancelled,
    Finalized,
    Assigned,
    Unassigned,
    NotesUpdated,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order: Order,
}

/// One listener's cursor on a single order.
pub struct OrderSubscription {
    rx: watch::Receiver<Order>,
}

impl OrderSubscription {
    pub(crate) fn new(rx: watch::Receiver<Order>) -> Self {
        Self { rx }
    }

    /// Latest snapshot, marking it as seen.
    pub fn current(&mut self) -> Order {
        self.rx.borrow_and_update().clone()
    }

    /// Waits for a snapshot newer than the last one seen. `None` once the order's channel closes.
    pub async fn changed(&mut self) -> Option<Order> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
