//! Versioned in-memory order repository.
//!
//! Mutations are optimistic: the closure runs against a private copy of the latest snapshot and
//! the result is committed only if nobody else committed in between. Losers re-read and re-run
//! their closure after a backoff, so concurrent writers never overwrite each other's timeline.

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{broadcast, watch};
use tokio::time::sleep;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::RetryPolicy;
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus, OrderType};
use crate::notify::{OrderEvent, OrderEventKind, OrderSubscription};
use crate::observability::metrics::Metrics;

/// What a mutation closure did to its draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    /// Nothing to commit; the stored record is returned as-is.
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct Committed {
    pub order: Order,
    pub changed: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub order_type: Option<OrderType>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    fn matches(&self, order: &Order) -> bool {
        self.order_type.is_none_or(|t| order.order_type == t)
            && self.status.is_none_or(|s| order.status == s)
    }
}

struct Record {
    order: Order,
    tx: watch::Sender<Order>,
}

pub struct OrderRepository {
    records: DashMap<Uuid, Record>,
    events_tx: broadcast::Sender<OrderEvent>,
    retry: RetryPolicy,
    metrics: Metrics,
}

impl OrderRepository {
    pub fn new(retry: RetryPolicy, event_buffer_size: usize, metrics: Metrics) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            records: DashMap::new(),
            events_tx,
            retry,
            metrics,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Result<Order, AppError> {
        self.records
            .get(&id)
            .map(|record| record.order.clone())
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
    }

    pub fn list(&self, filter: OrderFilter) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .records
            .iter()
            .filter(|entry| filter.matches(&entry.value().order))
            .map(|entry| entry.value().order.clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    pub fn insert(&self, order: Order) -> Result<Order, AppError> {
        match self.records.entry(order.id) {
            Entry::Occupied(_) => Err(AppError::Internal(format!(
                "order {} already exists",
                order.id
            ))),
            Entry::Vacant(slot) => {
                let (tx, _unused_rx) = watch::channel(order.clone());
                slot.insert(Record {
                    order: order.clone(),
                    tx,
                });
                let _ = self.events_tx.send(OrderEvent {
                    kind: OrderEventKind::Placed,
                    order: order.clone(),
                });
                Ok(order)
            }
        }
    }

    pub fn subscribe(&self, id: Uuid) -> Result<OrderSubscription, AppError> {
        self.records
            .get(&id)
            .map(|record| OrderSubscription::new(record.tx.subscribe()))
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
    }

    pub fn events(&self) -> broadcast::Receiver<OrderEvent> {
        self.events_tx.subscribe()
    }

    /// Applies `mutate` atomically to order `id`.
    ///
    /// `mutate` may run several times if other writers commit first; it must derive everything
    /// from the draft it is given. Domain errors from `mutate` are returned without retrying.
    /// Whatever `mutate` records about the draft on its last run describes the committed change.
    pub async fn update<F>(
        &self,
        id: Uuid,
        kind: OrderEventKind,
        mut mutate: F,
    ) -> Result<Committed, AppError>
    where
        F: FnMut(&mut Order) -> Result<Change, AppError>,
    {
        let mut attempt: u32 = 0;

        loop {
            let snapshot = self.get(id)?;
            let mut draft = snapshot.clone();

            if mutate(&mut draft)? == Change::Unchanged {
                return Ok(Committed {
                    order: snapshot,
                    changed: false,
                });
            }
            draft.touch(Utc::now());

            if let Some(committed) = self.compare_and_swap(id, snapshot.version, draft, kind)? {
                return Ok(Committed {
                    order: committed,
                    changed: true,
                });
            }

            self.metrics.store_conflicts_total.inc();
            if attempt >= self.retry.max_retries {
                error!(order_id = %id, attempts = attempt + 1, "order update kept conflicting");
                return Err(AppError::StorageUnavailable(format!(
                    "order {id} is being modified concurrently; retry later"
                )));
            }

            let backoff = self.retry.backoff(attempt);
            warn!(
                order_id = %id,
                attempt = attempt + 1,
                backoff_ms = backoff.as_millis() as u64,
                "write conflict on order; retrying"
            );
            attempt += 1;
            sleep(backoff).await;
        }
    }

    /// Commits `draft` only if the stored version is still `expected_version`.
    /// Publishing happens while the entry is held so listeners observe commit order.
    fn compare_and_swap(
        &self,
        id: Uuid,
        expected_version: u64,
        draft: Order,
        kind: OrderEventKind,
    ) -> Result<Option<Order>, AppError> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

        if record.order.version != expected_version {
            debug!(
                order_id = %id,
                expected = expected_version,
                actual = record.order.version,
                "stale order snapshot"
            );
            return Ok(None);
        }

        record.order = draft.clone();
        record.tx.send_replace(draft.clone());
        let _ = self.events_tx.send(OrderEvent {
            kind,
            order: draft.clone(),
        });

        Ok(Some(draft))
    }
}
