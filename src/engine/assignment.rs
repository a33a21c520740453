use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::directory::PartnerDirectory;
use crate::engine::flow;
use crate::engine::lifecycle::reject;
use crate::error::AppError;
use crate::models::assignment::Assignment;
use crate::models::order::{Actor, Order};
use crate::models::partner::Partner;
use crate::notify::OrderEventKind;
use crate::state::AppState;
use crate::store::Change;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub partner_id: Uuid,
    pub actor: Actor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnassignRequest {
    pub actor: Actor,
}

pub fn list_eligible_partners(
    directory: &dyn PartnerDirectory,
    village: Option<&str>,
) -> Vec<Partner> {
    directory.list_eligible(village)
}

/// Binds `partner` to the order, replacing any previous assignment. Status is left alone.
pub fn apply_assign(
    order: &mut Order,
    partner: &Partner,
    now: DateTime<Utc>,
) -> Result<Change, AppError> {
    if flow::is_absorbing(order.order_type, order.status) {
        return Err(AppError::OrderTerminal(order.status));
    }

    order.assignment = Some(Assignment::from_partner(partner, now));
    Ok(Change::Applied)
}

pub fn apply_unassign(order: &mut Order) -> Result<Change, AppError> {
    if flow::is_absorbing(order.order_type, order.status) {
        return Err(AppError::OrderTerminal(order.status));
    }

    match order.assignment.take() {
        Some(_) => Ok(Change::Applied),
        None => Ok(Change::Unchanged),
    }
}

pub async fn assign(
    state: &AppState,
    order_id: Uuid,
    request: AssignRequest,
) -> Result<Order, AppError> {
    // Eligibility is a point-in-time read, not a reservation.
    let partner = state
        .partners
        .get(request.partner_id)
        .ok_or_else(|| AppError::NotFound(format!("partner {} not found", request.partner_id)))
        .and_then(|partner| {
            if partner.is_eligible() {
                Ok(partner)
            } else {
                Err(AppError::PartnerIneligible(partner.id))
            }
        })
        .map_err(|err| reject(state, order_id, "assign", err))?;

    let mut previous = None;
    let committed = state
        .orders
        .update(order_id, OrderEventKind::Assigned, |order| {
            previous = order.assignment.as_ref().map(|current| current.partner_id);
            apply_assign(order, &partner, Utc::now())
        })
        .await
        .map_err(|err| reject(state, order_id, "assign", err))?;

    let action = match previous {
        Some(prev) if prev != partner.id => "reassigned",
        _ => "assigned",
    };
    state
        .metrics
        .assignments_total
        .with_label_values(&[action])
        .inc();
    info!(
        order_id = %order_id,
        partner_id = %partner.id,
        previous_partner_id = ?previous,
        actor = %request.actor,
        status = %committed.order.status,
        "partner {action}"
    );

    Ok(committed.order)
}

pub async fn unassign(
    state: &AppState,
    order_id: Uuid,
    request: UnassignRequest,
) -> Result<Order, AppError> {
    let committed = state
        .orders
        .update(order_id, OrderEventKind::Unassigned, apply_unassign)
        .await
        .map_err(|err| reject(state, order_id, "unassign", err))?;

    if committed.changed {
        state
            .metrics
            .assignments_total
            .with_label_values(&["unassigned"])
            .inc();
        info!(order_id = %order_id, actor = %request.actor, "partner unassigned");
    }

    Ok(committed.order)
}
