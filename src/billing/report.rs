use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::flow;
use crate::models::order::Order;

/// Revenue overview. Quoted and collected revenue are reported separately because the
/// collected amount recorded at finalization may differ from the original quote.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_orders: usize,
    pub by_status: BTreeMap<String, usize>,
    pub completed_orders: usize,
    pub quoted_revenue: f64,
    pub collected_revenue: f64,
    pub finalized_orders: usize,
}

pub fn summarize<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Summary {
    let mut summary = Summary::default();

    for order in orders {
        summary.total_orders += 1;
        *summary
            .by_status
            .entry(order.status.as_str().to_string())
            .or_insert(0) += 1;

        if order.status == flow::terminal_success(order.order_type) {
            summary.completed_orders += 1;
            summary.quoted_revenue += order.financials.total_amount;
            summary.collected_revenue += order.financials.collected_total();
        }
        if order.financials.final_amount.is_some() {
            summary.finalized_orders += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::order_at;
    use crate::models::order::{OrderStatus, OrderType};

    #[test]
    fn quoted_and_collected_revenue_stay_distinct() {
        let mut finalized = order_at(OrderType::Service, OrderStatus::Completed);
        finalized.financials.final_amount = Some(450.0);
        let delivered = order_at(OrderType::Shopping, OrderStatus::Delivered);
        let pending = order_at(OrderType::Ride, OrderStatus::Pending);
        let cancelled = order_at(OrderType::Ride, OrderStatus::Cancelled);

        let summary = summarize([&finalized, &delivered, &pending, &cancelled]);

        assert_eq!(summary.total_orders, 4);
        assert_eq!(summary.completed_orders, 2);
        assert_eq!(summary.finalized_orders, 1);
        assert_eq!(summary.quoted_revenue, 1060.0);
        assert_eq!(summary.collected_revenue, 980.0);
        assert_eq!(summary.by_status.get("cancelled"), Some(&1));
        assert_eq!(summary.by_status.get("pending"), Some(&1));
    }
}
