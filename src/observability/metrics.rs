use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_placed_total: IntCounterVec,
    pub transitions_total: IntCounterVec,
    pub mutations_rejected_total: IntCounterVec,
    pub assignments_total: IntCounterVec,
    pub store_conflicts_total: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_placed_total = IntCounterVec::new(
            Opts::new("orders_placed_total", "Orders placed by type"),
            &["type"],
        )
        .expect("valid orders_placed_total metric");

        let transitions_total = IntCounterVec::new(
            Opts::new(
                "order_transitions_total",
                "Committed status transitions by target status",
            ),
            &["to"],
        )
        .expect("valid order_transitions_total metric");

        let mutations_rejected_total = IntCounterVec::new(
            Opts::new(
                "order_mutations_rejected_total",
                "Order mutations refused, by error code",
            ),
            &["code"],
        )
        .expect("valid order_mutations_rejected_total metric");

        let assignments_total = IntCounterVec::new(
            Opts::new(
                "order_assignments_total",
                "Partner assignment changes by action",
            ),
            &["action"],
        )
        .expect("valid order_assignments_total metric");

        let store_conflicts_total = IntCounter::new(
            "order_store_conflicts_total",
            "Optimistic write conflicts in the order store",
        )
        .expect("valid order_store_conflicts_total metric");

        registry
            .register(Box::new(orders_placed_total.clone()))
            .expect("register orders_placed_total");
        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register order_transitions_total");
        registry
            .register(Box::new(mutations_rejected_total.clone()))
            .expect("register order_mutations_rejected_total");
        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register order_assignments_total");
        registry
            .register(Box::new(store_conflicts_total.clone()))
            .expect("register order_store_conflicts_total");

        Self {
            registry,
            orders_placed_total,
            transitions_total,
            mutations_rejected_total,
            assignments_total,
            store_conflicts_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
