use crate::catalog::CatalogStore;
use crate::config::{Config, Pricing};
use crate::directory::PartnerRegistry;
use crate::observability::metrics::Metrics;
use crate::store::OrderRepository;

pub struct AppState {
    pub orders: OrderRepository,
    pub partners: PartnerRegistry,
    pub catalog: CatalogStore,
    pub pricing: Pricing,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let metrics = Metrics::new();

        Self {
            orders: OrderRepository::new(
                config.retry.clone(),
                config.event_buffer_size,
                metrics.clone(),
            ),
            partners: PartnerRegistry::new(),
            catalog: CatalogStore::new(),
            pricing: config.pricing.clone(),
            metrics,
        }
    }
}
