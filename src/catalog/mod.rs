//! Product and service catalogs consulted when an order is placed.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub item_id: String,
    pub name: String,
    pub price: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOption {
    pub category_id: String,
    pub category_name: String,
    pub option_id: String,
    pub name: String,
    pub price: f64,
}

pub trait Catalog: Send + Sync {
    fn lookup(&self, item_id: &str) -> Option<CatalogItem>;
}

pub trait ServiceCatalog: Send + Sync {
    fn lookup(&self, category_id: &str, option_id: &str) -> Option<ServiceOption>;
}

#[derive(Default)]
pub struct CatalogStore {
    items: DashMap<String, CatalogItem>,
    services: DashMap<(String, String), ServiceOption>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_item(&self, item: CatalogItem) -> Result<CatalogItem, AppError> {
        if item.item_id.trim().is_empty() || item.name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "itemId and name cannot be empty".to_string(),
            ));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(AppError::BadRequest(format!(
                "price must be non-negative, got {}",
                item.price
            )));
        }

        self.items.insert(item.item_id.clone(), item.clone());
        Ok(item)
    }

    pub fn items(&self) -> Vec<CatalogItem> {
        let mut items: Vec<CatalogItem> = self
            .items
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        items
    }

    pub fn upsert_service(&self, option: ServiceOption) -> Result<ServiceOption, AppError> {
        if option.category_id.trim().is_empty() || option.option_id.trim().is_empty() {
            return Err(AppError::BadRequest(
                "categoryId and optionId cannot be empty".to_string(),
            ));
        }
        if !option.price.is_finite() || option.price < 0.0 {
            return Err(AppError::BadRequest(format!(
                "price must be non-negative, got {}",
                option.price
            )));
        }

        self.services.insert(
            (option.category_id.clone(), option.option_id.clone()),
            option.clone(),
        );
        Ok(option)
    }
}

impl Catalog for CatalogStore {
    fn lookup(&self, item_id: &str) -> Option<CatalogItem> {
        self.items.get(item_id).map(|entry| entry.value().clone())
    }
}

impl ServiceCatalog for CatalogStore {
    fn lookup(&self, category_id: &str, option_id: &str) -> Option<ServiceOption> {
        self.services
            .get(&(category_id.to_string(), option_id.to_string()))
            .map(|entry| entry.value().clone())
    }
}
