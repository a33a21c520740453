use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{Catalog, ServiceCatalog};
use crate::config::Pricing;
use crate::engine::timeline;
use crate::error::AppError;
use crate::models::order::{
    Actor, ActorRole, Customer, Financials, LineItem, Order, OrderDetails, OrderStatus, OrderType,
    PaymentMethod, PaymentStatus, RideDetails, ServiceDetails, VehicleType,
};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderPayload {
    Shopping {
        items: Vec<CartLine>,
    },
    #[serde(rename_all = "camelCase")]
    Ride {
        pickup: String,
        drop: String,
        distance_km: f64,
        vehicle_type: VehicleType,
    },
    #[serde(rename_all = "camelCase")]
    Service {
        category_id: String,
        option_id: String,
        schedule: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub customer: Customer,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub payload: OrderPayload,
    #[serde(default)]
    pub notes: Option<String>,
}

struct Quote {
    details: OrderDetails,
    items_total: f64,
    charge: f64,
}

fn quote_shopping(
    catalog: &dyn Catalog,
    lines: &[CartLine],
    pricing: &Pricing,
) -> Result<Quote, AppError> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_string()));
    }

    let items = lines
        .iter()
        .map(|line| {
            if line.quantity == 0 {
                return Err(AppError::BadRequest(format!(
                    "quantity for {} must be at least 1",
                    line.item_id
                )));
            }
            let item = catalog
                .lookup(&line.item_id)
                .ok_or_else(|| AppError::NotFound(format!("item {} not found", line.item_id)))?;
            Ok(LineItem {
                item_id: item.item_id,
                name: item.name,
                unit: item.unit,
                price: item.price,
                quantity: line.quantity,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let items_total = items.iter().map(LineItem::line_total).sum();

    Ok(Quote {
        details: OrderDetails::Shopping { items },
        items_total,
        charge: pricing.delivery_charge,
    })
}

fn quote_ride(
    pickup: &str,
    drop: &str,
    distance_km: f64,
    vehicle_type: VehicleType,
    pricing: &Pricing,
) -> Result<Quote, AppError> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(AppError::BadRequest(format!(
            "distanceKm must be non-negative, got {distance_km}"
        )));
    }
    if pickup.trim().is_empty() || drop.trim().is_empty() {
        return Err(AppError::BadRequest("pickup and drop are required".to_string()));
    }

    let fare = (pricing.ride_base_fare + pricing.ride_per_km * distance_km)
        * vehicle_type.fare_multiplier();

    Ok(Quote {
        details: OrderDetails::Ride(RideDetails {
            pickup: pickup.trim().to_string(),
            drop: drop.trim().to_string(),
            distance_km,
            vehicle_type,
        }),
        items_total: round_money(fare),
        charge: 0.0,
    })
}

fn quote_service(
    services: &dyn ServiceCatalog,
    category_id: &str,
    option_id: &str,
    schedule: &str,
    pricing: &Pricing,
) -> Result<Quote, AppError> {
    let option = services.lookup(category_id, option_id).ok_or_else(|| {
        AppError::NotFound(format!("service option {category_id}/{option_id} not found"))
    })?;

    Ok(Quote {
        details: OrderDetails::Service(ServiceDetails {
            category_id: option.category_id,
            category_name: option.category_name,
            option_id: option.option_id,
            option_name: option.name,
            schedule: schedule.trim().to_string(),
        }),
        items_total: option.price,
        charge: pricing.service_visit_charge,
    })
}

fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Builds a new pending order, priced against the catalogs. Nothing is stored.
pub fn build_order<C>(
    catalog: &C,
    pricing: &Pricing,
    request: PlaceOrderRequest,
) -> Result<Order, AppError>
where
    C: Catalog + ServiceCatalog,
{
    if request.customer.user_name.trim().is_empty() {
        return Err(AppError::BadRequest("customer name cannot be empty".to_string()));
    }

    let (order_type, quote) = match &request.payload {
        OrderPayload::Shopping { items } => {
            (OrderType::Shopping, quote_shopping(catalog, items, pricing)?)
        }
        OrderPayload::Ride {
            pickup,
            drop,
            distance_km,
            vehicle_type,
        } => (
            OrderType::Ride,
            quote_ride(pickup, drop, *distance_km, *vehicle_type, pricing)?,
        ),
        OrderPayload::Service {
            category_id,
            option_id,
            schedule,
        } => (
            OrderType::Service,
            quote_service(catalog, category_id, option_id, schedule, pricing)?,
        ),
    };

    let now = Utc::now();
    let placed_by = Actor::new(ActorRole::Customer, request.customer.user_id.clone());

    let mut order = Order {
        id: Uuid::new_v4(),
        order_type,
        customer: request.customer,
        status: OrderStatus::Pending,
        timeline: Vec::new(),
        assignment: None,
        financials: Financials {
            items_total: Some(quote.items_total),
            delivery_charge: Some(quote.charge),
            total_amount: round_money(quote.items_total + quote.charge),
            final_amount: None,
            payment_method: request.payment_method,
            payment_status: PaymentStatus::Pending,
        },
        details: quote.details,
        notes: request.notes.filter(|text| !text.trim().is_empty()),
        created_at: now,
        updated_at: now,
        completed_at: None,
        version: 1,
    };
    timeline::record(
        &mut order,
        OrderStatus::Pending,
        &placed_by,
        Some("Order placed".to_string()),
        now,
    );

    Ok(order)
}

pub fn place_order(state: &AppState, request: PlaceOrderRequest) -> Result<Order, AppError> {
    let order = build_order(&state.catalog, &state.pricing, request)?;
    let order = state.orders.insert(order)?;

    state
        .metrics
        .orders_placed_total
        .with_label_values(&[order.order_type.as_str()])
        .inc();
    info!(
        order_id = %order.id,
        order_type = order.order_type.as_str(),
        total = order.financials.total_amount,
        customer = %order.customer.user_id,
        "order placed"
    );

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, CatalogStore, ServiceOption};

    fn customer() -> Customer {
        Customer {
            user_id: "cust-9".to_string(),
            user_name: "Meena".to_string(),
            user_phone: "9123456780".to_string(),
            user_village: "Bagalur".to_string(),
        }
    }

    fn stocked_catalog() -> CatalogStore {
        let store = CatalogStore::new();
        store
            .upsert_item(CatalogItem {
                item_id: "dal-1kg".to_string(),
                name: "Toor dal".to_string(),
                price: 140.0,
                unit: "kg".to_string(),
            })
            .unwrap();
        store
            .upsert_service(ServiceOption {
                category_id: "plumbing".to_string(),
                category_name: "Plumbing".to_string(),
                option_id: "tap-repair".to_string(),
                name: "Tap repair".to_string(),
                price: 200.0,
            })
            .unwrap();
        store
    }

    fn request(payload: OrderPayload) -> PlaceOrderRequest {
        PlaceOrderRequest {
            customer: customer(),
            payment_method: PaymentMethod::Cod,
            payload,
            notes: None,
        }
    }

    #[test]
    fn shopping_order_is_priced_from_catalog() {
        let order = build_order(
            &stocked_catalog(),
            &Pricing::default(),
            request(OrderPayload::Shopping {
                items: vec![CartLine {
                    item_id: "dal-1kg".to_string(),
                    quantity: 3,
                }],
            }),
        )
        .unwrap();

        assert_eq!(order.order_type, OrderType::Shopping);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.financials.items_total, Some(420.0));
        assert_eq!(order.financials.delivery_charge, Some(30.0));
        assert_eq!(order.financials.total_amount, 450.0);
        assert!(order.financials.final_amount.is_none());
        assert_eq!(order.timeline.len(), 1);
        assert_eq!(order.timeline[0].status, OrderStatus::Pending);
        assert_eq!(order.timeline[0].actor.role, ActorRole::Customer);
    }

    #[test]
    fn unknown_item_is_not_found() {
        let err = build_order(
            &stocked_catalog(),
            &Pricing::default(),
            request(OrderPayload::Shopping {
                items: vec![CartLine {
                    item_id: "ghee".to_string(),
                    quantity: 1,
                }],
            }),
        )
        .unwrap_err();

        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn empty_cart_and_zero_quantity_are_bad_requests() {
        let catalog = stocked_catalog();
        let pricing = Pricing::default();

        let empty = build_order(
            &catalog,
            &pricing,
            request(OrderPayload::Shopping { items: vec![] }),
        );
        let zero = build_order(
            &catalog,
            &pricing,
            request(OrderPayload::Shopping {
                items: vec![CartLine {
                    item_id: "dal-1kg".to_string(),
                    quantity: 0,
                }],
            }),
        );

        assert_eq!(empty.unwrap_err().code(), "bad_request");
        assert_eq!(zero.unwrap_err().code(), "bad_request");
    }

    #[test]
    fn ride_fare_scales_with_distance_and_vehicle() {
        let order = build_order(
            &stocked_catalog(),
            &Pricing::default(),
            request(OrderPayload::Ride {
                pickup: "Temple".to_string(),
                drop: "Station".to_string(),
                distance_km: 6.0,
                vehicle_type: VehicleType::Auto,
            }),
        )
        .unwrap();

        // (20 + 10 * 6) * 1.5
        assert_eq!(order.financials.total_amount, 120.0);
        assert_eq!(order.financials.delivery_charge, Some(0.0));
    }

    #[test]
    fn negative_distance_is_rejected() {
        let err = build_order(
            &stocked_catalog(),
            &Pricing::default(),
            request(OrderPayload::Ride {
                pickup: "Temple".to_string(),
                drop: "Station".to_string(),
                distance_km: -1.0,
                vehicle_type: VehicleType::Bike,
            }),
        )
        .unwrap_err();

        assert_eq!(err.code(), "bad_request");
    }

    #[test]
    fn service_order_resolves_names_and_visit_charge() {
        let order = build_order(
            &stocked_catalog(),
            &Pricing::default(),
            request(OrderPayload::Service {
                category_id: "plumbing".to_string(),
                option_id: "tap-repair".to_string(),
                schedule: "Saturday morning".to_string(),
            }),
        )
        .unwrap();

        assert_eq!(order.financials.total_amount, 250.0);
        match order.details {
            OrderDetails::Service(details) => {
                assert_eq!(details.category_name, "Plumbing");
                assert_eq!(details.option_name, "Tap repair");
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn blank_customer_name_is_rejected() {
        let mut req = request(OrderPayload::Service {
            category_id: "plumbing".to_string(),
            option_id: "tap-repair".to_string(),
            schedule: "now".to_string(),
        });
        req.customer.user_name = " ".to_string();

        let err = build_order(&stocked_catalog(), &Pricing::default(), req).unwrap_err();

        assert_eq!(err.code(), "bad_request");
    }
}
