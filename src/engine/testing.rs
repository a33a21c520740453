use chrono::Utc;
use uuid::Uuid;

use crate::engine::flow;
use crate::models::order::{
    Actor, ActorRole, Customer, Financials, LineItem, Order, OrderDetails, OrderStatus, OrderType,
    PaymentMethod, PaymentStatus, RideDetails, ServiceDetails, TimelineEntry, VehicleType,
};
use crate::models::partner::{ApprovalStatus, Partner};

pub fn admin() -> Actor {
    Actor::new(ActorRole::Admin, "ops-1")
}

pub fn rider() -> Actor {
    Actor::new(ActorRole::Partner, "rider-1")
}

pub fn customer() -> Actor {
    Actor::new(ActorRole::Customer, "cust-1")
}

fn details(order_type: OrderType) -> OrderDetails {
    match order_type {
        OrderType::Shopping => OrderDetails::Shopping {
            items: vec![LineItem {
                item_id: "rice-5kg".to_string(),
                name: "Rice".to_string(),
                unit: "5kg bag".to_string(),
                price: 250.0,
                quantity: 2,
            }],
        },
        OrderType::Ride => OrderDetails::Ride(RideDetails {
            pickup: "Bus stand".to_string(),
            drop: "Market".to_string(),
            distance_km: 4.0,
            vehicle_type: VehicleType::Auto,
        }),
        OrderType::Service => OrderDetails::Service(ServiceDetails {
            category_id: "plumbing".to_string(),
            category_name: "Plumbing".to_string(),
            option_id: "tap-repair".to_string(),
            option_name: "Tap repair".to_string(),
            schedule: "tomorrow 10:00".to_string(),
        }),
    }
}

/// Builds an order that has walked its flow up to `status`, one timeline entry per step.
pub fn order_at(order_type: OrderType, status: OrderStatus) -> Order {
    let now = Utc::now();
    let timeline: Vec<TimelineEntry> = flow::flow(order_type)
        .iter()
        .take(flow::position(order_type, status).map_or(1, |index| index + 1))
        .map(|step| TimelineEntry {
            status: *step,
            time: now,
            actor: admin(),
            note: None,
        })
        .collect();

    Order {
        id: Uuid::new_v4(),
        order_type,
        customer: Customer {
            user_id: "cust-1".to_string(),
            user_name: "Lakshmi".to_string(),
            user_phone: "9876543210".to_string(),
            user_village: "Hosur".to_string(),
        },
        status,
        timeline,
        assignment: None,
        financials: Financials {
            items_total: Some(500.0),
            delivery_charge: Some(30.0),
            total_amount: 530.0,
            final_amount: None,
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
        },
        details: details(order_type),
        notes: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
        version: 1,
    }
}

pub fn partner(seed: u128, approval_status: ApprovalStatus, is_active: bool) -> Partner {
    Partner {
        id: Uuid::from_u128(seed),
        name: format!("partner-{seed}"),
        contact: "9000000000".to_string(),
        vehicle_type: VehicleType::Bike,
        vehicle_number: format!("KA-01-{seed:04}"),
        village: "Hosur".to_string(),
        approval_status,
        is_active,
        updated_at: Utc::now(),
    }
}
