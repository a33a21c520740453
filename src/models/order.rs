use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::assignment::Assignment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Shopping,
    Ride,
    Service,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Shopping => "shopping",
            OrderType::Ride => "ride",
            OrderType::Service => "service",
        }
    }
}

/// Every status any flow can reach. Which ones are legal for an order depends on its type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    DriverOnWay,
    Arrived,
    InProgress,
    Completed,
    TechnicianAssigned,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::DriverOnWay => "driver_on_way",
            OrderStatus::Arrived => "arrived",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::TechnicianAssigned => "technician_assigned",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Partner,
    Admin,
}

/// Whoever triggered a mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub role: ActorRole,
    pub id: String,
}

impl Actor {
    pub fn new(role: ActorRole, id: impl Into<String>) -> Self {
        Self {
            role,
            id: id.into(),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.role {
            ActorRole::Customer => "customer",
            ActorRole::Partner => "partner",
            ActorRole::Admin => "admin",
        };
        write!(f, "{role}:{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub time: DateTime<Utc>,
    pub actor: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Customer identity captured at placement; never re-derived afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub user_id: String,
    pub user_name: String,
    pub user_phone: String,
    pub user_village: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Online,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_charge: Option<f64>,
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_amount: Option<f64>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
}

impl Financials {
    /// What was actually collected, falling back to the quote when the order was never finalized.
    pub fn collected_total(&self) -> f64 {
        self.final_amount.unwrap_or(self.total_amount)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Bike,
    Auto,
    Car,
}

impl VehicleType {
    pub fn fare_multiplier(&self) -> f64 {
        match self {
            VehicleType::Bike => 1.0,
            VehicleType::Auto => 1.5,
            VehicleType::Car => 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_id: String,
    pub name: String,
    pub unit: String,
    pub price: f64,
    pub quantity: u32,
}

impl LineItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RideDetails {
    pub pickup: String,
    pub drop: String,
    pub distance_km: f64,
    pub vehicle_type: VehicleType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    pub category_id: String,
    pub category_name: String,
    pub option_id: String,
    pub option_name: String,
    pub schedule: String,
}

/// Type-specific payload. The lifecycle engine never looks inside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderDetails {
    Shopping { items: Vec<LineItem> },
    Ride(RideDetails),
    Service(ServiceDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(flatten)]
    pub customer: Customer,
    pub status: OrderStatus,
    pub timeline: Vec<TimelineEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,
    #[serde(flatten)]
    pub financials: Financials,
    pub details: OrderDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl Order {
    /// Stamps a committed mutation. `updated_at` never moves backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
        self.version += 1;
    }
}
