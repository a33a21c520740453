use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::VehicleType;
use crate::models::partner::Partner;

/// Partner details copied onto the order at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub partner_id: Uuid,
    pub name: String,
    pub phone: String,
    pub vehicle_type: VehicleType,
    pub vehicle_number: String,
    pub assigned_at: DateTime<Utc>,
}

impl Assignment {
    pub fn from_partner(partner: &Partner, assigned_at: DateTime<Utc>) -> Self {
        Self {
            partner_id: partner.id,
            name: partner.name.clone(),
            phone: partner.contact.clone(),
            vehicle_type: partner.vehicle_type,
            vehicle_number: partner.vehicle_number.clone(),
            assigned_at,
        }
    }
}
