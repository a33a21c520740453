use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::VehicleType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// A delivery rider, driver or technician who can be dispatched to orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub vehicle_type: VehicleType,
    pub vehicle_number: String,
    pub village: String,
    pub approval_status: ApprovalStatus,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl Partner {
    pub fn is_eligible(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved && self.is_active
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{ApprovalStatus, Partner};
    use crate::models::order::VehicleType;

    fn partner(approval_status: ApprovalStatus, is_active: bool) -> Partner {
        Partner {
            id: Uuid::from_u128(7),
            name: "Ravi".to_string(),
            contact: "9000000000".to_string(),
            vehicle_type: VehicleType::Bike,
            vehicle_number: "KA-01-1234".to_string(),
            village: "Hosur".to_string(),
            approval_status,
            is_active,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_approved_and_active_partners_are_eligible() {
        assert!(partner(ApprovalStatus::Approved, true).is_eligible());
        assert!(!partner(ApprovalStatus::Approved, false).is_eligible());
        assert!(!partner(ApprovalStatus::Pending, true).is_eligible());
        assert!(!partner(ApprovalStatus::Rejected, true).is_eligible());
    }
}
