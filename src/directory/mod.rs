use chrono::Utc;
use dashmap::DashMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::VehicleType;
use crate::models::partner::{ApprovalStatus, Partner};

/// Read-only view of partners used by dispatch.
pub trait PartnerDirectory: Send + Sync {
    fn get(&self, id: Uuid) -> Option<Partner>;

    /// Approved and active partners, optionally narrowed to one village (case-insensitive).
    fn list_eligible(&self, village: Option<&str>) -> Vec<Partner>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPartner {
    pub name: String,
    pub contact: String,
    pub vehicle_type: VehicleType,
    pub vehicle_number: String,
    pub village: String,
}

/// In-memory partner store. Partners start out pending approval and active.
#[derive(Default)]
pub struct PartnerRegistry {
    partners: DashMap<Uuid, Partner>,
}

impl PartnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    pub fn register(&self, new: NewPartner) -> Result<Partner, AppError> {
        if new.name.trim().is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".to_string()));
        }
        if new.contact.trim().is_empty() {
            return Err(AppError::BadRequest("contact cannot be empty".to_string()));
        }

        let partner = Partner {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            contact: new.contact.trim().to_string(),
            vehicle_type: new.vehicle_type,
            vehicle_number: new.vehicle_number.trim().to_string(),
            village: new.village.trim().to_string(),
            approval_status: ApprovalStatus::Pending,
            is_active: true,
            updated_at: Utc::now(),
        };

        self.partners.insert(partner.id, partner.clone());
        Ok(partner)
    }

    pub fn list(&self) -> Vec<Partner> {
        let mut partners: Vec<Partner> = self
            .partners
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        partners.sort_by(|a, b| a.name.cmp(&b.name));
        partners
    }

    pub fn set_approval(&self, id: Uuid, status: ApprovalStatus) -> Result<Partner, AppError> {
        let mut partner = self
            .partners
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("partner {id} not found")))?;

        partner.approval_status = status;
        partner.updated_at = Utc::now();

        Ok(partner.clone())
    }

    pub fn set_active(&self, id: Uuid, is_active: bool) -> Result<Partner, AppError> {
        let mut partner = self
            .partners
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("partner {id} not found")))?;

        partner.is_active = is_active;
        partner.updated_at = Utc::now();

        Ok(partner.clone())
    }
}

impl PartnerDirectory for PartnerRegistry {
    fn get(&self, id: Uuid) -> Option<Partner> {
        self.partners.get(&id).map(|entry| entry.value().clone())
    }

    fn list_eligible(&self, village: Option<&str>) -> Vec<Partner> {
        let village = village.map(str::trim).filter(|v| !v.is_empty());

        let mut partners: Vec<Partner> = self
            .partners
            .iter()
            .filter(|entry| {
                let partner = entry.value();
                partner.is_eligible()
                    && village.is_none_or(|v| partner.village.eq_ignore_ascii_case(v))
            })
            .map(|entry| entry.value().clone())
            .collect();
        partners.sort_by(|a, b| a.name.cmp(&b.name));
        partners
    }
}
