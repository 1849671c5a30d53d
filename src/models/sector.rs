//! Sector (event department) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sector {
    pub id: Uuid,
    pub name: String,
    pub coordinator_name: Option<String>,
    pub coordinator_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSector {
    #[validate(length(min = 1, message = "Sector name is required"))]
    pub name: String,
    pub coordinator_name: Option<String>,
    pub coordinator_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateSector {
    pub name: Option<String>,
    pub coordinator_name: Option<String>,
    pub coordinator_phone: Option<String>,
}

impl Sector {
    pub fn apply(&mut self, data: &UpdateSector) {
        if let Some(ref v) = data.name {
            self.name = v.clone();
        }
        if data.coordinator_name.is_some() {
            self.coordinator_name = data.coordinator_name.clone();
        }
        if data.coordinator_phone.is_some() {
            self.coordinator_phone = data.coordinator_phone.clone();
        }
    }
}
