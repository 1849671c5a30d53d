//! Equipment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Kind of lendable equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "equipment_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    Radio,
    Headset,
    PowerBank,
}

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: Uuid,
    /// Inventory tag (unique)
    pub tag: String,
    pub kind: EquipmentKind,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create equipment request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, message = "Inventory tag is required"))]
    pub tag: String,
    pub kind: EquipmentKind,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

/// Update equipment request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEquipment {
    #[validate(length(min = 1, message = "Inventory tag cannot be empty"))]
    pub tag: Option<String>,
    pub kind: Option<EquipmentKind>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl Equipment {
    /// Apply a partial update in place
    pub fn apply(&mut self, data: &UpdateEquipment, now: DateTime<Utc>) {
        if let Some(ref v) = data.tag {
            self.tag = v.clone();
        }
        if let Some(v) = data.kind {
            self.kind = v;
        }
        if data.brand.is_some() {
            self.brand = data.brand.clone();
        }
        if data.model.is_some() {
            self.model = data.model.clone();
        }
        if data.category.is_some() {
            self.category = data.category.clone();
        }
        if data.notes.is_some() {
            self.notes = data.notes.clone();
        }
        self.updated_at = Some(now);
    }
}
