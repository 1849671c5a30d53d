//! Give-away merchandise ("pins & patches") and its delivery records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Upper bound on units held of one item
pub const MAX_STOCK: i32 = 1_000_000;

/// Merchandise stock-keeping unit
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MerchandiseItem {
    pub id: Uuid,
    pub name: String,
    /// Units still available; never negative
    pub stock: i32,
    /// Alert threshold
    pub min_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MerchandiseItem {
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Stock after adding `quantity`, or `None` past [`MAX_STOCK`]
    pub fn restocked(&self, quantity: i32) -> Option<i32> {
        self.stock
            .checked_add(quantity)
            .filter(|stock| (0..=MAX_STOCK).contains(stock))
    }
}

/// One handout of one item to one enrolled person
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Delivery {
    pub person_id: Uuid,
    pub item_id: Uuid,
    pub operator_id: Uuid,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMerchandise {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    #[validate(range(min = 0, max = 1000000, message = "Stock must be between 0 and 1000000"))]
    pub stock: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub min_stock: i32,
}

/// Stock itself only moves through deliveries and restocks
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMerchandise {
    pub name: Option<String>,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub min_stock: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct Restock {
    #[validate(range(min = 1, max = 1000000, message = "Restock quantity must be between 1 and 1000000"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeliverRequest {
    pub person_id: Uuid,
}

/// Whether one person already received one item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryStatus {
    pub person_id: Uuid,
    pub item_id: Uuid,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryReceipt {
    pub person_id: Uuid,
    pub item_id: Uuid,
    pub delivered_at: DateTime<Utc>,
}
