//! Storage port: one trait per entity, backed by Postgres or memory

pub mod equipment;
pub mod events;
pub mod memory;
pub mod merchandise;
pub mod rentals;
pub mod roster;
pub mod sectors;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        enrollee::{EnrolledPerson, NewEnrolledPerson, UpdateEnrolledPerson},
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
        event::{CreateEvent, Event, UpdateEvent},
        merchandise::{CreateMerchandise, Delivery, MerchandiseItem, UpdateMerchandise},
        rental::{Rental, ReturnUpdate},
        sector::{CreateSector, Sector, UpdateSector},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EquipmentStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Equipment>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Equipment>;
    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment>;
    async fn update(&self, id: Uuid, data: &UpdateEquipment) -> AppResult<Equipment>;
    /// Direct removal; rentals referencing the equipment are not checked
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Event>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Event>;
    async fn create(&self, data: &CreateEvent) -> AppResult<Event>;
    async fn update(&self, id: Uuid, data: &UpdateEvent) -> AppResult<Event>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectorStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Sector>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Sector>;
    async fn create(&self, data: &CreateSector) -> AppResult<Sector>;
    async fn update(&self, id: Uuid, data: &UpdateSector) -> AppResult<Sector>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Rental fields resolved by the service before insertion
#[derive(Debug, Clone)]
pub struct NewRental {
    pub equipment_id: Uuid,
    pub event_id: Uuid,
    pub sector_id: Option<Uuid>,
    pub responsible_name: String,
    pub responsible_phone: Option<String>,
    pub start_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub accessories: crate::models::AccessorySet,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

/// Store-side rental filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RentalFilter {
    pub event_id: Option<Uuid>,
    pub sector_id: Option<Uuid>,
    pub open_only: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalStore: Send + Sync {
    async fn list(&self, filter: &RentalFilter) -> AppResult<Vec<Rental>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Rental>;
    /// Insert with status `active`
    async fn create(&self, data: &NewRental) -> AppResult<Rental>;
    /// Apply a return as one write, only while the rental is still open.
    /// Fails with `BusinessRule` if it was closed concurrently.
    async fn record_return(&self, id: Uuid, update: &ReturnUpdate) -> AppResult<Rental>;
    /// Whether the equipment is out on an active or partial rental
    async fn has_open_rental(&self, equipment_id: Uuid) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MerchandiseStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<MerchandiseItem>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<MerchandiseItem>;
    async fn create(&self, data: &CreateMerchandise) -> AppResult<MerchandiseItem>;
    async fn update(&self, id: Uuid, data: &UpdateMerchandise) -> AppResult<MerchandiseItem>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn restock(&self, id: Uuid, quantity: i32) -> AppResult<MerchandiseItem>;
    /// Atomically check for an existing delivery, decrement stock if it is
    /// positive, and insert the delivery. Returns the server timestamp.
    async fn deliver(
        &self,
        person_id: Uuid,
        item_id: Uuid,
        operator_id: Uuid,
    ) -> AppResult<DateTime<Utc>>;
    /// Atomically delete the delivery and give the unit back to stock
    async fn undo_delivery(&self, person_id: Uuid, item_id: Uuid) -> AppResult<()>;
    async fn deliveries_for_item(&self, item_id: Uuid) -> AppResult<Vec<Delivery>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Empty term lists everyone (up to `limit`)
    async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<EnrolledPerson>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<EnrolledPerson>;
    async fn create(&self, data: &NewEnrolledPerson) -> AppResult<EnrolledPerson>;
    async fn update(&self, id: Uuid, data: &UpdateEnrolledPerson) -> AppResult<EnrolledPerson>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    /// Subset of `tax_ids` already on the roster
    async fn existing_tax_ids(&self, tax_ids: &[String]) -> AppResult<HashSet<String>>;
    /// Insert records whose tax ID is not yet present; returns how many went in
    async fn insert_many(&self, records: &[NewEnrolledPerson]) -> AppResult<usize>;
}

/// Main repository struct holding one store per entity
#[derive(Clone)]
pub struct Repository {
    pool: Option<Pool<Postgres>>,
    pub equipment: Arc<dyn EquipmentStore>,
    pub events: Arc<dyn EventStore>,
    pub sectors: Arc<dyn SectorStore>,
    pub rentals: Arc<dyn RentalStore>,
    pub merchandise: Arc<dyn MerchandiseStore>,
    pub roster: Arc<dyn RosterStore>,
}

impl Repository {
    /// Create a repository backed by the given Postgres pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            equipment: Arc::new(equipment::EquipmentRepository::new(pool.clone())),
            events: Arc::new(events::EventsRepository::new(pool.clone())),
            sectors: Arc::new(sectors::SectorsRepository::new(pool.clone())),
            rentals: Arc::new(rentals::RentalsRepository::new(pool.clone())),
            merchandise: Arc::new(merchandise::MerchandiseRepository::new(pool.clone())),
            roster: Arc::new(roster::RosterRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository whose stores share one in-memory state
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::InMemoryStore::new());
        Self {
            pool: None,
            equipment: store.clone(),
            events: store.clone(),
            sectors: store.clone(),
            rentals: store.clone(),
            merchandise: store.clone(),
            roster: store,
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
