//! Configuration catalog: equipment, events and sectors

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
        event::{self, CreateEvent, Event, UpdateEvent},
        sector::{CreateSector, Sector, UpdateSector},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // Equipment

    pub async fn list_equipment(&self) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list().await
    }

    pub async fn get_equipment(&self, id: Uuid) -> AppResult<Equipment> {
        self.repository.equipment.get_by_id(id).await
    }

    pub async fn create_equipment(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let equipment = self.repository.equipment.create(data).await?;
        tracing::info!("Equipment {} ({}) created", equipment.tag, equipment.id);
        Ok(equipment)
    }

    pub async fn update_equipment(&self, id: Uuid, data: &UpdateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        self.repository.equipment.update(id, data).await
    }

    /// No check against rentals referencing the equipment
    pub async fn delete_equipment(&self, id: Uuid) -> AppResult<()> {
        self.repository.equipment.delete(id).await?;
        tracing::info!("Equipment {} deleted", id);
        Ok(())
    }

    // Events

    pub async fn list_events(&self) -> AppResult<Vec<Event>> {
        self.repository.events.list().await
    }

    pub async fn get_event(&self, id: Uuid) -> AppResult<Event> {
        self.repository.events.get_by_id(id).await
    }

    /// Most recent active event
    pub async fn current_event(&self) -> AppResult<Event> {
        let events = self.repository.events.list().await?;
        event::current_event(&events)
            .cloned()
            .ok_or_else(|| AppError::NotFound("No active event".to_string()))
    }

    pub async fn create_event(&self, data: &CreateEvent) -> AppResult<Event> {
        data.validate()?;
        let event = self.repository.events.create(data).await?;
        tracing::info!("Event {} ({}) created", event.name, event.id);
        Ok(event)
    }

    pub async fn update_event(&self, id: Uuid, data: &UpdateEvent) -> AppResult<Event> {
        let event = self.repository.events.get_by_id(id).await?;
        let start = data.start_date.unwrap_or(event.start_date);
        let end = data.end_date.unwrap_or(event.end_date);
        if end < start {
            return Err(AppError::Validation("End date is before start date".to_string()));
        }
        self.repository.events.update(id, data).await
    }

    pub async fn delete_event(&self, id: Uuid) -> AppResult<()> {
        self.repository.events.delete(id).await
    }

    // Sectors

    pub async fn list_sectors(&self) -> AppResult<Vec<Sector>> {
        self.repository.sectors.list().await
    }

    pub async fn get_sector(&self, id: Uuid) -> AppResult<Sector> {
        self.repository.sectors.get_by_id(id).await
    }

    pub async fn create_sector(&self, data: &CreateSector) -> AppResult<Sector> {
        data.validate()?;
        self.repository.sectors.create(data).await
    }

    pub async fn update_sector(&self, id: Uuid, data: &UpdateSector) -> AppResult<Sector> {
        self.repository.sectors.update(id, data).await
    }

    pub async fn delete_sector(&self, id: Uuid) -> AppResult<()> {
        self.repository.sectors.delete(id).await
    }
}
