//! In-memory backend implementing every store trait.
//!
//! Intended for tests and demos. One mutex guards the whole state, so each
//! trait call is atomic with respect to the others.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    merchandise::stock_limit_exceeded, rentals::stale_return, EquipmentStore, EventStore,
    MerchandiseStore, NewRental, RentalFilter, RentalStore, RosterStore, SectorStore,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        accessories::AccessorySet,
        enrollee::{EnrolledPerson, NewEnrolledPerson, UpdateEnrolledPerson},
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
        event::{CreateEvent, Event, UpdateEvent},
        merchandise::{CreateMerchandise, Delivery, MerchandiseItem, UpdateMerchandise},
        rental::{Rental, RentalStatus, ReturnUpdate},
        sector::{CreateSector, Sector, UpdateSector},
    },
};

#[derive(Default)]
struct MemoryState {
    equipment: HashMap<Uuid, Equipment>,
    events: HashMap<Uuid, Event>,
    sectors: HashMap<Uuid, Sector>,
    rentals: HashMap<Uuid, Rental>,
    merchandise: HashMap<Uuid, MerchandiseItem>,
    people: HashMap<Uuid, EnrolledPerson>,
    deliveries: HashMap<(Uuid, Uuid), Delivery>,
}

impl MemoryState {
    /// People carry their delivery map so reads need no join
    fn stamp_person(&mut self, person_id: Uuid, item_id: Uuid, at: Option<DateTime<Utc>>) {
        if let Some(p) = self.people.get_mut(&person_id) {
            match at {
                Some(at) => {
                    p.deliveries.insert(item_id, at);
                }
                None => {
                    p.deliveries.remove(&item_id);
                }
            }
        }
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }
}

fn not_found(kind: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {} not found", kind, id))
}

#[async_trait]
impl EquipmentStore for InMemoryStore {
    async fn list(&self) -> AppResult<Vec<Equipment>> {
        let state = self.lock()?;
        let mut rows: Vec<Equipment> = state.equipment.values().cloned().collect();
        rows.sort_by(|a, b| a.tag.cmp(&b.tag));
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Equipment> {
        self.lock()?
            .equipment
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Equipment", id))
    }

    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let mut state = self.lock()?;
        if state.equipment.values().any(|e| e.tag == data.tag) {
            return Err(AppError::Conflict(format!(
                "Inventory tag {} already exists",
                data.tag
            )));
        }
        let row = Equipment {
            id: Uuid::new_v4(),
            tag: data.tag.clone(),
            kind: data.kind,
            brand: data.brand.clone(),
            model: data.model.clone(),
            category: data.category.clone(),
            notes: data.notes.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        state.equipment.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, data: &UpdateEquipment) -> AppResult<Equipment> {
        let mut state = self.lock()?;
        if let Some(ref tag) = data.tag {
            if state.equipment.values().any(|e| e.id != id && &e.tag == tag) {
                return Err(AppError::Conflict(format!("Inventory tag {} already exists", tag)));
            }
        }
        let row = state
            .equipment
            .get_mut(&id)
            .ok_or_else(|| not_found("Equipment", id))?;
        row.apply(data, Utc::now());
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.lock()?
            .equipment
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Equipment", id))
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn list(&self) -> AppResult<Vec<Event>> {
        let state = self.lock()?;
        let mut rows: Vec<Event> = state.events.values().cloned().collect();
        rows.sort_by(|a, b| {
            (b.start_date, b.created_at).cmp(&(a.start_date, a.created_at))
        });
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Event> {
        self.lock()?
            .events
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Event", id))
    }

    async fn create(&self, data: &CreateEvent) -> AppResult<Event> {
        let row = Event {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            start_date: data.start_date,
            end_date: data.end_date,
            active: data.active,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.lock()?.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, data: &UpdateEvent) -> AppResult<Event> {
        let mut state = self.lock()?;
        let row = state.events.get_mut(&id).ok_or_else(|| not_found("Event", id))?;
        row.apply(data, Utc::now());
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.lock()?
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Event", id))
    }
}

#[async_trait]
impl SectorStore for InMemoryStore {
    async fn list(&self) -> AppResult<Vec<Sector>> {
        let state = self.lock()?;
        let mut rows: Vec<Sector> = state.sectors.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Sector> {
        self.lock()?
            .sectors
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Sector", id))
    }

    async fn create(&self, data: &CreateSector) -> AppResult<Sector> {
        let row = Sector {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            coordinator_name: data.coordinator_name.clone(),
            coordinator_phone: data.coordinator_phone.clone(),
        };
        self.lock()?.sectors.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, data: &UpdateSector) -> AppResult<Sector> {
        let mut state = self.lock()?;
        let row = state.sectors.get_mut(&id).ok_or_else(|| not_found("Sector", id))?;
        row.apply(data);
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.lock()?
            .sectors
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Sector", id))
    }
}

#[async_trait]
impl RentalStore for InMemoryStore {
    async fn list(&self, filter: &RentalFilter) -> AppResult<Vec<Rental>> {
        let state = self.lock()?;
        let mut rows: Vec<Rental> = state
            .rentals
            .values()
            .filter(|r| filter.event_id.map_or(true, |id| r.event_id == id))
            .filter(|r| filter.sector_id.map_or(true, |id| r.sector_id == Some(id)))
            .filter(|r| !filter.open_only || r.status.is_open())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Rental> {
        self.lock()?
            .rentals
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Rental", id))
    }

    async fn create(&self, data: &NewRental) -> AppResult<Rental> {
        let row = Rental {
            id: Uuid::new_v4(),
            equipment_id: data.equipment_id,
            event_id: data.event_id,
            sector_id: data.sector_id,
            responsible_name: data.responsible_name.clone(),
            responsible_phone: data.responsible_phone.clone(),
            start_date: data.start_date,
            expected_return_date: data.expected_return_date,
            accessories: data.accessories,
            returned_accessories: AccessorySet::default(),
            status: RentalStatus::Active,
            returned_at: None,
            notes: data.notes.clone(),
            created_by: data.created_by,
            created_at: Utc::now(),
        };
        self.lock()?.rentals.insert(row.id, row.clone());
        Ok(row)
    }

    async fn record_return(&self, id: Uuid, update: &ReturnUpdate) -> AppResult<Rental> {
        let mut state = self.lock()?;
        let row = state.rentals.get_mut(&id).ok_or_else(|| not_found("Rental", id))?;
        if !row.status.is_open() || !update.matches(row) {
            return Err(stale_return(row));
        }
        row.status = update.status;
        row.returned_accessories = update.returned_accessories;
        row.returned_at = update.returned_at;
        Ok(row.clone())
    }

    async fn has_open_rental(&self, equipment_id: Uuid) -> AppResult<bool> {
        Ok(self
            .lock()?
            .rentals
            .values()
            .any(|r| r.equipment_id == equipment_id && r.status.is_open()))
    }
}

#[async_trait]
impl MerchandiseStore for InMemoryStore {
    async fn list(&self) -> AppResult<Vec<MerchandiseItem>> {
        let state = self.lock()?;
        let mut rows: Vec<MerchandiseItem> = state.merchandise.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<MerchandiseItem> {
        self.lock()?
            .merchandise
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Merchandise item", id))
    }

    async fn create(&self, data: &CreateMerchandise) -> AppResult<MerchandiseItem> {
        let row = MerchandiseItem {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            stock: data.stock,
            min_stock: data.min_stock,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.lock()?.merchandise.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, data: &UpdateMerchandise) -> AppResult<MerchandiseItem> {
        let mut state = self.lock()?;
        let row = state
            .merchandise
            .get_mut(&id)
            .ok_or_else(|| not_found("Merchandise item", id))?;
        if let Some(ref name) = data.name {
            row.name = name.clone();
        }
        if let Some(min) = data.min_stock {
            row.min_stock = min;
        }
        row.updated_at = Some(Utc::now());
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.lock()?;
        state
            .merchandise
            .remove(&id)
            .ok_or_else(|| not_found("Merchandise item", id))?;
        // Same effect as the ON DELETE CASCADE on deliveries
        let gone: Vec<(Uuid, Uuid)> = state
            .deliveries
            .keys()
            .filter(|(_, item)| *item == id)
            .copied()
            .collect();
        for (person, item) in gone {
            state.deliveries.remove(&(person, item));
            state.stamp_person(person, item, None);
        }
        Ok(())
    }

    async fn restock(&self, id: Uuid, quantity: i32) -> AppResult<MerchandiseItem> {
        let mut state = self.lock()?;
        let row = state
            .merchandise
            .get_mut(&id)
            .ok_or_else(|| not_found("Merchandise item", id))?;
        let stock = row
            .restocked(quantity)
            .ok_or_else(|| stock_limit_exceeded(row, quantity))?;
        row.stock = stock;
        row.updated_at = Some(Utc::now());
        Ok(row.clone())
    }

    async fn deliver(
        &self,
        person_id: Uuid,
        item_id: Uuid,
        operator_id: Uuid,
    ) -> AppResult<DateTime<Utc>> {
        let mut state = self.lock()?;

        if !state.people.contains_key(&person_id) {
            return Err(not_found("Enrolled person", person_id));
        }
        if state.deliveries.contains_key(&(person_id, item_id)) {
            return Err(AppError::AlreadyDelivered { person_id, item_id });
        }
        let item = state
            .merchandise
            .get_mut(&item_id)
            .ok_or_else(|| not_found("Merchandise item", item_id))?;
        if item.stock <= 0 {
            return Err(AppError::InsufficientStock(item_id));
        }

        let now = Utc::now();
        item.stock -= 1;
        item.updated_at = Some(now);
        state.deliveries.insert(
            (person_id, item_id),
            Delivery {
                person_id,
                item_id,
                operator_id,
                delivered_at: now,
            },
        );
        state.stamp_person(person_id, item_id, Some(now));
        Ok(now)
    }

    async fn undo_delivery(&self, person_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let mut state = self.lock()?;

        if state.deliveries.remove(&(person_id, item_id)).is_none() {
            return Err(AppError::NoDeliveryFound { person_id, item_id });
        }
        if let Some(item) = state.merchandise.get_mut(&item_id) {
            item.stock += 1;
            item.updated_at = Some(Utc::now());
        }
        state.stamp_person(person_id, item_id, None);
        Ok(())
    }

    async fn deliveries_for_item(&self, item_id: Uuid) -> AppResult<Vec<Delivery>> {
        let state = self.lock()?;
        let mut rows: Vec<Delivery> = state
            .deliveries
            .values()
            .filter(|d| d.item_id == item_id)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.delivered_at);
        Ok(rows)
    }
}

#[async_trait]
impl RosterStore for InMemoryStore {
    async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<EnrolledPerson>> {
        let state = self.lock()?;
        let mut rows: Vec<EnrolledPerson> = state
            .people
            .values()
            .filter(|p| p.matches(term))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<EnrolledPerson> {
        self.lock()?
            .people
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Enrolled person", id))
    }

    async fn create(&self, data: &NewEnrolledPerson) -> AppResult<EnrolledPerson> {
        let mut state = self.lock()?;
        if state.people.values().any(|p| p.tax_id == data.tax_id) {
            return Err(AppError::Conflict(format!(
                "Tax ID {} is already enrolled",
                data.tax_id
            )));
        }
        let row = new_person(data);
        state.people.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, data: &UpdateEnrolledPerson) -> AppResult<EnrolledPerson> {
        let mut state = self.lock()?;
        let row = state
            .people
            .get_mut(&id)
            .ok_or_else(|| not_found("Enrolled person", id))?;
        row.apply(data);
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.lock()?;
        state
            .people
            .remove(&id)
            .ok_or_else(|| not_found("Enrolled person", id))?;
        state.deliveries.retain(|(person, _), _| *person != id);
        Ok(())
    }

    async fn existing_tax_ids(&self, tax_ids: &[String]) -> AppResult<HashSet<String>> {
        let state = self.lock()?;
        let wanted: HashSet<&String> = tax_ids.iter().collect();
        Ok(state
            .people
            .values()
            .filter(|p| wanted.contains(&p.tax_id))
            .map(|p| p.tax_id.clone())
            .collect())
    }

    async fn insert_many(&self, records: &[NewEnrolledPerson]) -> AppResult<usize> {
        let mut state = self.lock()?;
        let mut known: HashSet<String> = state.people.values().map(|p| p.tax_id.clone()).collect();
        let mut inserted = 0;
        for r in records {
            if !known.insert(r.tax_id.clone()) {
                continue;
            }
            let row = new_person(r);
            state.people.insert(row.id, row);
            inserted += 1;
        }
        Ok(inserted)
    }
}

fn new_person(data: &NewEnrolledPerson) -> EnrolledPerson {
    EnrolledPerson {
        id: Uuid::new_v4(),
        name: data.name.clone(),
        tax_id: data.tax_id.clone(),
        email: data.email.clone(),
        phone: data.phone.clone(),
        enrollment_number: data.enrollment_number.clone(),
        created_at: Utc::now(),
        deliveries: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::accessories::Accessory;
    use chrono::Duration;

    async fn open_rental(store: &InMemoryStore) -> Rental {
        let now = Utc::now();
        RentalStore::create(
            store,
            &NewRental {
                equipment_id: Uuid::new_v4(),
                event_id: Uuid::new_v4(),
                sector_id: None,
                responsible_name: "Carla".to_string(),
                responsible_phone: None,
                start_date: now,
                expected_return_date: now + Duration::hours(4),
                accessories: AccessorySet::of(&[
                    Accessory::Antenna,
                    Accessory::Clip,
                    Accessory::Charger,
                ]),
                notes: None,
                created_by: Uuid::new_v4(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_planned_from_same_snapshot_do_not_overwrite() {
        let store = InMemoryStore::new();
        let snapshot = open_rental(&store).await;
        let now = Utc::now();

        let antenna = snapshot
            .plan_return(&AccessorySet::of(&[Accessory::Antenna]), now)
            .unwrap();
        let clip = snapshot
            .plan_return(&AccessorySet::of(&[Accessory::Clip]), now)
            .unwrap();

        let first = store.record_return(snapshot.id, &antenna).await.unwrap();
        assert_eq!(first.status, RentalStatus::Partial);

        let err = store.record_return(snapshot.id, &clip).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = RentalStore::get_by_id(&store, snapshot.id).await.unwrap();
        assert_eq!(
            stored.returned_accessories,
            AccessorySet::of(&[Accessory::Antenna])
        );
        assert_eq!(
            stored.missing_accessories(),
            vec![Accessory::Charger, Accessory::Clip]
        );
    }

    #[tokio::test]
    async fn test_return_on_closed_rental_is_business_rule() {
        let store = InMemoryStore::new();
        let snapshot = open_rental(&store).await;
        let all = snapshot.accessories;
        let done = snapshot.plan_return(&all, Utc::now()).unwrap();
        store.record_return(snapshot.id, &done).await.unwrap();

        let err = store.record_return(snapshot.id, &done).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_restock_past_limit_is_rejected_and_store_stays_usable() {
        let store = InMemoryStore::new();
        let item = MerchandiseStore::create(
            &store,
            &CreateMerchandise {
                name: "Cap".to_string(),
                stock: i32::MAX,
                min_stock: 0,
            },
        )
        .await
        .unwrap();

        let err = store.restock(item.id, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let unchanged = MerchandiseStore::get_by_id(&store, item.id).await.unwrap();
        assert_eq!(unchanged.stock, i32::MAX);
    }
}
