//! Rental lifecycle service

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        operator::Operator,
        rental::{CreateRental, DisplayStatus, RentalQuery, RentalView, ReturnRental},
    },
    repository::{NewRental, RentalFilter, Repository},
};

/// Tries of a return before a concurrent-update conflict is surfaced
const RETURN_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct RentalsService {
    repository: Repository,
}

impl RentalsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List rentals, classifying overdue ones against `now`
    pub async fn list(&self, query: &RentalQuery, now: DateTime<Utc>) -> AppResult<Vec<RentalView>> {
        let filter = RentalFilter {
            event_id: query.event_id,
            sector_id: query.sector_id,
            open_only: query.open_only.unwrap_or(false),
        };
        let rentals = self.repository.rentals.list(&filter).await?;

        Ok(rentals
            .into_iter()
            .map(|r| RentalView::new(r, now))
            .filter(|v| query.status.map_or(true, |s| v.display_status == s))
            .collect())
    }

    pub async fn get(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<RentalView> {
        let rental = self.repository.rentals.get_by_id(id).await?;
        Ok(RentalView::new(rental, now))
    }

    /// Check equipment out; the new rental starts `Active`
    pub async fn create(
        &self,
        data: CreateRental,
        operator: &Operator,
        now: DateTime<Utc>,
    ) -> AppResult<RentalView> {
        data.validate()?;

        let start_date = data.start_date.unwrap_or(now);
        if data.expected_return_date <= start_date {
            return Err(AppError::Validation(
                "Expected return date must be after the start date".to_string(),
            ));
        }

        let equipment = self.repository.equipment.get_by_id(data.equipment_id).await?;
        self.repository.events.get_by_id(data.event_id).await?;
        if let Some(sector_id) = data.sector_id {
            self.repository.sectors.get_by_id(sector_id).await?;
        }

        if self.repository.rentals.has_open_rental(equipment.id).await? {
            return Err(AppError::Conflict(format!(
                "Equipment {} is already rented out",
                equipment.tag
            )));
        }

        let rental = self
            .repository
            .rentals
            .create(&NewRental {
                equipment_id: equipment.id,
                event_id: data.event_id,
                sector_id: data.sector_id,
                responsible_name: data.responsible_name.trim().to_string(),
                responsible_phone: data.responsible_phone,
                start_date,
                expected_return_date: data.expected_return_date,
                accessories: data.accessories,
                notes: data.notes,
                created_by: operator.id,
            })
            .await?;

        tracing::info!(
            "Rental {} created for equipment {} by operator {}",
            rental.id,
            equipment.tag,
            operator.id
        );
        Ok(RentalView::new(rental, now))
    }

    /// Record a (possibly partial) return.
    ///
    /// The confirmed accessories are merged with any earlier partial return;
    /// status, returned set and return date are persisted in one write. A
    /// write that loses the race to another return is re-planned against
    /// the fresh rental.
    pub async fn return_rental(
        &self,
        id: Uuid,
        data: ReturnRental,
        now: DateTime<Utc>,
    ) -> AppResult<RentalView> {
        let mut attempt = 1;
        let updated = loop {
            let rental = self.repository.rentals.get_by_id(id).await?;

            let update = rental.plan_return(&data.returned_accessories, now).ok_or_else(|| {
                AppError::BusinessRule(format!("Rental {} is already {:?}", id, rental.status))
            })?;

            match self.repository.rentals.record_return(id, &update).await {
                Err(AppError::Conflict(msg)) if attempt < RETURN_ATTEMPTS => {
                    tracing::debug!("Retrying return of rental {}: {}", id, msg);
                    attempt += 1;
                }
                result => break result?,
            }
        };

        let view = RentalView::new(updated, now);

        if view.missing_accessories.is_empty() {
            tracing::info!("Rental {} completed", id);
        } else {
            tracing::info!(
                "Rental {} partially returned, missing: {:?}",
                id,
                view.missing_accessories
            );
        }
        Ok(view)
    }

    /// Count rentals currently shown as overdue
    pub async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let filter = RentalFilter {
            open_only: true,
            ..Default::default()
        };
        let rentals = self.repository.rentals.list(&filter).await?;
        Ok(rentals
            .iter()
            .filter(|r| r.display_status(now) == DisplayStatus::Overdue)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        accessories::{Accessory, AccessorySet},
        equipment::{CreateEquipment, EquipmentKind},
        event::CreateEvent,
        operator::Role,
        rental::RentalStatus,
    };
    use crate::repository::MockRentalStore;
    use chrono::Duration;
    use std::sync::Arc;

    fn operator() -> Operator {
        Operator {
            id: Uuid::new_v4(),
            email: None,
            role: Role::Operator,
        }
    }

    async fn setup() -> (RentalsService, Repository, CreateRental) {
        let repo = Repository::in_memory();
        let equipment = repo
            .equipment
            .create(&CreateEquipment {
                tag: "RD-001".to_string(),
                kind: EquipmentKind::Radio,
                brand: Some("Motorola".to_string()),
                model: None,
                category: None,
                notes: None,
            })
            .await
            .unwrap();
        let event = repo
            .events
            .create(&CreateEvent {
                name: "Trail 2026".to_string(),
                start_date: "2026-10-16".parse().unwrap(),
                end_date: "2026-10-18".parse().unwrap(),
                active: true,
            })
            .await
            .unwrap();

        let request = CreateRental {
            equipment_id: equipment.id,
            event_id: event.id,
            sector_id: None,
            responsible_name: "Carla".to_string(),
            responsible_phone: Some("5511988887777".to_string()),
            start_date: None,
            expected_return_date: Utc::now() + Duration::hours(6),
            accessories: AccessorySet::of(&[Accessory::Antenna, Accessory::Clip]),
            notes: None,
        };
        (RentalsService::new(repo.clone()), repo, request)
    }

    #[tokio::test]
    async fn test_create_starts_active_and_blocks_second_checkout() {
        let (service, _, request) = setup().await;
        let view = service.create(request.clone(), &operator(), Utc::now()).await.unwrap();
        assert_eq!(view.rental.status, RentalStatus::Active);
        assert_eq!(view.display_status, DisplayStatus::Active);

        let err = service.create(request, &operator(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_return_before_start() {
        let (service, _, mut request) = setup().await;
        request.expected_return_date = Utc::now() - Duration::hours(1);
        let err = service.create(request, &operator(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_full_return_completes() {
        let (service, _, request) = setup().await;
        let created = service.create(request, &operator(), Utc::now()).await.unwrap();

        let returned = service
            .return_rental(
                created.rental.id,
                ReturnRental {
                    returned_accessories: AccessorySet::of(&[Accessory::Antenna, Accessory::Clip]),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(returned.rental.status, RentalStatus::Completed);
        assert!(returned.rental.returned_at.is_some());
        assert!(returned.missing_accessories.is_empty());
    }

    #[tokio::test]
    async fn test_partial_return_then_completion_then_terminal() {
        let (service, _, request) = setup().await;
        let id = service.create(request, &operator(), Utc::now()).await.unwrap().rental.id;

        let partial = service
            .return_rental(
                id,
                ReturnRental {
                    returned_accessories: AccessorySet::of(&[Accessory::Antenna]),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(partial.rental.status, RentalStatus::Partial);
        assert_eq!(partial.missing_accessories, vec![Accessory::Clip]);
        assert!(partial.rental.returned_at.is_none());

        let done = service
            .return_rental(
                id,
                ReturnRental {
                    returned_accessories: AccessorySet::of(&[Accessory::Clip]),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(done.rental.status, RentalStatus::Completed);

        let err = service
            .return_rental(id, ReturnRental::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_overdue_filter_uses_display_status() {
        let (service, _, request) = setup().await;
        let expected = request.expected_return_date;
        service.create(request, &operator(), Utc::now()).await.unwrap();

        let later = expected + Duration::minutes(1);
        let query = RentalQuery {
            status: Some(DisplayStatus::Overdue),
            ..Default::default()
        };
        assert_eq!(service.list(&query, later).await.unwrap().len(), 1);
        assert_eq!(service.list(&query, Utc::now()).await.unwrap().len(), 0);
        assert_eq!(service.count_overdue(later).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_return_write_is_surfaced() {
        let (service, mut repo, request) = setup().await;
        let created = service.create(request, &operator(), Utc::now()).await.unwrap();
        let rental = created.rental.clone();

        let mut mock = MockRentalStore::new();
        mock.expect_get_by_id()
            .returning(move |_| Ok(rental.clone()));
        mock.expect_record_return()
            .times(1)
            .returning(|_, _| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        repo.rentals = Arc::new(mock);

        let err = RentalsService::new(repo)
            .return_rental(created.rental.id, ReturnRental::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_return_replans_after_concurrent_return() {
        let (service, mut repo, request) = setup().await;
        let created = service.create(request, &operator(), Utc::now()).await.unwrap();
        let snapshot = created.rental.clone();
        let mut stored = snapshot.clone();
        stored.status = RentalStatus::Partial;
        stored.returned_accessories = AccessorySet::of(&[Accessory::Antenna]);

        // First read is stale: another desk returned the antenna meanwhile
        let mut reads = vec![stored.clone(), snapshot];
        let mut mock = MockRentalStore::new();
        mock.expect_get_by_id()
            .times(2)
            .returning(move |_| Ok(reads.pop().unwrap()));
        mock.expect_record_return()
            .times(2)
            .returning(move |_, update| {
                if !update.matches(&stored) {
                    return Err(AppError::Conflict("changed".to_string()));
                }
                let mut r = stored.clone();
                r.status = update.status;
                r.returned_accessories = update.returned_accessories;
                r.returned_at = update.returned_at;
                Ok(r)
            });
        repo.rentals = Arc::new(mock);

        let done = RentalsService::new(repo)
            .return_rental(
                created.rental.id,
                ReturnRental {
                    returned_accessories: AccessorySet::of(&[Accessory::Clip]),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(done.rental.status, RentalStatus::Completed);
        assert_eq!(
            done.rental.returned_accessories,
            AccessorySet::of(&[Accessory::Antenna, Accessory::Clip])
        );
    }

    #[tokio::test]
    async fn test_return_conflict_surfaces_after_retries() {
        let (service, mut repo, request) = setup().await;
        let created = service.create(request, &operator(), Utc::now()).await.unwrap();
        let rental = created.rental.clone();

        let mut mock = MockRentalStore::new();
        mock.expect_get_by_id()
            .times(RETURN_ATTEMPTS)
            .returning(move |_| Ok(rental.clone()));
        mock.expect_record_return()
            .times(RETURN_ATTEMPTS)
            .returning(|_, _| Err(AppError::Conflict("changed".to_string())));
        repo.rentals = Arc::new(mock);

        let err = RentalsService::new(repo)
            .return_rental(created.rental.id, ReturnRental::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
