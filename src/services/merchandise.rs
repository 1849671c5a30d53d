//! Merchandise catalog and delivery ledger service

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        merchandise::{
            CreateMerchandise, Delivery, DeliveryReceipt, MerchandiseItem, Restock,
            UpdateMerchandise,
        },
        operator::Operator,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct MerchandiseService {
    repository: Repository,
}

impl MerchandiseService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<MerchandiseItem>> {
        self.repository.merchandise.list().await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<MerchandiseItem> {
        self.repository.merchandise.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateMerchandise) -> AppResult<MerchandiseItem> {
        data.validate()?;
        let item = self.repository.merchandise.create(data).await?;
        tracing::info!("Merchandise item {} created with stock {}", item.id, item.stock);
        Ok(item)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateMerchandise) -> AppResult<MerchandiseItem> {
        data.validate()?;
        self.repository.merchandise.update(id, data).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.merchandise.delete(id).await?;
        tracing::info!("Merchandise item {} deleted", id);
        Ok(())
    }

    pub async fn restock(&self, id: Uuid, data: &Restock) -> AppResult<MerchandiseItem> {
        data.validate()?;
        let item = self.repository.merchandise.restock(id, data.quantity).await?;
        tracing::info!("Merchandise item {} restocked by {}, now {}", id, data.quantity, item.stock);
        Ok(item)
    }

    /// Hand one unit of `item_id` to `person_id`.
    ///
    /// Both preconditions (stock left, no earlier delivery) are checked by
    /// the store inside the same atomic write that decrements stock.
    pub async fn deliver(
        &self,
        person_id: Uuid,
        item_id: Uuid,
        operator: &Operator,
    ) -> AppResult<DeliveryReceipt> {
        match self
            .repository
            .merchandise
            .deliver(person_id, item_id, operator.id)
            .await
        {
            Ok(delivered_at) => {
                tracing::info!(
                    "Item {} delivered to {} by operator {}",
                    item_id,
                    person_id,
                    operator.id
                );
                Ok(DeliveryReceipt {
                    person_id,
                    item_id,
                    delivered_at,
                })
            }
            Err(e) => {
                if matches!(
                    e,
                    AppError::InsufficientStock(_) | AppError::AlreadyDelivered { .. }
                ) {
                    tracing::warn!("Delivery of {} to {} refused: {}", item_id, person_id, e);
                }
                Err(e)
            }
        }
    }

    /// Reverse a delivery and return the unit to stock
    pub async fn undo_delivery(&self, person_id: Uuid, item_id: Uuid, operator: &Operator) -> AppResult<()> {
        if let Err(e) = self.repository.merchandise.undo_delivery(person_id, item_id).await {
            if matches!(e, AppError::NoDeliveryFound { .. }) {
                tracing::warn!("Undo of {} for {} refused: {}", item_id, person_id, e);
            }
            return Err(e);
        }
        tracing::info!(
            "Delivery of {} to {} undone by operator {}",
            item_id,
            person_id,
            operator.id
        );
        Ok(())
    }

    pub async fn deliveries(&self, item_id: Uuid) -> AppResult<Vec<Delivery>> {
        self.repository.merchandise.get_by_id(item_id).await?;
        self.repository.merchandise.deliveries_for_item(item_id).await
    }

    /// Timestamp of the delivery of `item_id` to `person_id`, if any
    pub async fn delivered_at(&self, person_id: Uuid, item_id: Uuid) -> AppResult<Option<DateTime<Utc>>> {
        self.repository.merchandise.get_by_id(item_id).await?;
        let person = self.repository.roster.get_by_id(person_id).await?;
        Ok(person.deliveries.get(&item_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{enrollee::NewEnrolledPerson, merchandise::MAX_STOCK, operator::Role};
    use crate::repository::MockMerchandiseStore;
    use std::sync::Arc;

    fn operator() -> Operator {
        Operator {
            id: Uuid::new_v4(),
            email: None,
            role: Role::Operator,
        }
    }

    async fn person(repo: &Repository, name: &str, tax_id: &str) -> Uuid {
        repo.roster
            .create(&NewEnrolledPerson {
                name: name.to_string(),
                tax_id: tax_id.to_string(),
                email: None,
                phone: None,
                enrollment_number: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn item(service: &MerchandiseService, stock: i32) -> Uuid {
        service
            .create(&CreateMerchandise {
                name: "Pin".to_string(),
                stock,
                min_stock: 0,
            })
            .await
            .unwrap()
            .id
    }

    /// stock + deliveries must equal what was put in
    async fn assert_ledger_balanced(service: &MerchandiseService, item_id: Uuid, initial: i32) {
        let stock = service.get_by_id(item_id).await.unwrap().stock;
        let delivered = service.deliveries(item_id).await.unwrap().len() as i32;
        assert_eq!(stock + delivered, initial);
        assert!(stock >= 0 && stock <= initial);
    }

    #[tokio::test]
    async fn test_last_unit_scenario() {
        let repo = Repository::in_memory();
        let service = MerchandiseService::new(repo.clone());
        let ana = person(&repo, "Ana", "111").await;
        let bruno = person(&repo, "Bruno", "222").await;
        let patch = item(&service, 1).await;

        let receipt = service.deliver(ana, patch, &operator()).await.unwrap();
        assert_eq!(service.get_by_id(patch).await.unwrap().stock, 0);
        assert_eq!(
            service.delivered_at(ana, patch).await.unwrap(),
            Some(receipt.delivered_at)
        );

        let err = service.deliver(bruno, patch, &operator()).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(id) if id == patch));
        assert_eq!(service.get_by_id(patch).await.unwrap().stock, 0);

        service.undo_delivery(ana, patch, &operator()).await.unwrap();
        assert_eq!(service.get_by_id(patch).await.unwrap().stock, 1);
        assert_eq!(service.delivered_at(ana, patch).await.unwrap(), None);
        assert_ledger_balanced(&service, patch, 1).await;
    }

    #[tokio::test]
    async fn test_second_delivery_to_same_person_is_refused() {
        let repo = Repository::in_memory();
        let service = MerchandiseService::new(repo.clone());
        let ana = person(&repo, "Ana", "111").await;
        let pin = item(&service, 5).await;

        service.deliver(ana, pin, &operator()).await.unwrap();
        let err = service.deliver(ana, pin, &operator()).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyDelivered { .. }));
        assert_eq!(service.get_by_id(pin).await.unwrap().stock, 4);
        assert_ledger_balanced(&service, pin, 5).await;
    }

    #[tokio::test]
    async fn test_undo_without_delivery_is_refused() {
        let repo = Repository::in_memory();
        let service = MerchandiseService::new(repo.clone());
        let ana = person(&repo, "Ana", "111").await;
        let pin = item(&service, 2).await;

        let err = service.undo_delivery(ana, pin, &operator()).await.unwrap_err();
        assert!(matches!(err, AppError::NoDeliveryFound { .. }));
        assert_eq!(service.get_by_id(pin).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_unknown_person_or_item() {
        let repo = Repository::in_memory();
        let service = MerchandiseService::new(repo.clone());
        let ana = person(&repo, "Ana", "111").await;
        let pin = item(&service, 2).await;

        let err = service.deliver(Uuid::new_v4(), pin, &operator()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = service.deliver(ana, Uuid::new_v4(), &operator()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_ledger_balanced(&service, pin, 2).await;
    }

    #[tokio::test]
    async fn test_ledger_stays_balanced_over_mixed_sequence() {
        let repo = Repository::in_memory();
        let service = MerchandiseService::new(repo.clone());
        let initial = 3;
        let pin = item(&service, initial).await;
        let mut people = Vec::new();
        for i in 0..5 {
            people.push(person(&repo, &format!("P{}", i), &format!("{}", 1000 + i)).await);
        }

        // (person index, deliver?) including operations that must be rejected
        let steps = [
            (0, true),
            (0, true),
            (1, true),
            (2, true),
            (3, true),
            (4, false),
            (1, false),
            (1, false),
            (3, true),
            (0, false),
            (4, true),
            (2, false),
        ];

        let mut ok_delivers = 0;
        let mut ok_undos = 0;
        for (idx, deliver) in steps {
            let p = people[idx];
            if deliver {
                if service.deliver(p, pin, &operator()).await.is_ok() {
                    ok_delivers += 1;
                }
            } else if service.undo_delivery(p, pin, &operator()).await.is_ok() {
                ok_undos += 1;
            }
            let stock = service.get_by_id(pin).await.unwrap().stock;
            assert_eq!(stock, initial - ok_delivers + ok_undos);
            assert_ledger_balanced(&service, pin, initial).await;
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_is_passed_through() {
        let mut repo = Repository::in_memory();
        let mut mock = MockMerchandiseStore::new();
        mock.expect_deliver()
            .times(1)
            .returning(|_, _, _| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        mock.expect_undo_delivery().never();
        repo.merchandise = Arc::new(mock);

        let service = MerchandiseService::new(repo);
        let err = service
            .deliver(Uuid::new_v4(), Uuid::new_v4(), &operator())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(sqlx::Error::PoolTimedOut)));
    }

    #[tokio::test]
    async fn test_restock_beyond_limit_leaves_item_usable() {
        let repo = Repository::in_memory();
        let service = MerchandiseService::new(repo.clone());
        let ana = person(&repo, "Ana", "111").await;
        let cap = item(&service, MAX_STOCK).await;

        let err = service.restock(cap, &Restock { quantity: i32::MAX }).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = service.restock(cap, &Restock { quantity: 1 }).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(service.get_by_id(cap).await.unwrap().stock, MAX_STOCK);

        service.deliver(ana, cap, &operator()).await.unwrap();
        let item = service.restock(cap, &Restock { quantity: 1 }).await.unwrap();
        assert_eq!(item.stock, MAX_STOCK);
    }
}
