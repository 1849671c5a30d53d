//! Merchandise stock and delivery ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::MerchandiseStore;
use crate::{
    error::{AppError, AppResult},
    models::merchandise::{
        CreateMerchandise, Delivery, MerchandiseItem, UpdateMerchandise, MAX_STOCK,
    },
};

#[derive(Clone)]
pub struct MerchandiseRepository {
    pool: Pool<Postgres>,
}

impl MerchandiseRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn item_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Merchandise item {} not found", id))
}

pub(crate) fn stock_limit_exceeded(item: &MerchandiseItem, quantity: i32) -> AppError {
    AppError::Validation(format!(
        "Restocking {} by {} would exceed the limit of {} units (stock is {})",
        item.name, quantity, MAX_STOCK, item.stock
    ))
}

#[async_trait]
impl MerchandiseStore for MerchandiseRepository {
    async fn list(&self) -> AppResult<Vec<MerchandiseItem>> {
        let rows = sqlx::query_as::<_, MerchandiseItem>("SELECT * FROM merchandise ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<MerchandiseItem> {
        sqlx::query_as::<_, MerchandiseItem>("SELECT * FROM merchandise WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| item_not_found(id))
    }

    async fn create(&self, data: &CreateMerchandise) -> AppResult<MerchandiseItem> {
        let row = sqlx::query_as::<_, MerchandiseItem>(
            r#"
            INSERT INTO merchandise (id, name, stock, min_stock)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(data.stock)
        .bind(data.min_stock)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, data: &UpdateMerchandise) -> AppResult<MerchandiseItem> {
        sqlx::query_as::<_, MerchandiseItem>(
            r#"
            UPDATE merchandise SET
                name = COALESCE($2, name),
                min_stock = COALESCE($3, min_stock),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.min_stock)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| item_not_found(id))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM merchandise WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(item_not_found(id));
        }
        Ok(())
    }

    async fn restock(&self, id: Uuid, quantity: i32) -> AppResult<MerchandiseItem> {
        // Written as `stock <= MAX - quantity` so the bound check itself cannot overflow
        let row = sqlx::query_as::<_, MerchandiseItem>(
            r#"
            UPDATE merchandise SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock <= $3 - $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(MAX_STOCK)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(item) => Ok(item),
            None => {
                let item = self.get_by_id(id).await?;
                Err(stock_limit_exceeded(&item, quantity))
            }
        }
    }

    async fn deliver(
        &self,
        person_id: Uuid,
        item_id: Uuid,
        operator_id: Uuid,
    ) -> AppResult<DateTime<Utc>> {
        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;

        let person_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM enrolled_people WHERE id = $1)")
                .bind(person_id)
                .fetch_one(&mut *tx)
                .await?;
        if !person_exists {
            return Err(AppError::NotFound(format!("Enrolled person {} not found", person_id)));
        }

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM deliveries WHERE person_id = $1 AND item_id = $2)",
        )
        .bind(person_id)
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Err(AppError::AlreadyDelivered { person_id, item_id });
        }

        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE merchandise SET stock = stock - 1, updated_at = NOW()
            WHERE id = $1 AND stock > 0
            RETURNING stock
            "#,
        )
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;

        if remaining.is_none() {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM merchandise WHERE id = $1)")
                    .bind(item_id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists {
                AppError::InsufficientStock(item_id)
            } else {
                item_not_found(item_id)
            });
        }

        let delivered_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO deliveries (person_id, item_id, operator_id)
            VALUES ($1, $2, $3)
            RETURNING delivered_at
            "#,
        )
        .bind(person_id)
        .bind(item_id)
        .bind(operator_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            // Lost a race against a concurrent delivery of the same pair
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::AlreadyDelivered { person_id, item_id }
            }
            other => AppError::Database(other),
        })?;

        tx.commit().await?;
        Ok(delivered_at)
    }

    async fn undo_delivery(&self, person_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM deliveries WHERE person_id = $1 AND item_id = $2")
            .bind(person_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NoDeliveryFound { person_id, item_id });
        }

        sqlx::query("UPDATE merchandise SET stock = stock + 1, updated_at = NOW() WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn deliveries_for_item(&self, item_id: Uuid) -> AppResult<Vec<Delivery>> {
        let rows = sqlx::query_as::<_, Delivery>(
            "SELECT * FROM deliveries WHERE item_id = $1 ORDER BY delivered_at",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
