//! Rentals repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{NewRental, RentalFilter, RentalStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        accessories::AccessorySet,
        rental::{Rental, RentalStatus, ReturnUpdate},
    },
};

/// Row shape: accessory sets are stored as JSONB
#[derive(FromRow)]
struct RentalRow {
    id: Uuid,
    equipment_id: Uuid,
    event_id: Uuid,
    sector_id: Option<Uuid>,
    responsible_name: String,
    responsible_phone: Option<String>,
    start_date: DateTime<Utc>,
    expected_return_date: DateTime<Utc>,
    accessories: Json<AccessorySet>,
    returned_accessories: Json<AccessorySet>,
    status: RentalStatus,
    returned_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<RentalRow> for Rental {
    fn from(r: RentalRow) -> Self {
        Rental {
            id: r.id,
            equipment_id: r.equipment_id,
            event_id: r.event_id,
            sector_id: r.sector_id,
            responsible_name: r.responsible_name,
            responsible_phone: r.responsible_phone,
            start_date: r.start_date,
            expected_return_date: r.expected_return_date,
            accessories: r.accessories.0,
            returned_accessories: r.returned_accessories.0,
            status: r.status,
            returned_at: r.returned_at,
            notes: r.notes,
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}

#[derive(Clone)]
pub struct RentalsRepository {
    pool: Pool<Postgres>,
}

impl RentalsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RentalStore for RentalsRepository {
    async fn list(&self, filter: &RentalFilter) -> AppResult<Vec<Rental>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM rentals WHERE TRUE");
        if let Some(event_id) = filter.event_id {
            qb.push(" AND event_id = ").push_bind(event_id);
        }
        if let Some(sector_id) = filter.sector_id {
            qb.push(" AND sector_id = ").push_bind(sector_id);
        }
        if filter.open_only {
            qb.push(" AND status IN ('active', 'partial')");
        }
        qb.push(" ORDER BY start_date DESC");

        let rows = qb
            .build_query_as::<RentalRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Rental::from).collect())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Rental> {
        sqlx::query_as::<_, RentalRow>("SELECT * FROM rentals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Rental::from)
            .ok_or_else(|| AppError::NotFound(format!("Rental {} not found", id)))
    }

    async fn create(&self, data: &NewRental) -> AppResult<Rental> {
        let row = sqlx::query_as::<_, RentalRow>(
            r#"
            INSERT INTO rentals (
                id, equipment_id, event_id, sector_id, responsible_name, responsible_phone,
                start_date, expected_return_date, accessories, returned_accessories,
                status, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'active', $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.equipment_id)
        .bind(data.event_id)
        .bind(data.sector_id)
        .bind(&data.responsible_name)
        .bind(&data.responsible_phone)
        .bind(data.start_date)
        .bind(data.expected_return_date)
        .bind(Json(data.accessories))
        .bind(Json(AccessorySet::default()))
        .bind(&data.notes)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn record_return(&self, id: Uuid, update: &ReturnUpdate) -> AppResult<Rental> {
        let row = sqlx::query_as::<_, RentalRow>(
            r#"
            UPDATE rentals
            SET status = $2, returned_accessories = $3, returned_at = $4
            WHERE id = $1
              AND status IN ('active', 'partial')
              AND status = $5
              AND returned_accessories = $6
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.status)
        .bind(Json(update.returned_accessories))
        .bind(update.returned_at)
        .bind(update.expected_status)
        .bind(Json(update.expected_returned))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => {
                // Missing, closed, or changed by a concurrent return
                let rental = self.get_by_id(id).await?;
                Err(stale_return(&rental))
            }
        }
    }

    async fn has_open_rental(&self, equipment_id: Uuid) -> AppResult<bool> {
        let open: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM rentals WHERE equipment_id = $1 AND status IN ('active', 'partial'))",
        )
        .bind(equipment_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(open)
    }
}

/// Error for a return whose snapshot no longer matches the stored rental
pub(crate) fn stale_return(rental: &Rental) -> AppError {
    if rental.status.is_open() {
        AppError::Conflict(format!(
            "Rental {} was changed by another return",
            rental.id
        ))
    } else {
        AppError::BusinessRule(format!(
            "Rental {} is already {:?}",
            rental.id, rental.status
        ))
    }
}
