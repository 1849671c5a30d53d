//! Sectors repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::SectorStore;
use crate::{
    error::{AppError, AppResult},
    models::sector::{CreateSector, Sector, UpdateSector},
};

#[derive(Clone)]
pub struct SectorsRepository {
    pool: Pool<Postgres>,
}

impl SectorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SectorStore for SectorsRepository {
    async fn list(&self) -> AppResult<Vec<Sector>> {
        let rows = sqlx::query_as::<_, Sector>("SELECT * FROM sectors ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Sector> {
        sqlx::query_as::<_, Sector>("SELECT * FROM sectors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sector {} not found", id)))
    }

    async fn create(&self, data: &CreateSector) -> AppResult<Sector> {
        let row = sqlx::query_as::<_, Sector>(
            r#"
            INSERT INTO sectors (id, name, coordinator_name, coordinator_phone)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.coordinator_name)
        .bind(&data.coordinator_phone)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, data: &UpdateSector) -> AppResult<Sector> {
        sqlx::query_as::<_, Sector>(
            r#"
            UPDATE sectors SET
                name = COALESCE($2, name),
                coordinator_name = COALESCE($3, coordinator_name),
                coordinator_phone = COALESCE($4, coordinator_phone)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.coordinator_name)
        .bind(&data.coordinator_phone)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sector {} not found", id)))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sectors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Sector {} not found", id)));
        }
        Ok(())
    }
}
