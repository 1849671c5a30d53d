//! Enrolled-people roster repository

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use super::RosterStore;
use crate::{
    error::{AppError, AppResult},
    models::enrollee::{
        looks_like_tax_id, normalize_tax_id, EnrolledPerson, NewEnrolledPerson,
        UpdateEnrolledPerson,
    },
};

#[derive(FromRow)]
struct PersonRow {
    id: Uuid,
    name: String,
    tax_id: String,
    email: Option<String>,
    phone: Option<String>,
    enrollment_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PersonRow> for EnrolledPerson {
    fn from(r: PersonRow) -> Self {
        EnrolledPerson {
            id: r.id,
            name: r.name,
            tax_id: r.tax_id,
            email: r.email,
            phone: r.phone,
            enrollment_number: r.enrollment_number,
            created_at: r.created_at,
            deliveries: BTreeMap::new(),
        }
    }
}

#[derive(FromRow)]
struct DeliveryStamp {
    person_id: Uuid,
    item_id: Uuid,
    delivered_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RosterRepository {
    pool: Pool<Postgres>,
}

impl RosterRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Attach delivery timestamps to a page of people
    async fn with_deliveries(&self, rows: Vec<PersonRow>) -> AppResult<Vec<EnrolledPerson>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let stamps = sqlx::query_as::<_, DeliveryStamp>(
            "SELECT person_id, item_id, delivered_at FROM deliveries WHERE person_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_person: HashMap<Uuid, BTreeMap<Uuid, DateTime<Utc>>> = HashMap::new();
        for s in stamps {
            by_person
                .entry(s.person_id)
                .or_default()
                .insert(s.item_id, s.delivered_at);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut person = EnrolledPerson::from(row);
                person.deliveries = by_person.remove(&person.id).unwrap_or_default();
                person
            })
            .collect())
    }
}

fn person_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Enrolled person {} not found", id))
}

#[async_trait]
impl RosterStore for RosterRepository {
    async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<EnrolledPerson>> {
        let term = term.trim();
        let digits = if looks_like_tax_id(term) {
            normalize_tax_id(term)
        } else {
            String::new()
        };

        let rows = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, name, tax_id, email, phone, enrollment_number, created_at
            FROM enrolled_people
            WHERE $1 = ''
               OR unaccent(name) ILIKE unaccent('%' || $1 || '%')
               OR ($2 <> '' AND tax_id LIKE '%' || $2 || '%')
               OR enrollment_number = $1
            ORDER BY name
            LIMIT $3
            "#,
        )
        .bind(term)
        .bind(&digits)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.with_deliveries(rows).await
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<EnrolledPerson> {
        let row = sqlx::query_as::<_, PersonRow>(
            "SELECT id, name, tax_id, email, phone, enrollment_number, created_at FROM enrolled_people WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| person_not_found(id))?;

        let mut people = self.with_deliveries(vec![row]).await?;
        people.pop().ok_or_else(|| person_not_found(id))
    }

    async fn create(&self, data: &NewEnrolledPerson) -> AppResult<EnrolledPerson> {
        let row = sqlx::query_as::<_, PersonRow>(
            r#"
            INSERT INTO enrolled_people (id, name, tax_id, email, phone, enrollment_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, tax_id, email, phone, enrollment_number, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.tax_id)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.enrollment_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Tax ID {} is already enrolled", data.tax_id))
            }
            other => AppError::Database(other),
        })?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, data: &UpdateEnrolledPerson) -> AppResult<EnrolledPerson> {
        sqlx::query(
            r#"
            UPDATE enrolled_people SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                enrollment_number = COALESCE($5, enrollment_number)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.enrollment_number)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM enrolled_people WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(person_not_found(id));
        }
        Ok(())
    }

    async fn existing_tax_ids(&self, tax_ids: &[String]) -> AppResult<HashSet<String>> {
        let found: Vec<String> =
            sqlx::query_scalar("SELECT tax_id FROM enrolled_people WHERE tax_id = ANY($1)")
                .bind(tax_ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(found.into_iter().collect())
    }

    async fn insert_many(&self, records: &[NewEnrolledPerson]) -> AppResult<usize> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;

        for r in records {
            let result = sqlx::query(
                r#"
                INSERT INTO enrolled_people (id, name, tax_id, email, phone, enrollment_number)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (tax_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&r.name)
            .bind(&r.tax_id)
            .bind(&r.email)
            .bind(&r.phone)
            .bind(&r.enrollment_number)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
