//! Event model (the operational period that scopes rentals)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Event record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create event request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_event_dates"))]
pub struct CreateEvent {
    #[validate(length(min = 1, message = "Event name is required"))]
    pub name: String,
    /// Start date (YYYY-MM-DD)
    pub start_date: NaiveDate,
    /// End date (YYYY-MM-DD)
    pub end_date: NaiveDate,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn validate_event_dates(data: &CreateEvent) -> Result<(), ValidationError> {
    if data.end_date < data.start_date {
        return Err(ValidationError::new("end_date_before_start_date"));
    }
    Ok(())
}

/// Update event request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub active: Option<bool>,
}

impl Event {
    pub fn apply(&mut self, data: &UpdateEvent, now: DateTime<Utc>) {
        if let Some(ref v) = data.name {
            self.name = v.clone();
        }
        if let Some(v) = data.start_date {
            self.start_date = v;
        }
        if let Some(v) = data.end_date {
            self.end_date = v;
        }
        if let Some(v) = data.active {
            self.active = v;
        }
        self.updated_at = Some(now);
    }
}

/// Pick the current event: the active one that started most recently.
pub fn current_event(events: &[Event]) -> Option<&Event> {
    events
        .iter()
        .filter(|e| e.active)
        .max_by_key(|e| (e.start_date, e.created_at))
}
