//! Aggregated views for event reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::rental::DisplayStatus;

/// Rental counts for one sector, by displayed status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SectorSummary {
    /// `None` groups rentals with no sector
    pub sector_id: Option<Uuid>,
    pub sector_name: String,
    pub active: u32,
    pub overdue: u32,
    pub partial: u32,
    pub completed: u32,
}

impl SectorSummary {
    pub fn count(&mut self, status: DisplayStatus) {
        match status {
            DisplayStatus::Active => self.active += 1,
            DisplayStatus::Overdue => self.overdue += 1,
            DisplayStatus::Partial => self.partial += 1,
            DisplayStatus::Completed => self.completed += 1,
            DisplayStatus::Maintenance => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.active + self.overdue + self.partial + self.completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventSummary {
    pub event_id: Uuid,
    pub event_name: String,
    pub sectors: Vec<SectorSummary>,
}

/// Rentals still out past their expected return date
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OverdueCount {
    pub overdue: usize,
    pub as_of: DateTime<Utc>,
}
