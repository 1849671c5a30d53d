//! Event reporting

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        merchandise::MerchandiseItem,
        report::{EventSummary, SectorSummary},
    },
    repository::{RentalFilter, Repository},
};

const UNASSIGNED: &str = "Unassigned";

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Rental counts per sector for one event, overdue evaluated at `now`.
    /// Sectors without rentals are omitted; rentals with no sector land in an
    /// "Unassigned" bucket at the end.
    pub async fn event_summary(&self, event_id: Uuid, now: DateTime<Utc>) -> AppResult<EventSummary> {
        let event = self.repository.events.get_by_id(event_id).await?;
        let sectors: HashMap<Uuid, String> = self
            .repository
            .sectors
            .list()
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let rentals = self
            .repository
            .rentals
            .list(&RentalFilter {
                event_id: Some(event_id),
                ..Default::default()
            })
            .await?;

        let mut by_sector: HashMap<Option<Uuid>, SectorSummary> = HashMap::new();
        for rental in &rentals {
            by_sector
                .entry(rental.sector_id)
                .or_insert_with(|| SectorSummary {
                    sector_id: rental.sector_id,
                    sector_name: rental
                        .sector_id
                        .and_then(|id| sectors.get(&id).cloned())
                        .unwrap_or_else(|| UNASSIGNED.to_string()),
                    ..Default::default()
                })
                .count(rental.display_status(now));
        }

        let mut summaries: Vec<SectorSummary> = by_sector.into_values().collect();
        summaries.sort_by(|a, b| {
            a.sector_id
                .is_none()
                .cmp(&b.sector_id.is_none())
                .then_with(|| a.sector_name.cmp(&b.sector_name))
        });

        Ok(EventSummary {
            event_id: event.id,
            event_name: event.name,
            sectors: summaries,
        })
    }

    pub async fn low_stock(&self) -> AppResult<Vec<MerchandiseItem>> {
        let mut items: Vec<MerchandiseItem> = self
            .repository
            .merchandise
            .list()
            .await?
            .into_iter()
            .filter(MerchandiseItem::is_low_stock)
            .collect();
        items.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
        Ok(items)
    }
}
