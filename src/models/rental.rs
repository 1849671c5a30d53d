//! Rental (equipment checkout) model and lifecycle rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::accessories::{self, Accessory, AccessorySet};

/// Persisted rental status.
///
/// `Overdue` is deliberately absent: it is derived at read time, see
/// [`DisplayStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "rental_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    Active,
    Partial,
    Completed,
    /// Reserved; no operation produces it
    Maintenance,
}

impl RentalStatus {
    /// Whether the equipment is still out (a return may be recorded)
    pub fn is_open(&self) -> bool {
        matches!(self, RentalStatus::Active | RentalStatus::Partial)
    }
}

/// Status shown to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Active,
    Overdue,
    Partial,
    Completed,
    Maintenance,
}

impl From<RentalStatus> for DisplayStatus {
    fn from(s: RentalStatus) -> Self {
        match s {
            RentalStatus::Active => DisplayStatus::Active,
            RentalStatus::Partial => DisplayStatus::Partial,
            RentalStatus::Completed => DisplayStatus::Completed,
            RentalStatus::Maintenance => DisplayStatus::Maintenance,
        }
    }
}

/// Rental record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Rental {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub event_id: Uuid,
    pub sector_id: Option<Uuid>,
    pub responsible_name: String,
    pub responsible_phone: Option<String>,
    pub start_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    /// Accessories issued at checkout
    pub accessories: AccessorySet,
    /// Accessories confirmed back so far
    pub returned_accessories: AccessorySet,
    pub status: RentalStatus,
    pub returned_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Operator who checked the equipment out
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Rental {
    /// Past its expected return date while still (partly) out.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && now > self.expected_return_date
    }

    pub fn display_status(&self, now: DateTime<Utc>) -> DisplayStatus {
        if self.is_overdue(now) {
            DisplayStatus::Overdue
        } else {
            self.status.into()
        }
    }

    /// Issued accessories not yet returned
    pub fn missing_accessories(&self) -> Vec<Accessory> {
        accessories::missing(&self.accessories, &self.returned_accessories)
    }

    /// Compute the single write that records a return.
    ///
    /// `confirmed` is merged with what a previous partial return already
    /// brought back, then restricted to the issued set.
    pub fn plan_return(&self, confirmed: &AccessorySet, now: DateTime<Utc>) -> Option<ReturnUpdate> {
        if !self.status.is_open() {
            return None;
        }
        let returned = self
            .returned_accessories
            .union(confirmed)
            .restricted_to(&self.accessories);
        let status = finalize_return(&self.accessories, &returned);
        Some(ReturnUpdate {
            status,
            returned_accessories: returned,
            returned_at: (status == RentalStatus::Completed).then_some(now),
            expected_status: self.status,
            expected_returned: self.returned_accessories,
        })
    }
}

/// Terminal status for a return: `Completed` when every issued accessory
/// came back, `Partial` otherwise.
pub fn finalize_return(issued: &AccessorySet, returned: &AccessorySet) -> RentalStatus {
    if accessories::is_return_complete(issued, returned) {
        RentalStatus::Completed
    } else {
        RentalStatus::Partial
    }
}

/// Fields written atomically when a return is recorded.
///
/// The write only applies while the rental still matches the snapshot the
/// plan was computed from (`expected_status`, `expected_returned`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnUpdate {
    pub status: RentalStatus,
    pub returned_accessories: AccessorySet,
    pub returned_at: Option<DateTime<Utc>>,
    pub expected_status: RentalStatus,
    pub expected_returned: AccessorySet,
}

impl ReturnUpdate {
    /// Whether the stored rental is still the one this plan was made from
    pub fn matches(&self, rental: &Rental) -> bool {
        rental.status == self.expected_status
            && rental.returned_accessories == self.expected_returned
    }
}

/// Rental as presented to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RentalView {
    #[serde(flatten)]
    pub rental: Rental,
    pub display_status: DisplayStatus,
    pub missing_accessories: Vec<Accessory>,
}

impl RentalView {
    pub fn new(rental: Rental, now: DateTime<Utc>) -> Self {
        Self {
            display_status: rental.display_status(now),
            missing_accessories: rental.missing_accessories(),
            rental,
        }
    }
}

/// Create rental request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRental {
    pub equipment_id: Uuid,
    pub event_id: Uuid,
    pub sector_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Responsible name is required"))]
    pub responsible_name: String,
    pub responsible_phone: Option<String>,
    /// Defaults to now
    pub start_date: Option<DateTime<Utc>>,
    pub expected_return_date: DateTime<Utc>,
    #[serde(default)]
    pub accessories: AccessorySet,
    pub notes: Option<String>,
}

/// Return request: the accessories confirmed back in this action
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnRental {
    #[serde(default)]
    pub returned_accessories: AccessorySet,
}

/// Query parameters for rentals
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct RentalQuery {
    pub event_id: Option<Uuid>,
    pub sector_id: Option<Uuid>,
    /// Filter on the displayed status (so `overdue` works)
    pub status: Option<DisplayStatus>,
    /// Only rentals still out (active or partial)
    pub open_only: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn rental(issued: AccessorySet, status: RentalStatus) -> Rental {
        let now = Utc::now();
        Rental {
            id: Uuid::new_v4(),
            equipment_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            sector_id: None,
            responsible_name: "Ana".to_string(),
            responsible_phone: None,
            start_date: now,
            expected_return_date: now + Duration::hours(8),
            accessories: issued,
            returned_accessories: AccessorySet::default(),
            status,
            returned_at: None,
            notes: None,
            created_by: Uuid::new_v4(),
            created_at: now,
        }
    }

    fn antenna_and_clip() -> AccessorySet {
        AccessorySet::of(&[Accessory::Antenna, Accessory::Clip])
    }

    #[test]
    fn test_full_return_completes() {
        let r = rental(antenna_and_clip(), RentalStatus::Active);
        let now = Utc::now();
        let update = r.plan_return(&antenna_and_clip(), now).unwrap();
        assert_eq!(update.status, RentalStatus::Completed);
        assert_eq!(update.returned_at, Some(now));
    }

    #[test]
    fn test_missing_clip_is_partial() {
        let mut r = rental(antenna_and_clip(), RentalStatus::Active);
        let update = r
            .plan_return(&AccessorySet::of(&[Accessory::Antenna]), Utc::now())
            .unwrap();
        assert_eq!(update.status, RentalStatus::Partial);
        assert_eq!(update.returned_at, None);

        r.status = update.status;
        r.returned_accessories = update.returned_accessories;
        assert_eq!(r.missing_accessories(), vec![Accessory::Clip]);
    }

    #[test]
    fn test_partial_then_remaining_items_completes() {
        let mut r = rental(antenna_and_clip(), RentalStatus::Partial);
        r.returned_accessories = AccessorySet::of(&[Accessory::Antenna]);
        let update = r
            .plan_return(&AccessorySet::of(&[Accessory::Clip]), Utc::now())
            .unwrap();
        assert_eq!(update.status, RentalStatus::Completed);
        assert_eq!(update.returned_accessories, antenna_and_clip());
        assert_eq!(update.expected_status, RentalStatus::Partial);
        assert_eq!(
            update.expected_returned,
            AccessorySet::of(&[Accessory::Antenna])
        );
    }

    #[test]
    fn test_plan_no_longer_matches_after_another_return() {
        let mut r = rental(antenna_and_clip(), RentalStatus::Active);
        let first = r
            .plan_return(&AccessorySet::of(&[Accessory::Antenna]), Utc::now())
            .unwrap();
        let second = r
            .plan_return(&AccessorySet::of(&[Accessory::Clip]), Utc::now())
            .unwrap();
        assert!(first.matches(&r));

        r.status = first.status;
        r.returned_accessories = first.returned_accessories;
        assert!(!second.matches(&r));
    }

    #[test]
    fn test_completed_and_maintenance_cannot_be_returned() {
        let r = rental(antenna_and_clip(), RentalStatus::Completed);
        assert!(r.plan_return(&antenna_and_clip(), Utc::now()).is_none());
        let r = rental(antenna_and_clip(), RentalStatus::Maintenance);
        assert!(r.plan_return(&antenna_and_clip(), Utc::now()).is_none());
    }

    #[test]
    fn test_finalize_never_yields_open_status() {
        for issued in [AccessorySet::default(), antenna_and_clip()] {
            for returned in [AccessorySet::default(), AccessorySet::of(&[Accessory::Clip])] {
                let status = finalize_return(&issued, &returned);
                assert!(matches!(status, RentalStatus::Completed | RentalStatus::Partial));
            }
        }
    }

    #[test]
    fn test_overdue_is_strictly_after_expected_return() {
        let r = rental(AccessorySet::default(), RentalStatus::Active);
        assert!(!r.is_overdue(r.expected_return_date));
        let later = r.expected_return_date + Duration::seconds(1);
        assert!(r.is_overdue(later));
        assert_eq!(r.display_status(later), DisplayStatus::Overdue);
        assert_eq!(r.display_status(r.start_date), DisplayStatus::Active);
    }

    #[test]
    fn test_partial_can_be_overdue_but_completed_cannot() {
        let mut r = rental(antenna_and_clip(), RentalStatus::Partial);
        let later = r.expected_return_date + Duration::hours(1);
        assert!(r.is_overdue(later));
        r.status = RentalStatus::Completed;
        assert!(!r.is_overdue(later));
        assert_eq!(r.display_status(later), DisplayStatus::Completed);
    }
}
