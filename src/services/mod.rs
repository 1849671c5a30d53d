//! Business logic services

pub mod catalog;
pub mod merchandise;
pub mod rentals;
pub mod reports;
pub mod roster;

use crate::{config::RosterConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub rentals: rentals::RentalsService,
    pub merchandise: merchandise::MerchandiseService,
    pub roster: roster::RosterService,
    pub reports: reports::ReportsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, roster_config: RosterConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            rentals: rentals::RentalsService::new(repository.clone()),
            merchandise: merchandise::MerchandiseService::new(repository.clone()),
            roster: roster::RosterService::new(repository.clone(), roster_config),
            reports: reports::ReportsService::new(repository),
        }
    }
}
