//! Business logic services

pub mod analytics;
pub mod borrowers;
pub mod catalog;
pub mod lending;

use crate::{config::LendingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub borrowers: borrowers::BorrowersService,
    pub lending: lending::LendingService,
    pub analytics: analytics::AnalyticsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, lending_config: LendingConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            borrowers: borrowers::BorrowersService::new(repository.clone()),
            lending: lending::LendingService::new(repository.clone(), lending_config),
            analytics: analytics::AnalyticsService::new(repository),
        }
    }
}
