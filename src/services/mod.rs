//! Business logic services

pub mod catalog;
pub mod loans;
pub mod records;
pub mod session;
pub mod stats;

use std::sync::Arc;

use crate::{config::PaginationConfig, repository::Repository};

use session::SessionStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub stats: stats::StatsService,
    pub loans: loans::LoansService,
    pub records: records::RecordsService,
    pub repository: Arc<dyn Repository>,
}

impl Services {
    /// Create all services over the given storage backends
    pub fn new(
        repository: Arc<dyn Repository>,
        sessions: Arc<dyn SessionStore>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), pagination.clone()),
            stats: stats::StatsService::new(repository.clone(), sessions),
            loans: loans::LoansService::new(repository.clone(), pagination),
            records: records::RecordsService::new(repository.clone()),
            repository,
        }
    }
}
