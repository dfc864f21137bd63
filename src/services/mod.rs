//! Business logic services

pub mod borrowers;
pub mod catalog;
pub mod loans;
pub mod locks;
pub mod retry;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{config::LoansConfig, repository::LibraryStore};

/// Source of loan timestamps
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub borrowers: borrowers::BorrowersService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services on top of the given store
    pub fn new(store: Arc<dyn LibraryStore>, loans_config: LoansConfig) -> Self {
        Self::with_clock(store, loans_config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn LibraryStore>,
        loans_config: LoansConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(store.clone(), loans_config.clone()),
            borrowers: borrowers::BorrowersService::new(store.clone()),
            loans: loans::LoansService::new(store, loans_config, clock),
        }
    }
}
