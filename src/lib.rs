//! Circulation Server
//!
//! Keeps track of which physical copy of a book is lent to which borrower.
//! Transitions on a copy are serialized in-process by a per-book lock and
//! guarded in the store by versioned rows, so concurrent requests never
//! produce two active loans for one copy.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use repository::LibraryStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub store: Arc<dyn LibraryStore>,
}

impl AppState {
    /// Wire services on top of `store` using the loan settings from `config`
    pub fn new(config: AppConfig, store: Arc<dyn LibraryStore>) -> Self {
        let services = services::Services::new(store.clone(), config.loans.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            store,
        }
    }
}
