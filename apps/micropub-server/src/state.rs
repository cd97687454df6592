//! Application state - shared across all handlers.

use std::sync::Arc;

use micropub_core::EntryService;
use micropub_core::ports::{EntryRepository, MediaStore};
use micropub_infra::{InMemoryEntryRepository, InMemoryMediaStore};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EntryService>,
    pub media: Arc<dyn MediaStore>,
    pub max_body_size: usize,
}

impl AppState {
    /// Build the application state with the in-memory stores.
    pub fn new(config: &AppConfig) -> Self {
        let entries: Arc<dyn EntryRepository> = Arc::new(InMemoryEntryRepository::new());
        let media: Arc<dyn MediaStore> =
            Arc::new(InMemoryMediaStore::new(config.base_url.clone()));

        let service = Arc::new(EntryService::new(
            entries,
            media.clone(),
            config.base_url.clone(),
        ));

        tracing::info!(base_url = %config.base_url, "Application state initialized");

        Self {
            service,
            media,
            max_body_size: config.max_body_size,
        }
    }
}
