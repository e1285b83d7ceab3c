//! Persistence adapters for the catalogue document

pub mod json;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{StorageBackend, StorageConfig},
    error::StoreError,
    models::CatalogueState,
};

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Whole-document persistence. `save` must either store the full state or
/// fail without leaving a partially written document behind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn load(&self) -> Result<CatalogueState, StoreError>;

    async fn save(&self, state: &CatalogueState) -> Result<(), StoreError>;
}

/// Open the store selected by configuration
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn Store>, StoreError> {
    let store: Arc<dyn Store> = match config.backend {
        StorageBackend::Json => {
            let store = JsonFileStore::new(&config.path);
            match &config.legacy_borrowers_path {
                Some(borrowers) => Arc::new(store.with_legacy_borrowers(borrowers)),
                None => Arc::new(store),
            }
        }
        StorageBackend::Sqlite => Arc::new(SqliteStore::connect(&config.database_url).await?),
        StorageBackend::Memory => Arc::new(MemoryStore::default()),
    };
    tracing::info!(backend = ?config.backend, "Opened catalogue store");
    Ok(store)
}
