//! Business logic services

pub mod authors;
pub mod catalogue;
pub mod ledger;
pub mod library;

use std::sync::Arc;

use crate::{error::AppResult, repository::Store};

use library::Library;

/// Container for all services, sharing one library
#[derive(Clone)]
pub struct Services {
    pub library: Arc<Library>,
    pub catalogue: catalogue::CatalogueService,
    pub ledger: ledger::LedgerService,
    pub authors: authors::AuthorsService,
}

impl Services {
    /// Load the catalogue from `store` and build all services on top of it
    pub async fn new(store: Arc<dyn Store>) -> AppResult<Self> {
        let library = Arc::new(Library::open(store).await?);
        Ok(Self {
            catalogue: catalogue::CatalogueService::new(library.clone()),
            ledger: ledger::LedgerService::new(library.clone()),
            authors: authors::AuthorsService::new(library.clone()),
            library,
        })
    }
}
