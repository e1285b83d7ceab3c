//! In-process store, for tests and throwaway instances

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::Store;
use crate::{error::StoreError, models::CatalogueState};

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<CatalogueState>,
}

impl MemoryStore {
    pub fn with_state(state: CatalogueState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Last saved document
    pub async fn saved(&self) -> CatalogueState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> Result<CatalogueState, StoreError> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &CatalogueState) -> Result<(), StoreError> {
        *self.state.lock().await = state.clone();
        Ok(())
    }
}
