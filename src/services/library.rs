//! Owner of the in-memory catalogue and its persistence lifecycle

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::{
    error::{AppError, AppResult},
    models::Catalogue,
    repository::Store,
};

/// Shared catalogue state.
///
/// Mutations run one at a time: each works on a private copy of the current
/// catalogue, persists it, and only then publishes it. A failed operation or
/// a failed save leaves the published state untouched. Readers clone the
/// published `Arc` and never wait on I/O.
pub struct Library {
    store: Arc<dyn Store>,
    writer: Mutex<()>,
    current: RwLock<Arc<Catalogue>>,
}

impl Library {
    /// Load and validate the catalogue from `store`
    pub async fn open(store: Arc<dyn Store>) -> AppResult<Self> {
        let state = store.load().await?;
        let catalogue = Catalogue::from_state(state)?;
        tracing::info!(
            books = catalogue.books().count(),
            authors = catalogue.authors().count(),
            loans = catalogue.loans().len(),
            "Catalogue loaded"
        );

        Ok(Self {
            store,
            writer: Mutex::new(()),
            current: RwLock::new(Arc::new(catalogue)),
        })
    }

    /// Consistent view of the last committed state
    pub async fn snapshot(&self) -> Arc<Catalogue> {
        self.current.read().await.clone()
    }

    /// Apply `op` to a copy of the catalogue and commit it if both `op` and
    /// the save succeed.
    pub async fn transact<T, F>(&self, op: &'static str, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Catalogue) -> AppResult<T>,
    {
        let _writer = self.writer.lock().await;

        let mut next = Catalogue::clone(&*self.snapshot().await);
        let output = f(&mut next)?;

        if let Err(e) = self.store.save(&next.to_state()).await {
            tracing::error!(op, error = %e, "Save failed, mutation rolled back");
            return Err(AppError::Persistence(e));
        }

        *self.current.write().await = Arc::new(next);
        Ok(output)
    }

    /// Persist the current state, e.g. at shutdown
    pub async fn flush(&self) -> AppResult<()> {
        let _writer = self.writer.lock().await;
        let catalogue = self.snapshot().await;
        self.store.save(&catalogue.to_state()).await?;
        tracing::info!("Catalogue flushed");
        Ok(())
    }
}
