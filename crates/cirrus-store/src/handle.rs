//! Async access to a blocking [`LocationStore`].

use std::sync::Arc;

use cirrus_core::StoreError;
use parking_lot::Mutex;

use crate::backend::{LocationStore, StoreResult};
use crate::location::{LocationId, TrackedLocation};

/// Cloneable handle that runs store calls on the blocking thread pool.
///
/// Constructed once at startup and passed to whoever needs persistence.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<Mutex<Box<dyn LocationStore>>>,
}

impl StoreHandle {
    pub fn new<S: LocationStore + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(Mutex::new(Box::new(store))),
        }
    }

    pub async fn list_all(&self) -> StoreResult<Vec<TrackedLocation>> {
        self.run(|store| store.list_all()).await
    }

    pub async fn insert(&self, location: TrackedLocation) -> StoreResult<LocationId> {
        self.run(move |store| store.insert(&location)).await
    }

    pub async fn update(&self, location: TrackedLocation) -> StoreResult<()> {
        self.run(move |store| store.update(&location)).await
    }

    pub async fn delete_by_id(&self, id: LocationId) -> StoreResult<()> {
        self.run(move |store| store.delete_by_id(id)).await
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn LocationStore) -> StoreResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let guard = store.lock();
            op(&**guard)
        })
        .await
        .map_err(|e| StoreError::persistence(format!("Store task failed: {}", e)))?
    }
}
