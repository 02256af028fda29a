//! Binds the shared state tree to the controller's selector interface.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use resource_state::{ResourcePath, ResourceStore, ResourceView};

use crate::traits::BaseTraceSelector;

/// The process-wide store shared by the API adapter and the selector.
pub type SharedStore = Arc<Mutex<ResourceStore>>;

pub fn shared_store() -> SharedStore {
    Arc::new(Mutex::new(ResourceStore::new()))
}

/// Lock the store, recovering from a poisoned lock.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, ResourceStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `individualTraces.{id}`
pub fn trace_path(id: &str) -> ResourcePath {
    ResourcePath::new(["individualTraces", id])
}

/// `authenticatedUser`
pub fn authenticated_user_path() -> ResourcePath {
    ResourcePath::new(["authenticatedUser"])
}

#[derive(Clone)]
pub struct StoreSelector {
    store: SharedStore,
}

impl StoreSelector {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

impl BaseTraceSelector for StoreSelector {
    fn trace(&self, id: &str) -> ResourceView {
        lock_store(&self.store).view(&trace_path(id))
    }

    fn authenticated_user(&self) -> ResourceView {
        lock_store(&self.store).view(&authenticated_user_path())
    }
}
