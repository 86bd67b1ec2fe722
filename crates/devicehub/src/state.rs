//! Shared application state.
//!
//! Handlers only see the repository trait object, so they work the same with
//! either storage backend.

use std::sync::Arc;

use devicehub_core::storage::DeviceRepository;

use crate::storage::{SqlitePool, Storage};

/// Shared application state.
///
/// This is cloned for each request handler.
#[derive(Clone)]
pub struct AppState {
    /// The selected device repository.
    pub repository: Arc<dyn DeviceRepository>,
    /// SQLite connection pool, reported by the health endpoint.
    pub pool: Option<Arc<SqlitePool>>,
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        Self {
            repository: storage.repository,
            pool: storage.pool,
        }
    }
}
