//! Store bootstrap.
//!
//! The consumer thread and the HTTP server each open their own handle. With
//! PostgreSQL that means one pool per runtime; the in-memory backend hands
//! out clones of the same store.

use resnotify_core::store::{InMemoryNotificationStore, NotificationStore, PgNotificationStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

/// Which backend the service stores notifications in.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Postgres { url: String },
    Memory(InMemoryNotificationStore),
}

/// A store handle, plus the pool behind it when there is one.
pub struct OpenedStore {
    pub store: Arc<dyn NotificationStore>,
    pub pool: Option<PgPool>,
}

impl StoreBackend {
    /// Open a handle on the backend.
    ///
    /// Postgres pools connect lazily, so an unreachable database surfaces as
    /// a storage error on first use rather than here. Must be called from
    /// within the tokio runtime that will use the handle.
    pub fn open(&self, max_connections: u32) -> Result<OpenedStore, sqlx::Error> {
        match self {
            StoreBackend::Postgres { url } => {
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect_lazy(url)?;
                Ok(OpenedStore {
                    store: Arc::new(PgNotificationStore::new(pool.clone())),
                    pool: Some(pool),
                })
            }
            StoreBackend::Memory(store) => Ok(OpenedStore {
                store: Arc::new(store.clone()),
                pool: None,
            }),
        }
    }
}

impl OpenedStore {
    /// Close the pool, waiting for in-use connections to be returned.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
