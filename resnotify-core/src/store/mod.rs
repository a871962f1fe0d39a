//! Notification storage.
//!
//! [`NotificationStore`] is the single source of truth for notification
//! records. Both the consumer loop and the Query API are clients of it; the
//! store isolates each write, so callers need no locking of their own.
//!
//! - [`PgNotificationStore`]: PostgreSQL via sqlx.
//! - [`InMemoryNotificationStore`]: process-local, used for local runs and tests.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryNotificationStore;
pub use postgres::PgNotificationStore;

use crate::entities::notification::{NewNotification, NotificationRecord};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while talking to the store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A notification with the same dedup key already exists.
    Duplicate,
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a notification, keyed on its dedup key.
    async fn insert(&self, notification: NewNotification) -> Result<InsertOutcome, StorageError>;

    /// All notifications in insertion order.
    async fn find_all(&self) -> Result<Vec<NotificationRecord>, StorageError>;

    /// Notifications whose `user_id` equals `user_id`, in insertion order.
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>, StorageError>;

    /// Mark a notification as read.
    ///
    /// Returns whether a notification matched. A missing id is not an error.
    async fn mark_read(&self, notification_id: Uuid) -> Result<bool, StorageError>;
}
