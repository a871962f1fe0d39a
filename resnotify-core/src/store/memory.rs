use super::{InsertOutcome, NotificationStore, StorageError};
use crate::entities::notification::{NewNotification, NotificationRecord};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local notification store.
///
/// Cloning yields another handle to the same records. Each operation holds
/// the lock for its whole duration, which gives the same per-write isolation
/// as a single database statement.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationStore {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: RwLock<Vec<StoredNotification>>,
    unavailable: AtomicBool,
}

#[derive(Debug)]
struct StoredNotification {
    dedup_key: String,
    record: NotificationRecord,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every operation fails with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.inner.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable(
                "in-memory store is marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: NewNotification) -> Result<InsertOutcome, StorageError> {
        self.check_available()?;
        let mut records = self.inner.records.write().await;
        if records
            .iter()
            .any(|stored| stored.dedup_key == notification.dedup_key)
        {
            return Ok(InsertOutcome::Duplicate);
        }
        let record = notification.to_record();
        records.push(StoredNotification {
            dedup_key: notification.dedup_key,
            record,
        });
        Ok(InsertOutcome::Inserted)
    }

    async fn find_all(&self) -> Result<Vec<NotificationRecord>, StorageError> {
        self.check_available()?;
        let records = self.inner.records.read().await;
        Ok(records.iter().map(|stored| stored.record.clone()).collect())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>, StorageError> {
        self.check_available()?;
        let records = self.inner.records.read().await;
        Ok(records
            .iter()
            .filter(|stored| stored.record.user_id.as_deref() == Some(user_id))
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn mark_read(&self, notification_id: Uuid) -> Result<bool, StorageError> {
        self.check_available()?;
        let mut records = self.inner.records.write().await;
        match records
            .iter_mut()
            .find(|stored| stored.record.notification_id == notification_id)
        {
            Some(stored) => {
                stored.record.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
