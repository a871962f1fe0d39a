use super::{InsertOutcome, NotificationStore, StorageError};
use crate::entities::notification::{
    InsertNotification, ListNotifications, ListNotificationsByUser, MarkNotificationRead,
    NewNotification, NotificationRecord,
};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL-backed notification store.
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    processor: DatabaseProcessor,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            processor: DatabaseProcessor { pool },
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.processor.pool
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, notification: NewNotification) -> Result<InsertOutcome, StorageError> {
        let inserted = self
            .processor
            .process(InsertNotification { notification })
            .await?;
        Ok(if inserted {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Duplicate
        })
    }

    async fn find_all(&self) -> Result<Vec<NotificationRecord>, StorageError> {
        Ok(self.processor.process(ListNotifications).await?)
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>, StorageError> {
        Ok(self
            .processor
            .process(ListNotificationsByUser {
                user_id: user_id.to_owned(),
            })
            .await?)
    }

    async fn mark_read(&self, notification_id: Uuid) -> Result<bool, StorageError> {
        let matched = self
            .processor
            .process(MarkNotificationRead { notification_id })
            .await?;
        Ok(matched > 0)
    }
}
