use crate::entities::NotificationKind;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use uuid::Uuid;

/// A stored notification, without the internal row id and dedup key.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct NotificationRecord {
    pub notification_id: Uuid,
    pub kind: NotificationKind,
    pub user_id: Option<String>,
    pub user_email: String,
    pub message: String,
    pub read: bool,
    pub created_at: time::PrimitiveDateTime,
}

/// Data for inserting a new notification.
///
/// `read` is not part of the insert: every notification starts unread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub notification_id: Uuid,
    /// Stable key derived from the inbound delivery; unique per stored row.
    pub dedup_key: String,
    pub kind: NotificationKind,
    pub user_id: Option<String>,
    pub user_email: String,
    pub message: String,
    pub created_at: time::PrimitiveDateTime,
}

impl NewNotification {
    /// The record this insert produces.
    pub fn to_record(&self) -> NotificationRecord {
        NotificationRecord {
            notification_id: self.notification_id,
            kind: self.kind,
            user_id: self.user_id.clone(),
            user_email: self.user_email.clone(),
            message: self.message.clone(),
            read: false,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
/// Insert a notification unless one with the same dedup key already exists.
///
/// Returns `true` if a row was inserted, `false` on a dedup key conflict.
pub struct InsertNotification {
    pub notification: NewNotification,
}

impl Processor<InsertNotification> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertNotification")]
    async fn process(&self, insert: InsertNotification) -> Result<bool, sqlx::Error> {
        let n = insert.notification;
        let result = sqlx::query(
            r#"
            INSERT INTO notifications
                (notification_id, dedup_key, kind, user_id, user_email, message, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
            ON CONFLICT (dedup_key) DO NOTHING
            "#,
        )
        .bind(n.notification_id)
        .bind(n.dedup_key)
        .bind(n.kind)
        .bind(n.user_id)
        .bind(n.user_email)
        .bind(n.message)
        .bind(n.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
/// List every notification in insertion order.
pub struct ListNotifications;

impl Processor<ListNotifications> for DatabaseProcessor {
    type Output = Vec<NotificationRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListNotifications")]
    async fn process(&self, _query: ListNotifications) -> Result<Vec<NotificationRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, NotificationRecord>(
            r#"
            SELECT notification_id, kind, user_id, user_email, message, read, created_at
            FROM notifications
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

#[derive(Debug, Clone)]
/// List the notifications owned by one user, in insertion order.
pub struct ListNotificationsByUser {
    pub user_id: String,
}

impl Processor<ListNotificationsByUser> for DatabaseProcessor {
    type Output = Vec<NotificationRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListNotificationsByUser")]
    async fn process(
        &self,
        query: ListNotificationsByUser,
    ) -> Result<Vec<NotificationRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, NotificationRecord>(
            r#"
            SELECT notification_id, kind, user_id, user_email, message, read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(query.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

#[derive(Debug, Clone)]
/// Set `read = TRUE` on the notification with the given id.
///
/// Returns the number of matched rows; zero when no such notification exists.
pub struct MarkNotificationRead {
    pub notification_id: Uuid,
}

impl Processor<MarkNotificationRead> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkNotificationRead")]
    async fn process(&self, update: MarkNotificationRead) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE notification_id = $1")
            .bind(update.notification_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
