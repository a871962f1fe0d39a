pub mod notification;

use resnotify_sdk::objects::NotificationType as SdkNotificationType;

/// Notification kind for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see
/// `resnotify_sdk::objects::NotificationType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE", type_name = "notification_kind")]
pub enum NotificationKind {
    ReservationCreated,
}

impl From<NotificationKind> for SdkNotificationType {
    fn from(value: NotificationKind) -> Self {
        match value {
            NotificationKind::ReservationCreated => SdkNotificationType::ReservationCreated,
        }
    }
}

impl From<SdkNotificationType> for NotificationKind {
    fn from(value: SdkNotificationType) -> Self {
        match value {
            SdkNotificationType::ReservationCreated => NotificationKind::ReservationCreated,
        }
    }
}
