//! Query API response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of event a notification was created from.
///
/// This is the API version. For database use, see
/// `resnotify_core::entities::NotificationKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ReservationCreated,
}

/// A stored notification as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub notification_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub user_id: Option<String>,
    pub user_email: String,
    pub message: String,
    pub read: bool,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

/// Body returned by `PUT /api/notifications/{notification_id}/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub message: String,
}

impl MarkReadResponse {
    pub fn marked() -> Self {
        Self {
            message: "Notification marked as read".to_string(),
        }
    }
}

/// Body returned with every 5xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub message: String,
    pub endpoints: ServiceEndpoints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    pub notifications: String,
    pub user_notifications: String,
    pub mark_read: String,
}

impl Default for ServiceDescriptor {
    fn default() -> Self {
        Self {
            message: "Notification Service API".to_string(),
            endpoints: ServiceEndpoints {
                notifications: "/api/notifications".to_string(),
                user_notifications: "/api/notifications/user/{user_id}".to_string(),
                mark_read: "/api/notifications/{notification_id}/read".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_json_shape() {
        let response = NotificationResponse {
            notification_id: Uuid::nil(),
            notification_type: NotificationType::ReservationCreated,
            user_id: None,
            user_email: "a@b.com".to_string(),
            message: "hi".to_string(),
            read: false,
            created_at: 1_700_000_000,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "RESERVATION_CREATED");
        assert_eq!(value["notificationId"], Uuid::nil().to_string());
        assert_eq!(value["userId"], serde_json::Value::Null);
        assert_eq!(value["userEmail"], "a@b.com");
        assert_eq!(value["read"], false);
        assert_eq!(value["createdAt"], 1_700_000_000);
    }
}
