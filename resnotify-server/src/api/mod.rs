//! Query API handlers.
//!
//! # Endpoints
//!
//! - `GET /notifications`                          – list all notifications
//! - `GET /notifications/user/{user_id}`           – list notifications for one user
//! - `PUT /notifications/{notification_id}/read`   – mark a notification as read

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use resnotify_core::entities::notification::NotificationRecord;
use resnotify_core::store::StorageError;
use resnotify_sdk::objects::{ErrorResponse, NotificationResponse};

use crate::state::AppState;

pub mod index;
mod list_notifications;
mod list_user_notifications;
mod mark_read;

/// Build the Query API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(list_notifications::list_notifications),
        )
        .route(
            "/notifications/user/{user_id}",
            get(list_user_notifications::list_user_notifications),
        )
        .route(
            "/notifications/{notification_id}/read",
            put(mark_read::mark_read),
        )
}

/// Errors that can occur in Query API handlers.
#[derive(Debug)]
pub(crate) enum ApiError {
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "Query API storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: e.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Convert a `NotificationRecord` (store model) into a `NotificationResponse` (API model).
pub(crate) fn to_response(record: &NotificationRecord) -> NotificationResponse {
    NotificationResponse {
        notification_id: record.notification_id,
        notification_type: record.kind.into(),
        user_id: record.user_id.clone(),
        user_email: record.user_email.clone(),
        message: record.message.clone(),
        read: record.read,
        created_at: record.created_at.assume_utc().unix_timestamp(),
    }
}
