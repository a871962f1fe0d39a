use axum::{Json, extract::Path, response::IntoResponse};
use resnotify_sdk::objects::MarkReadResponse;
use uuid::Uuid;

use crate::state::AppState;

use super::ApiError;

/// `PUT /notifications/{notification_id}/read`: mark a notification as read.
///
/// Succeeds whether or not a notification matched. An id that does not parse
/// as a UUID cannot match anything, so it is treated the same way.
pub async fn mark_read(
    state: axum::extract::State<AppState>,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match Uuid::parse_str(&notification_id) {
        Ok(id) => {
            let matched = state.store.mark_read(id).await?;
            if !matched {
                tracing::debug!(%id, "Mark-read matched no notification");
            }
        }
        Err(_) => {
            tracing::debug!(
                notification_id = %notification_id,
                "Mark-read with malformed notification id"
            );
        }
    }

    Ok(Json(MarkReadResponse::marked()))
}
