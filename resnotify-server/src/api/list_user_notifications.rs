use axum::{Json, extract::Path, response::IntoResponse};
use resnotify_sdk::objects::NotificationResponse;

use crate::state::AppState;

use super::{ApiError, to_response};

/// `GET /notifications/user/{user_id}`: list one user's notifications.
///
/// An unknown user yields an empty array.
pub async fn list_user_notifications(
    state: axum::extract::State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.store.find_by_user(&user_id).await?;

    let items: Vec<NotificationResponse> = records.iter().map(to_response).collect();
    Ok(Json(items))
}
