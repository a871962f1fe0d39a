use axum::{Json, response::IntoResponse};
use resnotify_sdk::objects::NotificationResponse;

use crate::state::AppState;

use super::{ApiError, to_response};

/// `GET /notifications`: list every notification in insertion order.
pub async fn list_notifications(
    state: axum::extract::State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.store.find_all().await?;

    let items: Vec<NotificationResponse> = records.iter().map(to_response).collect();
    Ok(Json(items))
}
