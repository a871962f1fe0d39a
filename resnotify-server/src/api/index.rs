use axum::{Json, response::IntoResponse};
use resnotify_sdk::objects::ServiceDescriptor;

/// `GET /`: describe the service and its endpoints.
pub async fn index() -> impl IntoResponse {
    Json(ServiceDescriptor::default())
}
