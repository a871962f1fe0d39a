//! Axum server setup and router configuration.

use crate::api;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Service descriptor
        .route("/", get(api::index::index))
        // Health check endpoint
        .route("/health", get(health_check))
        // Query API
        .nest("/api", api::router())
        // Add state to all routes
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    consumer: &'static str,
}

/// Health check - returns OK while the server is running, along with the
/// consumer's connection state.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        consumer: state.consumer_state().as_str(),
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use resnotify_core::events::{ReservationEvent, build_notification};
    use resnotify_core::processors::ConsumerState;
    use resnotify_core::store::{InMemoryNotificationStore, NotificationStore};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use time::macros::datetime;
    use tokio::sync::watch;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app(store: &InMemoryNotificationStore, consumer: ConsumerState) -> Router {
        let (_tx, rx) = watch::channel(consumer);
        build_router(AppState::new(Arc::new(store.clone()), rx))
    }

    async fn seed(store: &InMemoryNotificationStore, user_id: &str, name: &str) -> Uuid {
        let event = ReservationEvent {
            user_id: Some(user_id.to_string()),
            user_email: Some(format!("{name}@example.com")),
            user_name: Some(name.to_string()),
            event_id: Some("E9".to_string()),
            seats: Some("2".to_string()),
            reservation_id: Some(format!("r-{name}")),
        };
        let id = Uuid::now_v7();
        let notification = build_notification(
            &event,
            format!("reservation:r-{name}"),
            id,
            datetime!(2026-03-01 12:00:00),
        );
        store.insert(notification).await.unwrap();
        id
    }

    async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_index_describes_endpoints() {
        let store = InMemoryNotificationStore::new();
        let (status, body) = send(app(&store, ConsumerState::Consuming), Method::GET, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Notification Service API");
        assert_eq!(body["endpoints"]["notifications"], "/api/notifications");
        assert!(body["endpoints"]["user_notifications"].is_string());
        assert!(body["endpoints"]["mark_read"].is_string());
    }

    #[tokio::test]
    async fn test_health_reports_consumer_state() {
        let store = InMemoryNotificationStore::new();
        let (status, body) =
            send(app(&store, ConsumerState::Disconnected), Method::GET, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["consumer"], "disconnected");
    }

    #[tokio::test]
    async fn test_list_notifications_shape() {
        let store = InMemoryNotificationStore::new();
        let id = seed(&store, "u1", "Alice").await;

        let (status, body) = send(
            app(&store, ConsumerState::Consuming),
            Method::GET,
            "/api/notifications",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "notificationId": id.to_string(),
                "type": "RESERVATION_CREATED",
                "userId": "u1",
                "userEmail": "Alice@example.com",
                "message": "Hello Alice, your reservation for event #E9 with 2 seats has been confirmed.",
                "read": false,
                "createdAt": 1772366400,
            }])
        );
    }

    #[tokio::test]
    async fn test_list_user_notifications_filters() {
        let store = InMemoryNotificationStore::new();
        seed(&store, "u1", "Alice").await;
        seed(&store, "u2", "Bob").await;
        seed(&store, "u1", "Carol").await;

        let (status, body) = send(
            app(&store, ConsumerState::Consuming),
            Method::GET,
            "/api/notifications/user/u1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let emails: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["userEmail"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(emails, vec!["Alice@example.com", "Carol@example.com"]);

        let (_, body) = send(
            app(&store, ConsumerState::Consuming),
            Method::GET,
            "/api/notifications/user/nobody",
        )
        .await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_mark_read() {
        let store = InMemoryNotificationStore::new();
        let id = seed(&store, "u1", "Alice").await;

        for _ in 0..2 {
            let (status, body) = send(
                app(&store, ConsumerState::Consuming),
                Method::PUT,
                &format!("/api/notifications/{id}/read"),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"message": "Notification marked as read"}));
        }

        assert!(store.find_all().await.unwrap()[0].read);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_or_malformed_id_is_noop() {
        let store = InMemoryNotificationStore::new();
        seed(&store, "u1", "Alice").await;

        for id in [Uuid::now_v7().to_string(), "not-a-uuid".to_string()] {
            let (status, body) = send(
                app(&store, ConsumerState::Consuming),
                Method::PUT,
                &format!("/api/notifications/{id}/read"),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "Notification marked as read");
        }

        assert!(!store.find_all().await.unwrap()[0].read);
    }

    #[tokio::test]
    async fn test_storage_failure_is_500_with_error_body() {
        let store = InMemoryNotificationStore::new();
        store.set_unavailable(true);

        for (method, uri) in [
            (Method::GET, "/api/notifications".to_string()),
            (Method::GET, "/api/notifications/user/u1".to_string()),
            (Method::PUT, format!("/api/notifications/{}/read", Uuid::now_v7())),
        ] {
            let (status, body) = send(app(&store, ConsumerState::Consuming), method, &uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body["error"].as_str().unwrap().contains("unavailable"));
        }
    }
}
