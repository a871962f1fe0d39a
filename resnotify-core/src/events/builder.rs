use crate::entities::NotificationKind;
use crate::entities::notification::NewNotification;
use resnotify_sdk::objects::ReservationEvent;
use uuid::Uuid;

/// Render the confirmation text for a reservation.
///
/// Absent fields render as empty text.
pub fn render_reservation_message(event: &ReservationEvent) -> String {
    let user_name = event.user_name.as_deref().unwrap_or_default();
    let event_id = event.event_id.as_deref().unwrap_or_default();
    let seats = event.seats.as_deref().unwrap_or_default();
    format!(
        "Hello {user_name}, your reservation for event #{event_id} with {seats} seats has been confirmed."
    )
}

/// Build the notification for a decoded reservation event.
///
/// Pure: the identifier and creation time are supplied by the caller.
pub fn build_notification(
    event: &ReservationEvent,
    dedup_key: String,
    notification_id: Uuid,
    created_at: time::PrimitiveDateTime,
) -> NewNotification {
    NewNotification {
        notification_id,
        dedup_key,
        kind: NotificationKind::ReservationCreated,
        user_id: event.user_id.clone(),
        user_email: event.user_email.clone().unwrap_or_default(),
        message: render_reservation_message(event),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> ReservationEvent {
        ReservationEvent {
            user_id: Some("u1".to_string()),
            user_email: Some("a@b.com".to_string()),
            user_name: Some("Alice".to_string()),
            event_id: Some("E9".to_string()),
            seats: Some("2".to_string()),
            reservation_id: None,
        }
    }

    #[test]
    fn test_build_reservation_notification() {
        let created_at = time::macros::datetime!(2024-03-01 10:00:00);
        let id = Uuid::now_v7();
        let n = build_notification(&alice(), "k".to_string(), id, created_at);

        assert_eq!(n.notification_id, id);
        assert_eq!(n.kind, NotificationKind::ReservationCreated);
        assert_eq!(n.user_id.as_deref(), Some("u1"));
        assert_eq!(n.user_email, "a@b.com");
        assert_eq!(
            n.message,
            "Hello Alice, your reservation for event #E9 with 2 seats has been confirmed."
        );
        assert_eq!(n.created_at, created_at);
        assert!(!n.to_record().read);
    }

    #[test]
    fn test_missing_fields_render_empty() {
        let event = ReservationEvent::default();
        assert_eq!(
            render_reservation_message(&event),
            "Hello , your reservation for event # with  seats has been confirmed."
        );
        let n = build_notification(
            &event,
            "k".to_string(),
            Uuid::nil(),
            time::macros::datetime!(2024-03-01 10:00:00),
        );
        assert_eq!(n.user_id, None);
        assert_eq!(n.user_email, "");
    }
}
