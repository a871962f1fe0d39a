use resnotify_sdk::objects::ReservationEvent;
use ring::digest::{SHA256, digest};

/// Derive the dedup key for a delivery.
///
/// In priority order: the upstream reservation id, the AMQP `message_id`
/// property, then a SHA-256 digest of the raw payload. The same delivery
/// always yields the same key, including on redelivery, and undecodable
/// payloads still get a key so poison tracking can count them.
pub fn dedup_key(
    event: Option<&ReservationEvent>,
    message_id: Option<&str>,
    payload: &[u8],
) -> String {
    if let Some(reservation_id) = event
        .and_then(|e| e.reservation_id.as_deref())
        .filter(|id| !id.is_empty())
    {
        return format!("reservation:{reservation_id}");
    }
    if let Some(message_id) = message_id.filter(|id| !id.is_empty()) {
        return format!("message:{message_id}");
    }
    format!("sha256:{}", hex::encode(digest(&SHA256, payload)))
}
