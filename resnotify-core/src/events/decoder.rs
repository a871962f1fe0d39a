use resnotify_sdk::objects::ReservationEvent;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while decoding a queue payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not JSON at all
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    /// Payload is JSON but not an object
    #[error("payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),

    /// The object could not be mapped onto the event
    #[error("invalid event payload: {0}")]
    InvalidEvent(serde_json::Error),
}

/// Decode a raw queue payload into a [`ReservationEvent`].
///
/// Only payloads that are not a JSON object are rejected. Absent or oddly
/// typed fields fall back to being absent or to their text form.
pub fn decode_reservation_event(payload: &[u8]) -> Result<ReservationEvent, DecodeError> {
    let value: Value = serde_json::from_slice(payload).map_err(DecodeError::InvalidJson)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject(json_kind(&value)));
    }
    serde_json::from_value(value).map_err(DecodeError::InvalidEvent)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
