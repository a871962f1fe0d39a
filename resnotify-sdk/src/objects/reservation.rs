//! Inbound reservation event payload.
//!
//! Published by the reservation service on the `reservation.*` routing keys.
//! Every field is optional on the wire; consumers substitute empty values
//! rather than rejecting partial or oddly typed payloads.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A reservation was created upstream.
///
/// Every field is carried as text. Any JSON scalar is accepted and kept as
/// written (`2`, `"two"` and `2.0` all render as-is); `null`, arrays and
/// objects are treated the same as an absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationEvent {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_email: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub seats: Option<String>,
    /// Identifier of the upstream reservation document, when the publisher
    /// includes it.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub reservation_id: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        None | Some(Value::Null | Value::Array(_) | Value::Object(_)) => None,
    })
}
