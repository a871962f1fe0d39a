//! Inbound event handling.
//!
//! # Flow
//!
//! 1. [`decoder::decode_reservation_event`] turns a raw payload into a
//!    [`ReservationEvent`].
//! 2. [`dedup::dedup_key`] derives the key that makes redelivery idempotent.
//! 3. [`builder::build_notification`] renders the notification to store.

pub mod builder;
pub mod decoder;
pub mod dedup;

pub use builder::{build_notification, render_reservation_message};
pub use decoder::{DecodeError, decode_reservation_event};
pub use dedup::dedup_key;
pub use resnotify_sdk::objects::ReservationEvent;
