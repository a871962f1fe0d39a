//! Wire objects for the reservation notification service.
//!
//! - [`objects::reservation`]: the inbound queue payload published by the
//!   reservation service.
//! - [`objects::notification`]: the JSON bodies returned by the Query API.

pub mod objects;
