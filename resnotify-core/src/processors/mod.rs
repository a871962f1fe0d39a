//! Background processors.
//!
//! - [`ConsumerLoop`]: owns the broker session and drives consumption
//! - [`DeliveryProcessor`]: turns one delivery into a stored notification

pub mod consumer_loop;
pub mod delivery;

pub use consumer_loop::{ConsumerLoop, ConsumerState, PREFETCH_COUNT};
pub use delivery::{DeliveryProcessor, Disposition, ProcessingError};
