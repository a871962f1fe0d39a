//! Message broker connection management.
//!
//! A [`Broker`] produces a fresh, owned [`BrokerSession`] on every
//! [`acquire`](Broker::acquire). The session owns the connection and channel
//! pair and is dropped on any failure path, so no connection state outlives
//! the session that created it.
//!
//! - [`AmqpBroker`]: RabbitMQ via `lapin`.

pub mod amqp;
#[cfg(test)]
pub(crate) mod fake;

pub use amqp::{AmqpBroker, AmqpSession};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the broker connection or channel.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// AMQP protocol or I/O error
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    /// The broker cancelled the consumer or the delivery stream ended
    #[error("consumer stream ended")]
    ConsumerCancelled,

    /// `next_delivery` was called before `start_consuming`
    #[error("consumption has not been started on this session")]
    NotConsuming,

    /// The broker closed the connection or channel underneath the session
    #[error("connection closed: {0}")]
    Closed(String),
}

/// A message handed to the consumer by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundDelivery {
    /// Channel-scoped tag used to ack or nack this delivery.
    pub delivery_tag: u64,
    pub payload: Vec<u8>,
    /// The AMQP `message_id` property, if the publisher set one.
    pub message_id: Option<String>,
    /// Whether the broker has delivered this message before.
    pub redelivered: bool,
}

/// Establishes sessions with the message broker.
#[async_trait]
pub trait Broker: Send + Sync {
    type Session: BrokerSession;

    /// Connect, open a channel and declare the queue topology.
    ///
    /// Declarations are idempotent, so calling this again after a
    /// disconnection is always safe. Does not retry internally.
    async fn acquire(&self) -> Result<Self::Session, ConnectionError>;
}

/// An open connection and channel pair, owned by one consumer.
#[async_trait]
pub trait BrokerSession: Send {
    /// Limit the number of unacknowledged deliveries in flight.
    async fn set_prefetch(&mut self, count: u16) -> Result<(), ConnectionError>;

    /// Register as a manual-ack consumer on the configured queue.
    async fn start_consuming(&mut self) -> Result<(), ConnectionError>;

    /// Wait for the next delivery.
    ///
    /// Cancel-safe: dropping the future before it completes loses nothing.
    async fn next_delivery(&mut self) -> Result<InboundDelivery, ConnectionError>;

    /// Positively acknowledge; the message is removed from the queue.
    async fn ack(&mut self, delivery_tag: u64) -> Result<(), ConnectionError>;

    /// Negatively acknowledge; with `requeue` the message is redelivered.
    async fn nack(&mut self, delivery_tag: u64, requeue: bool) -> Result<(), ConnectionError>;

    /// Publish a copy of `delivery` to the dead-letter queue.
    ///
    /// The caller still has to ack the original delivery.
    async fn dead_letter(
        &mut self,
        delivery: &InboundDelivery,
        reason: &str,
    ) -> Result<(), ConnectionError>;

    /// Close the channel and connection.
    async fn close(self) -> Result<(), ConnectionError>;
}
