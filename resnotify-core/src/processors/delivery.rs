//! DeliveryProcessor.
//!
//! The DeliveryProcessor is responsible for:
//! - Decoding each inbound delivery into a `ReservationEvent`
//! - Building the notification and inserting it, keyed on the dedup key
//! - Deciding how the delivery is settled with the broker
//!
//! Settlement rules:
//! - stored, or already stored under the same dedup key: ack
//! - storage failure: wait `storage_retry_delay`, then nack with requeue
//! - decode failure: nack with requeue until the poison threshold, then
//!   dead-letter

use crate::broker::InboundDelivery;
use crate::events::{
    DecodeError, ReservationEvent, build_notification, decode_reservation_event, dedup_key,
};
use crate::store::{InsertOutcome, NotificationStore, StorageError};
use crate::utils::poison::{FailureVerdict, PoisonTracker};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Errors that can occur while processing a delivery.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// How a delivery should be settled with the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Acknowledge; the message leaves the queue.
    Ack,
    /// Negative-acknowledge with requeue; the message will be redelivered.
    Requeue,
    /// Copy the message to the dead-letter queue, then acknowledge it.
    DeadLetter { reason: String },
}

pub struct DeliveryProcessor {
    store: Arc<dyn NotificationStore>,
    poison: PoisonTracker,
    storage_retry_delay: Duration,
}

impl DeliveryProcessor {
    /// Create a new DeliveryProcessor.
    ///
    /// # Arguments
    ///
    /// * `store` - Notification store the records are written to
    /// * `max_delivery_attempts` - Decode failures before dead-lettering (`0` = never)
    /// * `storage_retry_delay` - Pause before requeueing after a storage failure
    pub fn new(
        store: Arc<dyn NotificationStore>,
        max_delivery_attempts: u32,
        storage_retry_delay: Duration,
    ) -> Self {
        Self {
            store,
            poison: PoisonTracker::new(max_delivery_attempts),
            storage_retry_delay,
        }
    }

    /// Process one delivery and decide how to settle it.
    ///
    /// Never fails: every error is folded into the returned [`Disposition`].
    pub async fn handle(&mut self, delivery: &InboundDelivery) -> Disposition {
        let decoded = decode_reservation_event(&delivery.payload);
        let key = dedup_key(
            decoded.as_ref().ok(),
            delivery.message_id.as_deref(),
            &delivery.payload,
        );

        debug!(
            delivery_tag = delivery.delivery_tag,
            redelivered = delivery.redelivered,
            dedup_key = %key,
            "Received delivery"
        );

        let result = match decoded {
            Ok(event) => self.store_event(&event, &key).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(outcome) => {
                self.poison.clear(&key);
                match outcome {
                    InsertOutcome::Inserted => info!(
                        delivery_tag = delivery.delivery_tag,
                        dedup_key = %key,
                        "Notification created"
                    ),
                    InsertOutcome::Duplicate => info!(
                        delivery_tag = delivery.delivery_tag,
                        dedup_key = %key,
                        "Duplicate delivery, notification already exists"
                    ),
                }
                Disposition::Ack
            }
            Err(ProcessingError::Decode(e)) => match self.poison.record_failure(&key) {
                FailureVerdict::Retry { attempts } => {
                    warn!(
                        delivery_tag = delivery.delivery_tag,
                        dedup_key = %key,
                        attempts,
                        error = %e,
                        "Failed to decode delivery, requeueing"
                    );
                    Disposition::Requeue
                }
                FailureVerdict::Exhausted { attempts } => {
                    warn!(
                        delivery_tag = delivery.delivery_tag,
                        dedup_key = %key,
                        attempts,
                        error = %e,
                        "Failed to decode delivery, giving up"
                    );
                    Disposition::DeadLetter {
                        reason: format!("{e} (after {attempts} attempts)"),
                    }
                }
            },
            Err(ProcessingError::Storage(e)) => {
                warn!(
                    delivery_tag = delivery.delivery_tag,
                    dedup_key = %key,
                    error = %e,
                    retry_in_ms = self.storage_retry_delay.as_millis() as u64,
                    "Failed to store notification, requeueing"
                );
                if !self.storage_retry_delay.is_zero() {
                    tokio::time::sleep(self.storage_retry_delay).await;
                }
                Disposition::Requeue
            }
        }
    }

    async fn store_event(
        &self,
        event: &ReservationEvent,
        key: &str,
    ) -> Result<InsertOutcome, ProcessingError> {
        let now = time::OffsetDateTime::now_utc();
        let created_at = time::PrimitiveDateTime::new(now.date(), now.time());
        let notification = build_notification(event, key.to_owned(), Uuid::now_v7(), created_at);
        Ok(self.store.insert(notification).await?)
    }
}
