//! Consumer thread.
//!
//! The consumer loop runs on its own OS thread with a current-thread tokio
//! runtime, so reconnect backoff and storage retries never occupy the
//! workers serving HTTP requests.

use crate::store::StoreBackend;
use resnotify_core::broker::AmqpBroker;
use resnotify_core::config::{BrokerConfig, ConsumerConfig};
use resnotify_core::processors::{ConsumerLoop, ConsumerState, DeliveryProcessor};
use std::thread::JoinHandle;
use tokio::sync::watch;

/// Pool size for the consumer's own store handle; deliveries are processed
/// one at a time.
const CONSUMER_POOL_SIZE: u32 = 2;

pub const CONSUMER_THREAD_NAME: &str = "reservation-consumer";

/// Start the consumer loop on a dedicated thread.
///
/// The thread exits once `shutdown_rx` flips to `true` and any in-flight
/// delivery has been settled.
pub fn spawn_consumer(
    backend: StoreBackend,
    broker_config: BrokerConfig,
    consumer_config: ConsumerConfig,
    state_tx: watch::Sender<ConsumerState>,
    shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(CONSUMER_THREAD_NAME.to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to build consumer runtime");
                    return;
                }
            };

            runtime.block_on(async move {
                let opened = match backend.open(CONSUMER_POOL_SIZE) {
                    Ok(opened) => opened,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to open consumer store");
                        return;
                    }
                };

                let processor = DeliveryProcessor::new(
                    opened.store.clone(),
                    consumer_config.max_delivery_attempts,
                    consumer_config.storage_retry_delay,
                );
                let consumer = ConsumerLoop::new(
                    AmqpBroker::new(broker_config),
                    processor,
                    consumer_config.backoff,
                    state_tx,
                );
                consumer.run(shutdown_rx).await;

                opened.close().await;
            });
        })
}
