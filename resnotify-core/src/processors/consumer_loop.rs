//! ConsumerLoop processor.
//!
//! The ConsumerLoop is responsible for:
//! - Acquiring a broker session and consuming with a prefetch of one
//! - Handing each delivery to the `DeliveryProcessor` and settling it
//! - Falling back to `Disconnected` on any session error and reconnecting
//!   after a backoff, with no retry ceiling
//! - Stopping between deliveries when the shutdown signal fires
//!
//! State machine:
//!
//! ```text
//! Disconnected --acquire ok--> Consuming
//! Consuming --any session error--> Disconnected --backoff--> acquire
//! ```

use crate::broker::{Broker, BrokerSession, ConnectionError, InboundDelivery};
use crate::processors::delivery::{DeliveryProcessor, Disposition};
use crate::utils::backoff::ReconnectBackoff;
use std::fmt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Unacknowledged deliveries allowed in flight; one keeps processing strictly
/// sequential.
pub const PREFETCH_COUNT: u16 = 1;

/// Connection state of the consumer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Disconnected,
    Consuming,
}

impl ConsumerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumerState::Disconnected => "disconnected",
            ConsumerState::Consuming => "consuming",
        }
    }
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session ended.
enum SessionExit {
    Shutdown,
    Failed(ConnectionError),
}

pub struct ConsumerLoop<B: Broker> {
    broker: B,
    processor: DeliveryProcessor,
    backoff: ReconnectBackoff,
    state_tx: watch::Sender<ConsumerState>,
}

impl<B: Broker> ConsumerLoop<B> {
    /// Create a new ConsumerLoop.
    ///
    /// State transitions are published on `state_tx`.
    pub fn new(
        broker: B,
        processor: DeliveryProcessor,
        backoff: ReconnectBackoff,
        state_tx: watch::Sender<ConsumerState>,
    ) -> Self {
        state_tx.send_replace(ConsumerState::Disconnected);
        Self {
            broker,
            processor,
            backoff,
            state_tx,
        }
    }

    /// Run until the shutdown signal fires.
    ///
    /// A delivery that is already being processed is always settled before
    /// the loop exits.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("ConsumerLoop started");
        let mut attempt: u32 = 0;

        loop {
            let acquired = tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown_rx) => break,

                acquired = self.broker.acquire() => acquired,
            };

            match acquired {
                Ok(session) => {
                    attempt = 0;
                    match self.consume(session, &mut shutdown_rx).await {
                        SessionExit::Shutdown => break,
                        SessionExit::Failed(e) => {
                            warn!(error = %e, "Consumer session failed");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Failed to connect to broker");
                }
            }

            self.set_state(ConsumerState::Disconnected);
            let delay = self.backoff.delay(attempt);
            attempt = attempt.saturating_add(1);
            info!(
                delay_ms = delay.as_millis() as u64,
                attempt, "Consumer disconnected, retrying"
            );

            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown_rx) => break,

                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_state(ConsumerState::Disconnected);
        info!("ConsumerLoop shutdown complete");
    }

    /// Consume from one session until it fails or shutdown is requested.
    async fn consume(
        &mut self,
        mut session: B::Session,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> SessionExit {
        if let Err(e) = Self::start(&mut session).await {
            return SessionExit::Failed(e);
        }
        self.set_state(ConsumerState::Consuming);
        info!("Starting to consume messages");

        loop {
            let next = tokio::select! {
                biased;

                _ = wait_for_shutdown(shutdown_rx) => None,

                next = session.next_delivery() => Some(next),
            };

            let Some(next) = next else {
                info!("ConsumerLoop received shutdown signal");
                if let Err(e) = session.close().await {
                    debug!(error = %e, "Failed to close broker session cleanly");
                }
                return SessionExit::Shutdown;
            };

            let delivery = match next {
                Ok(delivery) => delivery,
                Err(e) => return SessionExit::Failed(e),
            };

            if let Err(e) = self.dispatch(&mut session, delivery).await {
                return SessionExit::Failed(e);
            }
        }
    }

    async fn start(session: &mut B::Session) -> Result<(), ConnectionError> {
        session.set_prefetch(PREFETCH_COUNT).await?;
        session.start_consuming().await
    }

    /// Process one delivery and settle it with the broker.
    async fn dispatch(
        &mut self,
        session: &mut B::Session,
        delivery: InboundDelivery,
    ) -> Result<(), ConnectionError> {
        let tag = delivery.delivery_tag;
        match self.processor.handle(&delivery).await {
            Disposition::Ack => session.ack(tag).await,
            Disposition::Requeue => session.nack(tag, true).await,
            Disposition::DeadLetter { reason } => {
                session.dead_letter(&delivery, &reason).await?;
                session.ack(tag).await
            }
        }
    }

    fn set_state(&self, state: ConsumerState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Consumer state changed");
        }
    }
}

/// Resolves once shutdown is requested or the shutdown sender is dropped.
async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow_and_update() {
            return;
        }
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}
