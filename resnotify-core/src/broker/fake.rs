//! In-process broker double for consumer loop tests.
//!
//! Mimics the parts of RabbitMQ the consumer relies on: a FIFO queue, manual
//! acks, requeue on nack, and return of unacked deliveries to the queue when
//! a session goes away.

#![allow(clippy::unwrap_used)]

use super::{Broker, BrokerSession, ConnectionError, InboundDelivery};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueuedMessage {
    pub payload: Vec<u8>,
    pub message_id: Option<String>,
    pub redelivered: bool,
}

#[derive(Debug, Default)]
pub(crate) struct FakeBrokerState {
    pub queue: VecDeque<QueuedMessage>,
    pub acked: Vec<Vec<u8>>,
    pub nacked: Vec<(Vec<u8>, bool)>,
    pub dead_lettered: Vec<(Vec<u8>, String)>,
    pub acquire_attempts: u32,
    pub prefetch: Vec<u16>,
    pub sessions_closed: u32,
    failing_acquires: u32,
    /// Per-session delivery limit applied to the next acquired session.
    drop_next_session_after: Option<usize>,
    fail_next_ack: bool,
    next_tag: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBroker {
    state: Arc<Mutex<FakeBrokerState>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, payload: impl Into<Vec<u8>>) {
        self.publish_with_id(payload, None);
    }

    pub fn publish_with_id(&self, payload: impl Into<Vec<u8>>, message_id: Option<&str>) {
        self.state.lock().unwrap().queue.push_back(QueuedMessage {
            payload: payload.into(),
            message_id: message_id.map(str::to_string),
            redelivered: false,
        });
    }

    /// The next `n` calls to `acquire` fail.
    pub fn fail_next_acquires(&self, n: u32) {
        self.state.lock().unwrap().failing_acquires = n;
    }

    /// The next acquired session drops its connection after handing out
    /// `n` deliveries.
    pub fn drop_next_session_after(&self, n: usize) {
        self.state.lock().unwrap().drop_next_session_after = Some(n);
    }

    /// The next ack fails as if the connection dropped mid-ack.
    pub fn fail_next_ack(&self) {
        self.state.lock().unwrap().fail_next_ack = true;
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&FakeBrokerState) -> R) -> R {
        f(&self.state.lock().unwrap())
    }
}

#[async_trait]
impl Broker for FakeBroker {
    type Session = FakeSession;

    async fn acquire(&self) -> Result<FakeSession, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.acquire_attempts += 1;
        if state.failing_acquires > 0 {
            state.failing_acquires -= 1;
            return Err(ConnectionError::Closed("broker unreachable".to_string()));
        }
        Ok(FakeSession {
            state: self.state.clone(),
            consuming: false,
            in_flight: None,
            delivered: 0,
            drop_after: state.drop_next_session_after.take(),
        })
    }
}

pub(crate) struct FakeSession {
    state: Arc<Mutex<FakeBrokerState>>,
    consuming: bool,
    in_flight: Option<(u64, QueuedMessage)>,
    delivered: usize,
    drop_after: Option<usize>,
}

impl FakeSession {
    fn take_in_flight(&mut self, delivery_tag: u64) -> Result<QueuedMessage, ConnectionError> {
        match self.in_flight.take() {
            Some((tag, message)) if tag == delivery_tag => Ok(message),
            other => {
                self.in_flight = other;
                Err(ConnectionError::Closed(format!(
                    "unknown delivery tag {delivery_tag}"
                )))
            }
        }
    }

    fn try_next(&mut self) -> Option<Result<InboundDelivery, ConnectionError>> {
        if self.drop_after.is_some_and(|limit| self.delivered >= limit) {
            return Some(Err(ConnectionError::Closed(
                "simulated connection drop".to_string(),
            )));
        }
        let mut state = self.state.lock().unwrap();
        let message = state.queue.pop_front()?;
        state.next_tag += 1;
        let tag = state.next_tag;
        self.delivered += 1;
        self.in_flight = Some((tag, message.clone()));
        Some(Ok(InboundDelivery {
            delivery_tag: tag,
            payload: message.payload,
            message_id: message.message_id,
            redelivered: message.redelivered,
        }))
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if let Some((_, mut message)) = self.in_flight.take() {
            message.redelivered = true;
            self.state.lock().unwrap().queue.push_front(message);
        }
    }
}

#[async_trait]
impl BrokerSession for FakeSession {
    async fn set_prefetch(&mut self, count: u16) -> Result<(), ConnectionError> {
        self.state.lock().unwrap().prefetch.push(count);
        Ok(())
    }

    async fn start_consuming(&mut self) -> Result<(), ConnectionError> {
        self.consuming = true;
        Ok(())
    }

    async fn next_delivery(&mut self) -> Result<InboundDelivery, ConnectionError> {
        if !self.consuming {
            return Err(ConnectionError::NotConsuming);
        }
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            if let Some(result) = self.try_next() {
                return result;
            }
        }
    }

    async fn ack(&mut self, delivery_tag: u64) -> Result<(), ConnectionError> {
        {
            let mut state = self.state.lock().unwrap();
            if state.fail_next_ack {
                state.fail_next_ack = false;
                return Err(ConnectionError::Closed("simulated drop during ack".to_string()));
            }
        }
        let message = self.take_in_flight(delivery_tag)?;
        self.state.lock().unwrap().acked.push(message.payload);
        Ok(())
    }

    async fn nack(&mut self, delivery_tag: u64, requeue: bool) -> Result<(), ConnectionError> {
        let mut message = self.take_in_flight(delivery_tag)?;
        let mut state = self.state.lock().unwrap();
        state.nacked.push((message.payload.clone(), requeue));
        if requeue {
            message.redelivered = true;
            state.queue.push_front(message);
        }
        Ok(())
    }

    async fn dead_letter(
        &mut self,
        delivery: &InboundDelivery,
        reason: &str,
    ) -> Result<(), ConnectionError> {
        self.state
            .lock()
            .unwrap()
            .dead_lettered
            .push((delivery.payload.clone(), reason.to_string()));
        Ok(())
    }

    async fn close(mut self) -> Result<(), ConnectionError> {
        self.consuming = false;
        self.state.lock().unwrap().sessions_closed += 1;
        Ok(())
    }
}
