use super::{Broker, BrokerSession, ConnectionError, InboundDelivery};
use crate::config::BrokerConfig;
use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind};
use tracing::{debug, info, warn};

/// AMQP reply code for a normal close.
const REPLY_SUCCESS: u16 = 200;

/// Persistent delivery mode for dead-lettered copies.
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Header carrying the reason a message was dead-lettered.
pub const FAILURE_REASON_HEADER: &str = "x-failure-reason";

/// RabbitMQ broker reached through `lapin`.
#[derive(Debug, Clone)]
pub struct AmqpBroker {
    config: BrokerConfig,
}

impl AmqpBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    /// Open a channel and declare the queue topology on it.
    async fn prepare_channel(&self, connection: &Connection) -> Result<Channel, ConnectionError> {
        let channel = connection.create_channel().await?;
        let durable = QueueDeclareOptions {
            durable: true,
            ..QueueDeclareOptions::default()
        };

        channel
            .queue_declare(&self.config.queue, durable, FieldTable::default())
            .await?;
        channel
            .queue_declare(&self.config.dead_letter_queue, durable, FieldTable::default())
            .await?;

        if let Some(binding) = &self.config.exchange {
            channel
                .exchange_declare(
                    &binding.exchange,
                    ExchangeKind::Topic,
                    ExchangeDeclareOptions {
                        durable: true,
                        ..ExchangeDeclareOptions::default()
                    },
                    FieldTable::default(),
                )
                .await?;
            channel
                .queue_bind(
                    &self.config.queue,
                    &binding.exchange,
                    &binding.binding_key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await?;
            debug!(
                queue = %self.config.queue,
                exchange = %binding.exchange,
                binding_key = %binding.binding_key,
                "Queue bound to exchange"
            );
        }

        Ok(channel)
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    type Session = AmqpSession;

    async fn acquire(&self) -> Result<AmqpSession, ConnectionError> {
        let connection =
            Connection::connect(&self.config.amqp_url, ConnectionProperties::default()).await?;

        match self.prepare_channel(&connection).await {
            Ok(channel) => {
                info!(queue = %self.config.queue, "Connected to RabbitMQ");
                Ok(AmqpSession {
                    connection,
                    channel,
                    consumer: None,
                    queue: self.config.queue.clone(),
                    dead_letter_queue: self.config.dead_letter_queue.clone(),
                    consumer_tag: self.config.consumer_tag.clone(),
                })
            }
            Err(e) => {
                if let Err(close_err) = connection.close(REPLY_SUCCESS, "setup failed").await {
                    debug!(error = %close_err, "Failed to close connection after setup error");
                }
                Err(e)
            }
        }
    }
}

/// One connection and channel pair owned by the consumer loop.
pub struct AmqpSession {
    connection: Connection,
    channel: Channel,
    consumer: Option<Consumer>,
    queue: String,
    dead_letter_queue: String,
    consumer_tag: String,
}

impl AmqpSession {
    /// Fail fast once the broker has closed the channel or connection.
    ///
    /// A consumer on a closed channel can stay silent instead of ending its
    /// stream.
    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if !self.connection.status().connected() {
            return Err(ConnectionError::Closed(format!(
                "connection is {:?}",
                self.connection.status().state()
            )));
        }
        if !self.channel.status().connected() {
            return Err(ConnectionError::Closed(format!(
                "channel {} is {:?}",
                self.channel.id(),
                self.channel.status().state()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerSession for AmqpSession {
    async fn set_prefetch(&mut self, count: u16) -> Result<(), ConnectionError> {
        self.channel
            .basic_qos(count, BasicQosOptions::default())
            .await?;
        Ok(())
    }

    async fn start_consuming(&mut self) -> Result<(), ConnectionError> {
        let consumer = self
            .channel
            .basic_consume(
                &self.queue,
                &self.consumer_tag,
                BasicConsumeOptions {
                    no_ack: false,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        self.consumer = Some(consumer);
        Ok(())
    }

    async fn next_delivery(&mut self) -> Result<InboundDelivery, ConnectionError> {
        self.ensure_open()?;
        let consumer = self
            .consumer
            .as_mut()
            .ok_or(ConnectionError::NotConsuming)?;

        match consumer.next().await {
            Some(Ok(delivery)) => Ok(InboundDelivery {
                delivery_tag: delivery.delivery_tag,
                message_id: delivery
                    .properties
                    .message_id()
                    .as_ref()
                    .map(|id| id.as_str().to_owned()),
                redelivered: delivery.redelivered,
                payload: delivery.data,
            }),
            Some(Err(e)) => Err(e.into()),
            None => Err(ConnectionError::ConsumerCancelled),
        }
    }

    async fn ack(&mut self, delivery_tag: u64) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    async fn nack(&mut self, delivery_tag: u64, requeue: bool) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        self.channel
            .basic_nack(
                delivery_tag,
                BasicNackOptions {
                    multiple: false,
                    requeue,
                },
            )
            .await?;
        Ok(())
    }

    async fn dead_letter(
        &mut self,
        delivery: &InboundDelivery,
        reason: &str,
    ) -> Result<(), ConnectionError> {
        let mut headers = FieldTable::default();
        headers.insert(
            FAILURE_REASON_HEADER.into(),
            AMQPValue::LongString(reason.into()),
        );

        let mut properties = BasicProperties::default()
            .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
            .with_headers(headers);
        if let Some(message_id) = &delivery.message_id {
            properties = properties.with_message_id(message_id.as_str().into());
        }

        self.channel
            .basic_publish(
                "",
                &self.dead_letter_queue,
                BasicPublishOptions::default(),
                &delivery.payload,
                properties,
            )
            .await?
            .await?;

        warn!(
            delivery_tag = delivery.delivery_tag,
            queue = %self.dead_letter_queue,
            reason,
            "Message routed to dead-letter queue"
        );
        Ok(())
    }

    async fn close(self) -> Result<(), ConnectionError> {
        self.channel.close(REPLY_SUCCESS, "consumer shutdown").await?;
        self.connection
            .close(REPLY_SUCCESS, "consumer shutdown")
            .await?;
        Ok(())
    }
}
