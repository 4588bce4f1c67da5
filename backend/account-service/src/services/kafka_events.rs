/// Kafka event producer for account service
use crate::config::KafkaSettings;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("refusing to publish an empty payload to {topic}")]
    EmptyPayload { topic: String },

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to create Kafka producer: {0}")]
    Producer(#[source] rdkafka::error::KafkaError),

    #[error("failed to publish event to Kafka topic {topic}: {source}")]
    Delivery {
        topic: String,
        #[source]
        source: rdkafka::error::KafkaError,
    },
}

/// Keyed, at-least-once event channel
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn produce(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Kafka event producer service
#[derive(Clone)]
pub struct KafkaEventProducer {
    producer: Arc<FutureProducer>,
    send_timeout: Duration,
}

impl KafkaEventProducer {
    pub fn new(settings: &KafkaSettings) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", settings.brokers.join(","))
            .set("client.id", "account-service")
            .set("enable.idempotence", "true")
            .set("acks", &settings.acks)
            .set("message.timeout.ms", settings.producer_timeout_ms.to_string())
            .create()
            .map_err(PublishError::Producer)?;

        Ok(Self {
            producer: Arc::new(producer),
            send_timeout: Duration::from_millis(settings.producer_timeout_ms),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaEventProducer {
    async fn produce(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        if payload.is_empty() {
            return Err(PublishError::EmptyPayload {
                topic: topic.to_string(),
            });
        }

        let record = FutureRecord::to(topic).key(key).payload(payload);

        let (partition, offset) = self
            .producer
            .send(record, self.send_timeout)
            .await
            .map_err(|(error, _)| {
                warn!(topic, error = %error, "Failed to send Kafka event");
                PublishError::Delivery {
                    topic: topic.to_string(),
                    source: error,
                }
            })?;

        debug!(topic, partition, offset, "Kafka event delivered");
        Ok(())
    }
}

/// Publisher used when no broker is configured; accepts and drops events
#[derive(Debug, Clone, Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn produce(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        if payload.is_empty() {
            return Err(PublishError::EmptyPayload {
                topic: topic.to_string(),
            });
        }
        warn!(topic, key, "Kafka not configured; dropping event");
        Ok(())
    }
}
