//! # Event Publisher Port
//!
//! After a create or update commits, a JSON snapshot of the product is
//! published on [`PRODUCTS_TOPIC`], keyed by product id.
//!
//! ## Delivery
//! ```text
//! commit ──► tokio::spawn ──► publisher.publish("products", id, snapshot)
//!                                   │
//!                                   └── failure: warn! and drop
//! ```
//! At most once: nothing is retried and the write is never undone.

use async_trait::async_trait;
use catalog_core::Product;
use thiserror::Error;
use tokio::sync::mpsc;

/// Topic every product snapshot is published on.
pub const PRODUCTS_TOPIC: &str = "products";

/// Publication errors.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Publisher channel closed")]
    Closed,

    #[error("Broker error: {0}")]
    Broker(String),
}

/// Sends keyed payloads to a topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

/// Serializes the snapshot published for a product.
pub fn product_snapshot(product: &Product) -> Result<Vec<u8>, PublishError> {
    Ok(serde_json::to_vec(product)?)
}

// =============================================================================
// Implementations
// =============================================================================

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _topic: &str, _key: &str, _payload: Vec<u8>) -> Result<(), PublishError> {
        Ok(())
    }
}

/// One event as seen by a [`ChannelPublisher`] receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

/// Forwards events into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<PublishedEvent>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PublishedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelPublisher { tx }, rx)
    }
}

#[async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.tx
            .send(PublishedEvent {
                topic: topic.to_string(),
                key: key.to_string(),
                payload,
            })
            .map_err(|_| PublishError::Closed)
    }
}

/// Appends events to a Redis stream named after the topic.
///
/// Each entry carries two fields: `key` and `payload`.
#[cfg(feature = "redis")]
#[derive(Debug, Clone)]
pub struct RedisPublisher {
    client: redis::Client,
}

#[cfg(feature = "redis")]
impl RedisPublisher {
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, PublishError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| PublishError::Broker(e.to_string()))?;
        Ok(RedisPublisher { client })
    }
}

#[cfg(feature = "redis")]
#[async_trait]
impl EventPublisher for RedisPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?;

        let _: String = redis::cmd("XADD")
            .arg(topic)
            .arg("*")
            .arg("key")
            .arg(key)
            .arg("payload")
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_publisher_forwards() {
        let (publisher, mut rx) = ChannelPublisher::new();
        publisher
            .publish(PRODUCTS_TOPIC, "p-1", b"{}".to_vec())
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "products");
        assert_eq!(event.key, "p-1");
        assert_eq!(event.payload, b"{}".to_vec());
    }

    #[tokio::test]
    async fn test_channel_publisher_closed() {
        let (publisher, rx) = ChannelPublisher::new();
        drop(rx);
        assert!(matches!(
            publisher.publish(PRODUCTS_TOPIC, "p-1", Vec::new()).await,
            Err(PublishError::Closed)
        ));
    }

    #[test]
    fn test_snapshot_includes_private_fields() {
        let mut product = Product::new("store-1", "Ghee 1L");
        product.private.custom_code = "GH-1".to_string();
        let json: serde_json::Value =
            serde_json::from_slice(&product_snapshot(&product).unwrap()).unwrap();
        assert_eq!(json["custom_code"], "GH-1");
    }
}
