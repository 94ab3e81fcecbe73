//! Notification publishing
//!
//! Notifications are handed to the mailer through a queue per routing key,
//! all under one exchange name. Delivery is the mailer's job; publishing only
//! guarantees the message was enqueued.

use anyhow::{Context, Result};
use async_trait::async_trait;
use common::RedisPool;
use tracing::debug;

use crate::models::Notification;

/// Default exchange name
pub const DEFAULT_EXCHANGE: &str = "auth";

/// Sink for outbound notifications
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Enqueue a notification on its routing key
    async fn publish(&self, notification: &Notification) -> Result<()>;
}

/// Queue name of a routing key under an exchange
pub fn queue_name(exchange: &str, routing_key: &str) -> String {
    format!("{exchange}:{routing_key}")
}

/// Publishes notifications onto Redis lists named `<exchange>:<routing_key>`
#[derive(Clone)]
pub struct RedisPublisher {
    redis_pool: RedisPool,
    exchange: String,
}

impl RedisPublisher {
    /// Create a new publisher
    pub fn new(redis_pool: RedisPool, exchange: impl Into<String>) -> Self {
        Self {
            redis_pool,
            exchange: exchange.into(),
        }
    }

    /// Exchange the publisher writes under
    pub fn exchange(&self) -> &str {
        &self.exchange
    }
}

#[async_trait]
impl NotificationPublisher for RedisPublisher {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        let payload = notification
            .to_json()
            .context("Failed to encode notification")?;
        let queue = queue_name(&self.exchange, notification.routing_key());

        self.redis_pool
            .push(&queue, &payload)
            .await
            .with_context(|| format!("Failed to publish notification to {queue}"))?;

        debug!("Notification for {} queued on {}", notification.email(), queue);
        Ok(())
    }
}
