//! Async RabbitMQ publisher for classified HubSpot events.
//!
//! The publisher is shared across request handlers and keeps one connection
//! and channel open, reconnecting lazily when the channel drops.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::types::QueuedEvent;
use crate::events::ParsedRecord;
use crate::handler::EventHandler;

/// Event handler publishing each classified event to a durable queue.
#[derive(Clone)]
pub struct EventPublisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    queue: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl EventPublisher {
    /// Create a publisher; no connection is made until the first publish.
    pub fn new(url: String, queue: String) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                queue,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    pub fn queue(&self) -> &str {
        &self.inner.queue
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Double-check after acquiring write lock
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_publisher_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        ch.queue_declare(
            &self.inner.queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare events queue")?;

        info!(queue = %self.inner.queue, "rabbitmq_publisher_connected");

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Publish one event as a persistent JSON message.
    pub async fn publish(&self, event: &QueuedEvent) -> Result<()> {
        let channel = self.ensure_connected().await?;

        let body = serde_json::to_vec(event).context("Failed to serialize event")?;
        let message_id = event.message_id();

        channel
            .basic_publish(
                "",
                &self.inner.queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into())
                    .with_type(event.event_type.clone().into())
                    .with_message_id(message_id.clone().into()),
            )
            .await
            .context("Failed to publish to events queue")?
            .await
            .context("Failed to confirm publish")?;

        info!(
            queue = %self.inner.queue,
            message_id = %message_id,
            event_type = %event.event_type,
            body_length = body.len(),
            "rabbitmq_event_published"
        );

        Ok(())
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_publisher_closed");
    }
}

impl EventHandler for EventPublisher {
    fn handle<'a>(&'a self, parsed: &'a ParsedRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match &parsed.result {
                Ok(event) => self.publish(&QueuedEvent::from(event)).await,
                Err(e) => {
                    // Already logged at classification time
                    debug!(error = %e, "rabbitmq_event_not_published");
                    Ok(())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::parse_batch;

    #[test]
    fn test_publisher_creation() {
        let publisher = EventPublisher::new(
            "amqp://localhost:5672".to_string(),
            "hubspot_events".to_string(),
        );

        assert_eq!(publisher.queue(), "hubspot_events");
        assert!(Arc::strong_count(&publisher.inner) == 1);
    }

    #[tokio::test]
    async fn test_failed_records_are_not_published() {
        // Unroutable URL: any publish attempt would fail to connect.
        let publisher = EventPublisher::new(
            "amqp://127.0.0.1:1/%2f".to_string(),
            "hubspot_events".to_string(),
        );
        let parsed = parse_batch(br#"[{"objectId": 1, "eventId": 2, "subscriptionType": "x.y"}]"#)
            .unwrap();

        assert!(publisher.handle(&parsed[0]).await.is_ok());
        assert!(publisher.inner.channel.read().await.is_none());
    }
}
