use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use domain::order::Order;

use super::broker::{BrokerError, MessageBroker};
use super::events::{OrderEvent, OrderEventType};

/// Topic names for the three outbound event streams, injected from
/// configuration so the core stays provider-agnostic.
#[derive(Debug, Clone)]
pub struct OutboundTopics {
    pub created: String,
    pub cancelled: String,
    pub updated: String,
}

impl Default for OutboundTopics {
    fn default() -> Self {
        Self {
            created: "order.created".to_string(),
            cancelled: "order.cancelled".to_string(),
            updated: "order.updated".to_string(),
        }
    }
}

impl OutboundTopics {
    fn topic_for(&self, event_type: OrderEventType) -> &str {
        match event_type {
            OrderEventType::Created => &self.created,
            OrderEventType::Cancelled => &self.cancelled,
            OrderEventType::Updated => &self.updated,
        }
    }
}

/// Emits order lifecycle events after a successful mutation. Publishing
/// happens after the store commit; a failure here is the caller's to log,
/// never to roll back.
pub struct OrderEventPublisher {
    broker: Arc<dyn MessageBroker>,
    topics: OutboundTopics,
}

impl OrderEventPublisher {
    pub fn new(broker: Arc<dyn MessageBroker>, topics: OutboundTopics) -> Self {
        Self { broker, topics }
    }

    pub async fn publish(
        &self,
        event_type: OrderEventType,
        order: &Order,
        correlation_id: Uuid,
    ) -> Result<(), BrokerError> {
        let event = OrderEvent {
            event_type,
            order_id: order.id,
            customer_id: order.customer_id,
            status: order.status,
            occurred_at: Utc::now(),
            correlation_id,
        };

        let payload = serde_json::to_vec(&event)?;
        let topic = self.topics.topic_for(event_type);

        self.broker
            .publish(topic, &order.id.to_string(), &payload)
            .await?;

        debug!(
            topic,
            order_id = %order.id,
            correlation_id = %correlation_id,
            "published order event"
        );
        Ok(())
    }
}
