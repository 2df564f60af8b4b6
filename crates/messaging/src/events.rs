use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::status::OrderStatus;

/// Outbound event kinds, named after the topics they route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEventType {
    #[serde(rename = "order.created")]
    Created,
    #[serde(rename = "order.cancelled")]
    Cancelled,
    #[serde(rename = "order.updated")]
    Updated,
}

impl OrderEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventType::Created => "order.created",
            OrderEventType::Cancelled => "order.cancelled",
            OrderEventType::Updated => "order.updated",
        }
    }
}

/// Payload published after a committed order mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub event_type: OrderEventType,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
    pub correlation_id: Uuid,
}

/// Payload the saga orchestrator publishes on `order.status.changed`.
/// `event_id` is the idempotency key for redelivery detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChangedEvent {
    pub event_id: Uuid,
    pub order_id: Uuid,
    pub new_status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
    pub source_service: String,
}
