use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to create broker client: {0}")]
    ClientCreation(String),

    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("broker unavailable: {0}")]
    Unavailable(String),
}

/// A message pulled from the broker, not yet acknowledged.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub payload: Vec<u8>,
}

/// Provider-agnostic publish capability. Implementations guarantee
/// at-least-once delivery to the broker with a bounded local retry on
/// transient failure; topic routing semantics are all the core relies on.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), BrokerError>;
}

/// Provider-agnostic subscription with manual acknowledgement. Every delivery
/// must be settled one way or the other: `ack` retires it, `nack` returns it
/// to the broker for redelivery, so consumers must tolerate duplicates.
///
/// Withholding `ack` is not enough to get redelivery on offset-based brokers:
/// the fetch position advances past every polled message, so an unsettled
/// delivery would be silently skipped once a later one is acked.
#[async_trait]
pub trait BrokerSubscription: Send {
    /// Wait up to `timeout` for the next delivery; `None` means the poll
    /// window elapsed without a message.
    async fn next_delivery(&mut self, timeout: Duration) -> Result<Option<Delivery>, BrokerError>;

    /// Acknowledge the most recently returned delivery.
    async fn ack(&mut self) -> Result<(), BrokerError>;

    /// Return the most recently returned delivery to the broker so it is
    /// delivered again.
    async fn nack(&mut self) -> Result<(), BrokerError>;
}
