pub mod broker;
pub mod events;
pub mod kafka;
pub mod publisher;

pub use broker::{BrokerError, BrokerSubscription, Delivery, MessageBroker};
pub use events::{OrderEvent, OrderEventType, OrderStatusChangedEvent};
pub use kafka::{KafkaBroker, KafkaSubscription};
pub use publisher::{OrderEventPublisher, OutboundTopics};
