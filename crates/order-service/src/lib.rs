pub mod consumer;
pub mod service;

pub use consumer::{ConsumeOutcome, StatusConsumer};
pub use service::{Actor, OrderService, ServiceError, MAX_CONFLICT_RETRIES};
