use anyhow::Result;
use common::config::AppConfig;
use messaging::{KafkaBroker, KafkaSubscription, OrderEventPublisher, OutboundTopics};
use order_service::{OrderService, StatusConsumer};
use order_store::{PostgresConsumedEventStore, PostgresOrderStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrderService>,
}

impl AppState {
    /// Wire the store, broker, service, and status consumer from config.
    /// The consumer and its subscription are returned for the caller to spawn.
    pub async fn build(config: &AppConfig) -> Result<(Self, StatusConsumer, KafkaSubscription)> {
        info!("Connecting to database");
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        let store = Arc::new(PostgresOrderStore::new(pool.clone()));
        let consumed = Arc::new(PostgresConsumedEventStore::new(pool));

        info!("Creating Kafka broker client");
        let broker = Arc::new(KafkaBroker::new(&config.broker.brokers)?);
        let publisher = Arc::new(OrderEventPublisher::new(
            broker,
            OutboundTopics {
                created: config.broker.created_topic.clone(),
                cancelled: config.broker.cancelled_topic.clone(),
                updated: config.broker.updated_topic.clone(),
            },
        ));

        let service = Arc::new(OrderService::new(store, publisher));
        let consumer = StatusConsumer::new(service.clone(), consumed);

        let subscription = KafkaSubscription::new(
            &config.broker.brokers,
            &config.broker.group_id,
            &config.broker.status_changed_topic,
        )?;

        Ok((Self { service }, consumer, subscription))
    }
}
