use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use common::metrics;
use domain::errors::OrderError;
use domain::order::{Order, OrderItem, StatusHistoryEntry};
use domain::state_machine::{self, TransitionRejection, TransitionSource};
use domain::status::OrderStatus;
use messaging::events::OrderEventType;
use messaging::publisher::OrderEventPublisher;
use order_store::{OrderFilter, OrderStore, Page, StoreError};

/// How many times a mutation re-reads and retries after losing the optimistic
/// version race before surfacing a transient failure.
pub const MAX_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] OrderError),

    #[error("order not found: {0}")]
    NotFound(Uuid),

    #[error("caller is not permitted to act on order {0}")]
    Forbidden(Uuid),

    #[error(transparent)]
    TransitionRejected(#[from] TransitionRejection),

    #[error("conflicting writes for order {0}, retries exhausted")]
    ConflictExhausted(Uuid),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Store(other),
        }
    }
}

/// Already-authenticated caller identity, handed in by the transport boundary.
/// The core trusts it and only checks ownership, not credentials.
#[derive(Debug, Clone)]
pub struct Actor {
    pub customer_id: Option<Uuid>,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            roles: Vec::new(),
        }
    }

    pub fn new(customer_id: Option<Uuid>, roles: Vec<String>) -> Self {
        Self { customer_id, roles }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case("admin"))
    }

    fn owns(&self, order: &Order) -> bool {
        self.customer_id == Some(order.customer_id)
    }
}

/// Single source of truth for order business invariants. Both the API surface
/// and the status consumer mutate orders through here, so every write goes
/// state-machine-validate → conditional store write → publish-after-commit.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    publisher: Arc<OrderEventPublisher>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, publisher: Arc<OrderEventPublisher>) -> Self {
        Self { store, publisher }
    }

    pub async fn create_order(
        &self,
        customer_id: Uuid,
        items: Vec<OrderItem>,
        payment_method_ref: String,
        tax_amount: f64,
        shipping_amount: f64,
    ) -> Result<Order, ServiceError> {
        let order = Order::new(
            customer_id,
            items,
            payment_method_ref,
            tax_amount,
            shipping_amount,
        )?;
        self.store.create(&order).await?;

        info!(order_id = %order.id, customer_id = %customer_id, "order created");
        metrics::record_mutation("create_order", "ok");

        self.emit(OrderEventType::Created, &order, Uuid::new_v4())
            .await;
        Ok(order)
    }

    /// Customer- or admin-initiated cancellation. Ownership is checked here;
    /// legality of the transition is the state machine's call.
    pub async fn cancel_order(&self, order_id: Uuid, actor: &Actor) -> Result<Order, ServiceError> {
        let order = self.store.get_by_id(order_id).await?;
        if !actor.is_admin() && !actor.owns(&order) {
            warn!(order_id = %order_id, "cancel rejected: caller does not own order");
            return Err(ServiceError::Forbidden(order_id));
        }

        let updated = self
            .apply_transition(order, OrderStatus::Cancelled, TransitionSource::Api, None)
            .await?;

        metrics::record_mutation("cancel_order", "ok");
        self.emit(OrderEventType::Cancelled, &updated, Uuid::new_v4())
            .await;
        Ok(updated)
    }

    /// Shared transition path for admin API calls and the status consumer.
    /// The history entry is tagged with `source` and the correlation id of the
    /// triggering event, if any.
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        source: TransitionSource,
        correlation_id: Option<Uuid>,
    ) -> Result<Order, ServiceError> {
        let order = self.store.get_by_id(order_id).await?;
        let updated = self
            .apply_transition(order, new_status, source, correlation_id)
            .await?;

        metrics::record_mutation("update_order_status", "ok");
        let event_type = if new_status == OrderStatus::Cancelled {
            OrderEventType::Cancelled
        } else {
            OrderEventType::Updated
        };
        self.emit(
            event_type,
            &updated,
            correlation_id.unwrap_or_else(Uuid::new_v4),
        )
        .await;
        Ok(updated)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        Ok(self.store.get_by_id(order_id).await?)
    }

    pub async fn list_by_customer(
        &self,
        customer_id: Uuid,
        page: Page,
    ) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.list_by_customer(customer_id, page).await?)
    }

    pub async fn search(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.search(filter, page).await?)
    }

    /// Validate-then-persist with bounded conflict retry. After losing the
    /// version race the order is re-read and the transition re-validated
    /// against the fresh status, so a concurrent writer that moved the order
    /// into a state where the transition is illegal turns the retry into a
    /// rejection, not a silent overwrite.
    async fn apply_transition(
        &self,
        mut order: Order,
        new_status: OrderStatus,
        source: TransitionSource,
        correlation_id: Option<Uuid>,
    ) -> Result<Order, ServiceError> {
        let order_id = order.id;

        for attempt in 1..=MAX_CONFLICT_RETRIES {
            state_machine::validate(order.status, new_status, source)?;

            let entry =
                StatusHistoryEntry::new(Some(order.status), new_status, source, correlation_id);

            match self
                .store
                .update_status(order_id, order.version, new_status, entry)
                .await
            {
                Ok(updated) => {
                    info!(
                        order_id = %order_id,
                        from = %order.status,
                        to = %new_status,
                        source = ?source,
                        "order status transition applied"
                    );
                    metrics::record_transition(
                        order.status.as_str(),
                        new_status.as_str(),
                        match source {
                            TransitionSource::Api => "api",
                            TransitionSource::Saga => "saga",
                        },
                    );
                    return Ok(updated);
                }
                Err(StoreError::ConcurrencyConflict { .. }) => {
                    warn!(
                        order_id = %order_id,
                        attempt,
                        "optimistic write lost, re-reading order"
                    );
                    metrics::record_mutation("update_order_status", "conflict");
                    order = self.store.get_by_id(order_id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::ConflictExhausted(order_id))
    }

    /// Publish-after-commit: the order mutation is already durable, so a
    /// publish failure is logged and counted but never rolls anything back.
    async fn emit(&self, event_type: OrderEventType, order: &Order, correlation_id: Uuid) {
        if let Err(e) = self.publisher.publish(event_type, order, correlation_id).await {
            warn!(
                order_id = %order.id,
                event_type = event_type.as_str(),
                error = %e,
                "failed to publish order event; mutation remains committed"
            );
            metrics::record_publish_failure(event_type.as_str());
        }
    }
}
