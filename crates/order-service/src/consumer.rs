use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use common::metrics;
use domain::state_machine::TransitionSource;
use messaging::broker::BrokerSubscription;
use messaging::events::OrderStatusChangedEvent;
use order_store::ConsumedEventStore;

use crate::service::{OrderService, ServiceError};

const POLL_TIMEOUT: Duration = Duration::from_secs(1);
const BROKER_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// What became of one delivered message. Everything except `Retry` is
/// acknowledged; `Retry` is returned to the broker for redelivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Transition validated and persisted.
    Applied,
    /// `event_id` was already consumed; broker redelivery, dropped.
    Duplicate,
    /// Permanently unprocessable (state machine rejection, unknown order);
    /// recorded as consumed so redelivery stays a no-op.
    Discarded,
    /// Transient failure; not recorded, negatively acknowledged.
    Retry,
}

impl ConsumeOutcome {
    pub fn should_ack(&self) -> bool {
        !matches!(self, ConsumeOutcome::Retry)
    }

    fn as_str(&self) -> &'static str {
        match self {
            ConsumeOutcome::Applied => "applied",
            ConsumeOutcome::Duplicate => "duplicate",
            ConsumeOutcome::Discarded => "discarded",
            ConsumeOutcome::Retry => "retry",
        }
    }
}

/// Background subscriber reconciling saga status updates into the same
/// service layer the API uses. Deliveries are deduplicated by `event_id`
/// before the state machine sees them.
pub struct StatusConsumer {
    service: Arc<OrderService>,
    consumed: Arc<dyn ConsumedEventStore>,
}

impl StatusConsumer {
    pub fn new(service: Arc<OrderService>, consumed: Arc<dyn ConsumedEventStore>) -> Self {
        Self { service, consumed }
    }

    /// Handle one status-changed event end to end.
    pub async fn process(&self, event: &OrderStatusChangedEvent) -> ConsumeOutcome {
        let outcome = self.process_inner(event).await;
        metrics::record_consumer_outcome(outcome.as_str());
        outcome
    }

    async fn process_inner(&self, event: &OrderStatusChangedEvent) -> ConsumeOutcome {
        match self.consumed.is_consumed(event.event_id).await {
            Ok(true) => {
                debug!(
                    event_id = %event.event_id,
                    order_id = %event.order_id,
                    "event already consumed, dropping redelivery"
                );
                return ConsumeOutcome::Duplicate;
            }
            Ok(false) => {}
            Err(e) => {
                error!(event_id = %event.event_id, error = %e, "idempotency check failed");
                return ConsumeOutcome::Retry;
            }
        }

        let result = self
            .service
            .update_order_status(
                event.order_id,
                event.new_status,
                TransitionSource::Saga,
                Some(event.event_id),
            )
            .await;

        match result {
            Ok(order) => {
                info!(
                    event_id = %event.event_id,
                    order_id = %order.id,
                    status = %order.status,
                    source_service = %event.source_service,
                    "saga status update applied"
                );
                self.record(event, ConsumeOutcome::Applied).await
            }
            // A transition the state machine disallows will never become
            // allowed by retrying; the same goes for an order that does not
            // exist. Out-of-order deliveries land here and are dropped rather
            // than buffered or reordered.
            Err(ServiceError::TransitionRejected(rejection)) => {
                warn!(
                    event_id = %event.event_id,
                    order_id = %event.order_id,
                    requested_status = %event.new_status,
                    source_service = %event.source_service,
                    rejection = %rejection,
                    "saga status update rejected by state machine, discarding event"
                );
                self.record(event, ConsumeOutcome::Discarded).await
            }
            Err(ServiceError::NotFound(order_id)) => {
                warn!(
                    event_id = %event.event_id,
                    order_id = %order_id,
                    "saga status update for unknown order, discarding event"
                );
                self.record(event, ConsumeOutcome::Discarded).await
            }
            Err(ServiceError::ConflictExhausted(order_id)) => {
                warn!(
                    event_id = %event.event_id,
                    order_id = %order_id,
                    "conflict retries exhausted, leaving event for redelivery"
                );
                ConsumeOutcome::Retry
            }
            Err(ServiceError::Store(e)) => {
                error!(
                    event_id = %event.event_id,
                    order_id = %event.order_id,
                    error = %e,
                    "store failure, leaving event for redelivery"
                );
                ConsumeOutcome::Retry
            }
            // Validation and ownership errors cannot arise from this call
            // shape; treat them as unprocessable rather than crash or spin.
            Err(e @ (ServiceError::Validation(_) | ServiceError::Forbidden(_))) => {
                error!(
                    event_id = %event.event_id,
                    order_id = %event.order_id,
                    error = %e,
                    "unexpected service error, discarding event"
                );
                self.record(event, ConsumeOutcome::Discarded).await
            }
        }
    }

    async fn record(&self, event: &OrderStatusChangedEvent, outcome: ConsumeOutcome) -> ConsumeOutcome {
        match self
            .consumed
            .mark_consumed(event.event_id, event.order_id)
            .await
        {
            Ok(()) => outcome,
            // The transition is committed but unrecorded: leave the message
            // unacked. The redelivery re-runs through the state machine,
            // which rejects the already-applied transition and records it.
            Err(e) => {
                error!(event_id = %event.event_id, error = %e, "failed to record consumed event");
                ConsumeOutcome::Retry
            }
        }
    }

    /// Long-lived pump: pull, decode, process, settle. Runs until the task is
    /// aborted at shutdown.
    ///
    /// Every delivery is settled: acknowledged when the outcome is final, or
    /// returned to the broker for redelivery when it is transient. Skipping
    /// the negative ack would let the subscription's position slide past the
    /// failed message and lose the transition.
    pub async fn run<S: BrokerSubscription>(self, mut subscription: S) {
        info!("status consumer started");

        loop {
            match subscription.next_delivery(POLL_TIMEOUT).await {
                Ok(Some(delivery)) => {
                    let event: OrderStatusChangedEvent =
                        match serde_json::from_slice(&delivery.payload) {
                            Ok(event) => event,
                            Err(e) => {
                                error!(error = %e, "malformed status event payload, dropping");
                                if let Err(e) = subscription.ack().await {
                                    error!(error = %e, "failed to ack malformed message");
                                }
                                continue;
                            }
                        };

                    let outcome = self.process(&event).await;
                    if outcome.should_ack() {
                        if let Err(e) = subscription.ack().await {
                            error!(
                                event_id = %event.event_id,
                                error = %e,
                                "failed to acknowledge message"
                            );
                        }
                    } else {
                        if let Err(e) = subscription.nack().await {
                            error!(
                                event_id = %event.event_id,
                                error = %e,
                                "failed to return message for redelivery"
                            );
                        }
                        // The same message comes straight back; give the
                        // transient condition a moment to clear.
                        tokio::time::sleep(BROKER_ERROR_BACKOFF).await;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "broker receive error");
                    tokio::time::sleep(BROKER_ERROR_BACKOFF).await;
                }
            }
        }
    }
}
