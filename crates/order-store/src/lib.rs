pub mod postgres;

pub use postgres::{PostgresConsumedEventStore, PostgresOrderStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use domain::order::{Order, StatusHistoryEntry};
use domain::status::OrderStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    NotFound(Uuid),

    #[error("concurrency conflict for order {id}: version {expected} is stale")]
    ConcurrencyConflict { id: Uuid, expected: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Offset/limit page request. Results are ordered by `created_at` descending.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const MAX_LIMIT: i64 = 100;

    /// Build a page from raw caller input, clamping out-of-range values
    /// instead of handing them to the database.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>) -> Self {
        let default = Self::default();
        Self {
            limit: limit.unwrap_or(default.limit).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(default.offset).max(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Search filter; populated fields are combined with logical AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    /// Free-text match against the order id.
    pub id_contains: Option<String>,
}

/// Durable keyed storage of order aggregates with optimistic concurrency.
///
/// `update_status` is the only mutation path after creation: a single atomic
/// conditional write keyed on `(id, expected_version)`. A stale version yields
/// `ConcurrencyConflict` and the caller re-reads and retries.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: &Order) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Order, StoreError>;

    async fn list_by_customer(&self, customer_id: Uuid, page: Page)
        -> Result<Vec<Order>, StoreError>;

    async fn search(&self, filter: &OrderFilter, page: Page) -> Result<Vec<Order>, StoreError>;

    async fn update_status(
        &self,
        id: Uuid,
        expected_version: i64,
        new_status: OrderStatus,
        entry: StatusHistoryEntry,
    ) -> Result<Order, StoreError>;
}

/// Durable record of broker events that have already been applied, so a
/// redelivery of the same `event_id` becomes a no-op. Backed by an indexed
/// table rather than process memory: redelivery can arrive after a restart.
#[async_trait]
pub trait ConsumedEventStore: Send + Sync {
    async fn is_consumed(&self, event_id: Uuid) -> Result<bool, StoreError>;

    /// Idempotent: recording an already-recorded event id is not an error.
    async fn mark_consumed(&self, event_id: Uuid, order_id: Uuid) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page() {
        let page = Page::default();
        assert_eq!(page.limit, 20);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_clamped_page_bounds_caller_input() {
        let page = Page::clamped(Some(-5), Some(-10));
        assert_eq!(page.limit, 1);
        assert_eq!(page.offset, 0);

        let page = Page::clamped(Some(100_000), Some(40));
        assert_eq!(page.limit, Page::MAX_LIMIT);
        assert_eq!(page.offset, 40);

        let page = Page::clamped(None, None);
        assert_eq!(page.limit, Page::default().limit);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_empty_filter() {
        let filter = OrderFilter::default();
        assert!(filter.status.is_none());
        assert!(filter.customer_id.is_none());
        assert!(filter.id_contains.is_none());
    }
}
