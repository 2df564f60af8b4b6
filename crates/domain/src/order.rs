use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::OrderError;
use crate::state_machine::TransitionSource;
use crate::status::OrderStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price: f64,
}

impl OrderItem {
    pub fn new(product_id: Uuid, quantity: u32, unit_price: f64) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// One entry of the append-only audit trail. `from_status` is `None` only for
/// the creation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
    pub source: TransitionSource,
    pub correlation_id: Option<Uuid>,
}

impl StatusHistoryEntry {
    pub fn new(
        from_status: Option<OrderStatus>,
        to_status: OrderStatus,
        source: TransitionSource,
        correlation_id: Option<Uuid>,
    ) -> Self {
        Self {
            from_status,
            to_status,
            occurred_at: Utc::now(),
            source,
            correlation_id,
        }
    }
}

/// The order aggregate. `status` only ever changes through the state machine,
/// and every persisted mutation bumps `version`; a stale `version` at write
/// time means another writer got there first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment_method_ref: String,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub shipping_amount: f64,
    pub total_amount: f64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status_history: Vec<StatusHistoryEntry>,
}

impl Order {
    /// Build a new Pending order, validating line items and computing totals.
    /// The creation itself is recorded as the first history entry.
    pub fn new(
        customer_id: Uuid,
        items: Vec<OrderItem>,
        payment_method_ref: String,
        tax_amount: f64,
        shipping_amount: f64,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity);
            }
            if item.unit_price < 0.0 {
                return Err(OrderError::InvalidPrice);
            }
        }
        if payment_method_ref.trim().is_empty() {
            return Err(OrderError::MissingPaymentMethod);
        }
        if tax_amount < 0.0 || shipping_amount < 0.0 {
            return Err(OrderError::InvalidAmount);
        }

        let subtotal: f64 = items.iter().map(OrderItem::line_total).sum();
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            customer_id,
            items,
            status: OrderStatus::Pending,
            payment_method_ref,
            subtotal,
            tax_amount,
            shipping_amount,
            total_amount: subtotal + tax_amount + shipping_amount,
            version: 1,
            created_at: now,
            updated_at: now,
            status_history: vec![StatusHistoryEntry {
                from_status: None,
                to_status: OrderStatus::Pending,
                occurred_at: now,
                source: TransitionSource::Api,
                correlation_id: None,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<OrderItem> {
        vec![OrderItem::new(Uuid::new_v4(), 2, 10.0)]
    }

    #[test]
    fn test_create_order_success() {
        let customer_id = Uuid::new_v4();
        let order = Order::new(customer_id, items(), "pm_1".to_string(), 0.0, 0.0).unwrap();

        assert_eq!(order.customer_id, customer_id);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, 20.0);
        assert_eq!(order.version, 1);
        assert_eq!(order.status_history.len(), 1);
        assert_eq!(order.status_history[0].from_status, None);
        assert_eq!(order.status_history[0].to_status, OrderStatus::Pending);
    }

    #[test]
    fn test_totals_include_tax_and_shipping() {
        let order = Order::new(Uuid::new_v4(), items(), "pm_1".to_string(), 1.5, 4.0).unwrap();
        assert_eq!(order.subtotal, 20.0);
        assert_eq!(order.total_amount, 25.5);
    }

    #[test]
    fn test_create_order_no_items() {
        let result = Order::new(Uuid::new_v4(), vec![], "pm_1".to_string(), 0.0, 0.0);
        assert_eq!(result.unwrap_err(), OrderError::NoItems);
    }

    #[test]
    fn test_create_order_zero_quantity() {
        let result = Order::new(
            Uuid::new_v4(),
            vec![OrderItem::new(Uuid::new_v4(), 0, 10.0)],
            "pm_1".to_string(),
            0.0,
            0.0,
        );
        assert_eq!(result.unwrap_err(), OrderError::InvalidQuantity);
    }

    #[test]
    fn test_create_order_negative_price() {
        let result = Order::new(
            Uuid::new_v4(),
            vec![OrderItem::new(Uuid::new_v4(), 1, -1.0)],
            "pm_1".to_string(),
            0.0,
            0.0,
        );
        assert_eq!(result.unwrap_err(), OrderError::InvalidPrice);
    }

    #[test]
    fn test_create_order_zero_price_allowed() {
        // Free items are fine, only negative prices are invalid.
        let order = Order::new(
            Uuid::new_v4(),
            vec![OrderItem::new(Uuid::new_v4(), 3, 0.0)],
            "pm_1".to_string(),
            0.0,
            0.0,
        )
        .unwrap();
        assert_eq!(order.total_amount, 0.0);
    }

    #[test]
    fn test_create_order_blank_payment_ref() {
        let result = Order::new(Uuid::new_v4(), items(), "  ".to_string(), 0.0, 0.0);
        assert_eq!(result.unwrap_err(), OrderError::MissingPaymentMethod);
    }
}
