use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::order::OrderItem;

/// Command to create a new order. The caller identity (customer id, roles)
/// arrives separately from the trusted transport boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderCommand {
    #[validate(length(min = 1, message = "Order must have at least one item"), nested)]
    pub items: Vec<CreateOrderItem>,

    #[validate(length(min = 1, message = "Payment method reference cannot be empty"))]
    pub payment_method_ref: String,

    #[validate(range(min = 0.0, message = "Tax amount cannot be negative"))]
    #[serde(default)]
    pub tax_amount: f64,

    #[validate(range(min = 0.0, message = "Shipping amount cannot be negative"))]
    #[serde(default)]
    pub shipping_amount: f64,
}

/// Order item in the create order command
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderItem {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,

    #[validate(range(min = 0.0, message = "Unit price cannot be negative"))]
    pub unit_price: f64,
}

impl From<CreateOrderItem> for OrderItem {
    fn from(item: CreateOrderItem) -> Self {
        OrderItem::new(item.product_id, item.quantity, item.unit_price)
    }
}

/// Command for the admin status-update endpoint. The target status is parsed
/// and validated against the state machine by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateOrderStatusCommand {
    #[validate(length(min = 1, message = "Status cannot be empty"))]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_command() -> CreateOrderCommand {
        CreateOrderCommand {
            items: vec![CreateOrderItem {
                product_id: Uuid::new_v4(),
                quantity: 2,
                unit_price: 10.50,
            }],
            payment_method_ref: "pm_1".to_string(),
            tax_amount: 0.0,
            shipping_amount: 0.0,
        }
    }

    #[test]
    fn test_create_order_command_validation() {
        assert!(valid_command().validate().is_ok());
    }

    #[test]
    fn test_create_order_command_empty_items_fails() {
        let mut cmd = valid_command();
        cmd.items = vec![];
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_create_order_item_zero_quantity_fails() {
        let mut cmd = valid_command();
        cmd.items[0].quantity = 0;
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_create_order_negative_tax_fails() {
        let mut cmd = valid_command();
        cmd.tax_amount = -1.0;
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_create_order_empty_payment_ref_fails() {
        let mut cmd = valid_command();
        cmd.payment_method_ref = String::new();
        assert!(cmd.validate().is_err());
    }
}
