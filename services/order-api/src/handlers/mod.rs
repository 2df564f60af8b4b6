pub mod cancel_order;
pub mod create_order;
pub mod get_order;
pub mod health;
pub mod list_customer_orders;
pub mod search;
pub mod update_status;
