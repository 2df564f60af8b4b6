use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("order must have at least one item")]
    NoItems,

    #[error("item quantity must be positive")]
    InvalidQuantity,

    #[error("item unit price cannot be negative")]
    InvalidPrice,

    #[error("amount cannot be negative")]
    InvalidAmount,

    #[error("payment method reference cannot be empty")]
    MissingPaymentMethod,

    #[error("unknown order status '{0}'")]
    UnknownStatus(String),
}
