pub mod commands;
pub mod errors;
pub mod order;
pub mod state_machine;
pub mod status;

pub use errors::OrderError;
pub use order::{Order, OrderItem, StatusHistoryEntry};
pub use state_machine::{TransitionRejection, TransitionSource};
pub use status::OrderStatus;
