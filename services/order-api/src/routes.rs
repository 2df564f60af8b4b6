use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{
    cancel_order, create_order, get_order, health, list_customer_orders, search, update_status,
};
use crate::state::AppState;

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route(
            "/api/v1/orders",
            post(create_order::handle).get(list_customer_orders::handle),
        )
        .route("/api/v1/orders/search", get(search::handle))
        .route("/api/v1/orders/:id", get(get_order::handle))
        .route("/api/v1/orders/:id/cancel", put(cancel_order::handle))
        .route("/api/v1/orders/:id/status", put(update_status::handle))
        .with_state(state)
}
