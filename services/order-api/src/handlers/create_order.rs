use axum::{extract::State, http::StatusCode, Json};
use domain::commands::CreateOrderCommand;
use domain::order::{Order, OrderItem};
use tracing::info;
use validator::Validate;

use crate::error::{bad_request, map_service_error, ApiRejection};
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Handle create order command
pub async fn handle(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Json(cmd): Json<CreateOrderCommand>,
) -> Result<(StatusCode, Json<Order>), ApiRejection> {
    let customer_id = identity.require_customer()?;
    info!(customer_id = %customer_id, "received create order command");

    if let Err(e) = cmd.validate() {
        return Err(bad_request(format!("Validation error: {e}")));
    }

    let items: Vec<OrderItem> = cmd.items.into_iter().map(OrderItem::from).collect();

    let order = state
        .service
        .create_order(
            customer_id,
            items,
            cmd.payment_method_ref,
            cmd.tax_amount,
            cmd.shipping_amount,
        )
        .await
        .map_err(map_service_error)?;

    Ok((StatusCode::CREATED, Json(order)))
}
