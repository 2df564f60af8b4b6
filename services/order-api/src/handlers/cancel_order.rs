use axum::{
    extract::{Path, State},
    Json,
};
use domain::order::Order;
use tracing::info;
use uuid::Uuid;

use crate::error::{map_service_error, ApiRejection};
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Cancel an order on behalf of its owner or an admin.
pub async fn handle(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    identity: CallerIdentity,
) -> Result<Json<Order>, ApiRejection> {
    info!(order_id = %order_id, "received cancel order command");

    let order = state
        .service
        .cancel_order(order_id, &identity.actor())
        .await
        .map_err(map_service_error)?;

    Ok(Json(order))
}
