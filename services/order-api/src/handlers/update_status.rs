use axum::{
    extract::{Path, State},
    Json,
};
use domain::commands::UpdateOrderStatusCommand;
use domain::order::Order;
use domain::state_machine::TransitionSource;
use domain::status::OrderStatus;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{bad_request, map_service_error, ApiRejection};
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Admin status update. Runs through the same state machine as everything
/// else with source `api`, so the transition table still applies.
pub async fn handle(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    identity: CallerIdentity,
    Json(cmd): Json<UpdateOrderStatusCommand>,
) -> Result<Json<Order>, ApiRejection> {
    identity.require_admin()?;

    if let Err(e) = cmd.validate() {
        return Err(bad_request(format!("Validation error: {e}")));
    }

    let new_status: OrderStatus = cmd
        .status
        .parse()
        .map_err(|e: domain::OrderError| bad_request(e.to_string()))?;

    info!(order_id = %order_id, status = %new_status, "received status update command");

    let order = state
        .service
        .update_order_status(order_id, new_status, TransitionSource::Api, None)
        .await
        .map_err(map_service_error)?;

    Ok(Json(order))
}
