use axum::{
    extract::{Query, State},
    Json,
};
use domain::order::Order;
use order_store::Page;
use serde::Deserialize;

use crate::error::{map_service_error, ApiRejection};
use crate::identity::CallerIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<PageParams> for Page {
    fn from(params: PageParams) -> Self {
        Page::clamped(params.limit, params.offset)
    }
}

/// List the calling customer's orders, newest first.
pub async fn handle(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Order>>, ApiRejection> {
    let customer_id = identity.require_customer()?;

    let orders = state
        .service
        .list_by_customer(customer_id, params.into())
        .await
        .map_err(map_service_error)?;

    Ok(Json(orders))
}
