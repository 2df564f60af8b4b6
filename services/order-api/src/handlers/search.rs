use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use domain::order::Order;
use domain::status::OrderStatus;
use order_store::{OrderFilter, Page};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{bad_request, map_service_error, ApiRejection};
use crate::identity::CallerIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    /// Free-text fragment matched against the order id.
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Admin search across orders; filter fields are AND-combined.
pub async fn handle(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Order>>, ApiRejection> {
    identity.require_admin()?;

    let status = match params.status {
        Some(raw) => Some(
            raw.parse::<OrderStatus>()
                .map_err(|e| bad_request(e.to_string()))?,
        ),
        None => None,
    };

    let filter = OrderFilter {
        status,
        customer_id: params.customer_id,
        created_after: params.created_after,
        created_before: params.created_before,
        id_contains: params.q,
    };

    let page = Page::clamped(params.limit, params.offset);

    let orders = state
        .service
        .search(&filter, page)
        .await
        .map_err(map_service_error)?;

    Ok(Json(orders))
}
